//! Nearest-neighbor ranking.

use glam::Vec3;

use super::node::NodeId;

/// Rank the candidates within `max_dist` of `query` by distance.
///
/// `query` itself is skipped, as is anything at `max_dist` or further.
/// Equal distances keep their order in `candidates`.
pub fn nearest_nodes(
    query: (NodeId, Vec3),
    candidates: &[(NodeId, Vec3)],
    max_dist: f32,
) -> Vec<NodeId> {
    let (query_id, origin) = query;
    let mut ranked: Vec<(f32, NodeId)> = candidates
        .iter()
        .filter(|&&(id, _)| id != query_id)
        .map(|&(id, position)| (origin.distance(position), id))
        .filter(|&(distance, _)| distance < max_dist)
        .collect();

    // Stable sort preserves input order among ties.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Vec<(NodeId, Vec3)> {
        vec![
            (NodeId(0), Vec3::ZERO),
            (NodeId(1), Vec3::new(2.0, 0.0, 0.0)),
            (NodeId(2), Vec3::new(0.0, 1.0, 0.0)),
            (NodeId(3), Vec3::new(0.0, 0.0, 3.0)),
            (NodeId(4), Vec3::new(0.0, 0.0, -2.0)),
            (NodeId(5), Vec3::new(10.0, 0.0, 0.0)),
        ]
    }

    #[test]
    fn test_sorted_ascending() {
        let nodes = field();
        let ranked = nearest_nodes(nodes[0], &nodes, 3.0);

        // Node 1 and 4 tie at 2.0 and keep input order; 3 sits exactly at the limit.
        assert_eq!(ranked, vec![NodeId(2), NodeId(1), NodeId(4)]);
    }

    #[test]
    fn test_excludes_self() {
        let nodes = field();
        let ranked = nearest_nodes(nodes[0], &nodes, 100.0);
        assert!(!ranked.contains(&NodeId(0)));
        assert_eq!(ranked.len(), nodes.len() - 1);
    }

    #[test]
    fn test_non_decreasing_distances() {
        let nodes = field();
        let origin = nodes[2].1;
        let ranked = nearest_nodes(nodes[2], &nodes, 100.0);

        let distances: Vec<f32> = ranked
            .iter()
            .map(|id| origin.distance(nodes[id.raw() as usize].1))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_tie_order_follows_input() {
        let mut nodes = field();
        nodes.swap(1, 4);
        let ranked = nearest_nodes((NodeId(0), Vec3::ZERO), &nodes, 3.0);
        assert_eq!(ranked, vec![NodeId(2), NodeId(4), NodeId(1)]);
    }

    #[test]
    fn test_empty_when_isolated() {
        let nodes = field();
        assert!(nearest_nodes(nodes[5], &nodes, 3.0).is_empty());
        assert!(nearest_nodes(nodes[0], &[], 3.0).is_empty());
    }
}
