//! Command queue implementation of [`RenderSink`].

use glam::Vec3;
use serde::Serialize;

use super::{LineHandle, RenderSink};
use crate::graph::{Color, NodeId};

/// A single instruction for the JS renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderCommand {
    CreateLine {
        line: u32,
        from: Vec3,
        to: Vec3,
        color: u32,
    },
    UpdateLine {
        line: u32,
        from: Vec3,
        to: Vec3,
    },
    ReleaseLine {
        line: u32,
    },
    Label {
        node: u32,
        text: String,
    },
    Present,
}

/// Records render commands until the host drains them.
#[derive(Debug, Default)]
pub struct RenderQueue {
    commands: Vec<RenderCommand>,
    next_line: u32,
    live_lines: usize,
}

impl RenderQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every command recorded since the last drain.
    pub fn drain(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Lines created and not yet released.
    pub fn live_lines(&self) -> usize {
        self.live_lines
    }
}

impl RenderSink for RenderQueue {
    fn create_line(&mut self, from: Vec3, to: Vec3, color: Color) -> LineHandle {
        let line = self.next_line;
        self.next_line += 1;
        self.live_lines += 1;
        self.commands.push(RenderCommand::CreateLine {
            line,
            from,
            to,
            color: color.raw(),
        });
        LineHandle::new(line)
    }

    fn update_line(&mut self, line: &LineHandle, from: Vec3, to: Vec3) {
        self.commands.push(RenderCommand::UpdateLine {
            line: line.raw(),
            from,
            to,
        });
    }

    fn release_line(&mut self, line: LineHandle) {
        self.live_lines -= 1;
        self.commands
            .push(RenderCommand::ReleaseLine { line: line.raw() });
    }

    fn label_changed(&mut self, node: NodeId, label: &str) {
        self.commands.push(RenderCommand::Label {
            node: node.raw(),
            text: label.to_owned(),
        });
    }

    fn present(&mut self) {
        self.commands.push(RenderCommand::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lifecycle() {
        let mut queue = RenderQueue::new();
        let a = queue.create_line(Vec3::ZERO, Vec3::X, Color::GREY);
        let b = queue.create_line(Vec3::ZERO, Vec3::Y, Color::GREY);
        assert_ne!(a, b);
        assert_eq!(queue.live_lines(), 2);

        queue.update_line(&a, Vec3::ZERO, Vec3::Z);
        queue.release_line(a);
        assert_eq!(queue.live_lines(), 1);

        let commands = queue.drain();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[3], RenderCommand::ReleaseLine { line: 0 });
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_label_and_present() {
        let mut queue = RenderQueue::new();
        queue.label_changed(NodeId(3), "1.000000");
        queue.present();

        assert_eq!(
            queue.drain(),
            vec![
                RenderCommand::Label {
                    node: 3,
                    text: "1.000000".to_string()
                },
                RenderCommand::Present,
            ]
        );
    }
}
