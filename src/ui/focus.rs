use crate::layout::NodeId;

/// One focusable thing: a part of the widget at `node`. Plain tables have a
/// single part; filter tables have one per input plus the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusTarget {
    pub node: NodeId,
    pub part: usize,
}

/// Circular cursor over the focus targets, in pre-order of the widget tree.
/// Exactly one target holds focus unless there are none.
#[derive(Debug, Clone, Default)]
pub struct FocusManager {
    targets: Vec<FocusTarget>,
    current: usize,
}

impl FocusManager {
    pub fn new(targets: Vec<FocusTarget>) -> Self {
        Self {
            targets,
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn current(&self) -> Option<FocusTarget> {
        self.targets.get(self.current).copied()
    }

    /// Returns the (old, new) pair so callers can repaint both.
    pub fn next(&mut self) -> Option<(FocusTarget, FocusTarget)> {
        self.rotate(1)
    }

    pub fn prev(&mut self) -> Option<(FocusTarget, FocusTarget)> {
        self.rotate(self.targets.len().saturating_sub(1))
    }

    fn rotate(&mut self, step: usize) -> Option<(FocusTarget, FocusTarget)> {
        let old = self.current()?;
        self.current = (self.current + step) % self.targets.len();
        Some((old, self.targets[self.current]))
    }

    /// The focused part of `node`, if `node` holds focus.
    pub fn focused_part(&self, node: NodeId) -> Option<usize> {
        self.current()
            .filter(|target| target.node == node)
            .map(|target| target.part)
    }
}
