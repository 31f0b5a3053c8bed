//! Per-call tracking of the nodes currently open on the recursion stack.

use crate::value::NodeId;
use std::collections::HashSet;

/// The set of array/object nodes whose walk has started but not finished.
///
/// A node is a cycle point when it is entered while still open. Leaving a node
/// removes it again, so two siblings that share a node are both walked in full:
/// shared is not circular.
///
/// A guard belongs to one top-level call and is dropped with it.
///
/// # Examples
///
/// ```rust
/// use serde_clip::VisitGuard;
///
/// let mut guard = VisitGuard::new();
/// assert!(guard.enter(7));
/// assert!(!guard.enter(7));
/// guard.leave(7);
/// assert!(guard.enter(7));
/// ```
#[derive(Debug, Default)]
pub struct VisitGuard {
    open: HashSet<NodeId>,
}

impl VisitGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as open. Returns `false` if it was already open.
    pub fn enter(&mut self, id: NodeId) -> bool {
        self.open.insert(id)
    }

    pub fn leave(&mut self, id: NodeId) {
        self.open.remove(&id);
    }

    /// Number of nodes currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_entries_tracked_independently() {
        let mut guard = VisitGuard::new();
        assert!(guard.enter(1));
        assert!(guard.enter(2));
        assert_eq!(guard.depth(), 2);
        guard.leave(2);
        assert!(!guard.enter(1));
        assert!(guard.enter(2));
    }
}
