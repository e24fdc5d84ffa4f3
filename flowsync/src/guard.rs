//! Echo suppression for runtime-initiated widget writes.
//!
//! While the update-task pass writes a widget, the guard records which widget
//! is being written. A value-changed event arriving for that widget in the
//! meantime is the toolkit echoing the write, not the user, and must not flow
//! back into flow state.

use crate::toolkit::WidgetId;

/// The write currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWrite {
    pub widget: WidgetId,
    /// Position of the task in its queue.
    pub task: usize,
}

/// Single-slot guard. One write at a time; writes do not nest.
#[derive(Debug, Default)]
pub struct FeedbackGuard {
    current: Option<ActiveWrite>,
}

impl FeedbackGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, widget: WidgetId, task: usize) {
        debug_assert!(self.current.is_none(), "feedback guard entered twice");
        self.current = Some(ActiveWrite { widget, task });
    }

    pub fn exit(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<ActiveWrite> {
        self.current
    }

    /// Whether an event on `widget` would be an echo of the write in progress.
    pub fn is_writing(&self, widget: WidgetId) -> bool {
        self.current.is_some_and(|write| write.widget == widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_matches_only_the_written_widget() {
        let a = WidgetId::new(1, 0);
        let b = WidgetId::new(2, 0);
        let mut guard = FeedbackGuard::new();
        assert!(!guard.is_writing(a));

        guard.enter(a, 0);
        assert!(guard.is_writing(a));
        assert!(!guard.is_writing(b));
        // Same slot, later generation: a different widget.
        assert!(!guard.is_writing(WidgetId::new(1, 1)));

        guard.exit();
        assert!(!guard.is_writing(a));
        assert_eq!(guard.current(), None);
    }
}
