//! Typed fold-state notifications.
//!
//! Front ends publish a [`FoldEvent`] every time a block's fold state changes, whether from a
//! click, an uncollapse affordance or a fold-all/unfold-all command. Hosts subscribe to keep
//! their own UI (icons, persisted state) in sync.

use crate::folding::{FoldAction, FoldState};

/// A block's fold state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldEvent {
    /// Char offset of the block's opening fence.
    pub block_start: usize,
    /// Opening fence line.
    pub start_line: usize,
    /// State before the change.
    pub old_state: FoldState,
    /// State after the change.
    pub new_state: FoldState,
    /// What caused the change.
    pub cause: FoldAction,
}

/// Fold event callback type.
pub type FoldEventCallback = Box<dyn FnMut(&FoldEvent) + Send>;

/// Subscriber list for [`FoldEvent`]s.
#[derive(Default)]
pub struct FoldEventBus {
    callbacks: Vec<FoldEventCallback>,
    emitted: u64,
}

impl FoldEventBus {
    /// Create a bus without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to fold events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&FoldEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Number of events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Notify every subscriber. Events that do not change the state are dropped.
    pub fn emit(&mut self, event: &FoldEvent) {
        if event.old_state == event.new_state {
            return;
        }
        self.emitted += 1;
        tracing::trace!(
            start_line = event.start_line,
            old = ?event.old_state,
            new = ?event.new_state,
            cause = ?event.cause,
            "fold state changed"
        );
        for callback in &mut self.callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for FoldEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoldEventBus")
            .field("subscribers", &self.callbacks.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn event(old_state: FoldState, new_state: FoldState) -> FoldEvent {
        FoldEvent {
            block_start: 0,
            start_line: 0,
            old_state,
            new_state,
            cause: FoldAction::Click,
        }
    }

    #[test]
    fn test_subscribers_receive_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = FoldEventBus::new();
        let sink = Arc::clone(&seen);
        bus.subscribe(move |e| sink.lock().unwrap().push(e.new_state));

        bus.emit(&event(FoldState::Expanded, FoldState::Collapsed));
        bus.emit(&event(FoldState::Collapsed, FoldState::Collapsed));
        bus.emit(&event(FoldState::Collapsed, FoldState::Expanded));

        assert_eq!(*seen.lock().unwrap(), vec![FoldState::Collapsed, FoldState::Expanded]);
        assert_eq!(bus.emitted(), 2);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
