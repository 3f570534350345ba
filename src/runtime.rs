//! Shared pattern selection.
//!
//! The scheduler publishes which pattern should run and at what speed; the
//! runner reads it. The pair lives behind one lock so a reader never sees a
//! pattern from one decision with the speed of another. Every effective
//! change bumps a generation counter, which is what the runner compares to
//! detect switches.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use embassy_time::Duration;
use tracing::trace;

use crate::catalog::PatternKey;
use crate::pattern::Speed;

/// Pattern and speed chosen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub key: PatternKey,
    pub speed: Speed,
}

/// Consistent copy of the runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    /// `None` while idle.
    pub selection: Option<Selection>,
    /// Incremented on every effective change.
    pub generation: u64,
    /// Set once at shutdown, never cleared.
    pub stopped: bool,
}

#[derive(Debug, Default)]
struct RuntimeState {
    selection: Option<Selection>,
    generation: u64,
    stopped: bool,
}

impl RuntimeState {
    fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            selection: self.selection,
            generation: self.generation,
            stopped: self.stopped,
        }
    }
}

/// Single point of synchronisation between scheduler and runner.
#[derive(Debug, Default)]
pub struct PatternRuntime {
    state: Mutex<RuntimeState>,
    changed: Condvar,
}

impl PatternRuntime {
    /// Empty runtime: nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `key` at `speed` the active pattern.
    ///
    /// Publishing the selection that is already active is not a change.
    /// Returns whether anything changed.
    pub fn publish(&self, key: PatternKey, speed: Speed) -> bool {
        let selection = Selection { key, speed };
        let mut state = self.lock();
        if state.stopped || state.selection == Some(selection) {
            return false;
        }
        state.selection = Some(selection);
        state.generation += 1;
        trace!(generation = state.generation, ?selection, "selection published");
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Turn the lights off. Returns whether a pattern was active.
    pub fn clear(&self) -> bool {
        let mut state = self.lock();
        if state.selection.is_none() {
            return false;
        }
        state.selection = None;
        state.generation += 1;
        trace!(generation = state.generation, "selection cleared");
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Clear the selection for good and wake every waiter.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if !state.stopped {
            state.selection = None;
            state.stopped = true;
            state.generation += 1;
        }
        drop(state);
        self.changed.notify_all();
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        self.lock().snapshot()
    }

    /// Block until the generation moves past `seen`, the runtime stops or
    /// `timeout` elapses, whichever comes first.
    ///
    /// Without a timeout this waits for a change indefinitely.
    pub fn wait_for_change(&self, seen: u64, timeout: Option<Duration>) -> RuntimeSnapshot {
        let state = self.lock();
        let unchanged = |state: &mut RuntimeState| state.generation == seen && !state.stopped;
        let state = match timeout {
            Some(timeout) => {
                self.changed
                    .wait_timeout_while(state, timeout.into(), unchanged)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .changed
                .wait_while(state, unchanged)
                .unwrap_or_else(PoisonError::into_inner),
        };
        state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::catalog::PatternCatalog;

    fn key(name: &str) -> PatternKey {
        PatternCatalog::builtin().by_name(name).unwrap()
    }

    #[test]
    fn test_identical_publish_is_not_a_change() {
        let runtime = PatternRuntime::new();
        let speed = Speed::new(5).unwrap();
        assert!(runtime.publish(key("dot_lr"), speed));
        let generation = runtime.snapshot().generation;
        assert!(!runtime.publish(key("dot_lr"), speed));
        assert_eq!(runtime.snapshot().generation, generation);
    }

    #[test]
    fn test_clear_when_idle_is_not_a_change() {
        let runtime = PatternRuntime::new();
        assert!(!runtime.clear());
        assert_eq!(runtime.snapshot().generation, 0);
    }

    #[test]
    fn test_waiter_wakes_on_publish() {
        let runtime = Arc::new(PatternRuntime::new());
        let waiter = {
            let runtime = Arc::clone(&runtime);
            thread::spawn(move || runtime.wait_for_change(0, None))
        };
        runtime.publish(key("spotlight"), Speed::new(2).unwrap());
        let snapshot = waiter.join().unwrap();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.selection.unwrap().speed.get(), 2);
    }

    #[test]
    fn test_wait_times_out_without_change() {
        let runtime = PatternRuntime::new();
        let snapshot = runtime.wait_for_change(0, Some(Duration::from_millis(10)));
        assert_eq!(snapshot.generation, 0);
        assert!(snapshot.selection.is_none());
    }

    #[test]
    fn test_shutdown_rejects_further_publishing() {
        let runtime = PatternRuntime::new();
        runtime.publish(key("dot_rl"), Speed::new(1).unwrap());
        runtime.shutdown();
        assert!(!runtime.publish(key("dot_rl"), Speed::new(3).unwrap()));
        let snapshot = runtime.snapshot();
        assert!(snapshot.stopped);
        assert!(snapshot.selection.is_none());
    }
}
