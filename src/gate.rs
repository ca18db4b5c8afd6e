//! Start gate holding spawned workers in the `Created` state.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Abandoned,
}

/// A one-shot latch. Workers block in [`StartGate::wait`] until the
/// coordinator either opens it (run) or abandons it (spawning failed).
#[derive(Debug)]
pub(crate) struct StartGate {
    state: Mutex<GateState>,
    condvar: Condvar,
}

impl StartGate {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Closed),
            condvar: Condvar::new(),
        }
    }

    /// Blocks while the gate is closed. Returns `true` if the caller may run.
    pub(crate) fn wait(&self) -> bool {
        let mut state = self.lock();
        while *state == GateState::Closed {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *state == GateState::Open
    }

    pub(crate) fn open(&self) {
        self.settle(GateState::Open);
    }

    pub(crate) fn abandon(&self) {
        self.settle(GateState::Abandoned);
    }

    // First settlement wins.
    fn settle(&self, next: GateState) {
        let mut state = self.lock();
        if *state == GateState::Closed {
            *state = next;
        }
        self.condvar.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // Nothing panics while holding this lock, but a poisoned gate is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_open_releases_all_waiters() {
        let gate = StartGate::new();
        let admitted = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    if gate.wait() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
            thread::sleep(Duration::from_millis(20));
            assert_eq!(admitted.load(Ordering::SeqCst), 0);
            gate.open();
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_abandon_turns_waiters_away() {
        let gate = StartGate::new();

        thread::scope(|s| {
            let waiter = s.spawn(|| gate.wait());
            gate.abandon();
            assert!(!waiter.join().unwrap());
        });
    }

    #[test]
    fn test_first_settlement_wins() {
        let gate = StartGate::new();
        gate.open();
        gate.abandon();
        assert!(gate.wait());

        let gate = StartGate::new();
        gate.abandon();
        gate.open();
        assert!(!gate.wait());
    }
}
