//! External interruption of the coordinator's wait.

use crossbeam::channel::{self, Receiver, Sender};

/// A cloneable handle that delivers an interruption to a waiting coordinator.
///
/// Each [`trigger`](Interrupt::trigger) interrupts at most one wait.
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    pub fn trigger(&self) {
        // The handle owns a receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(());
    }

    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Consumes a pending interruption, if any.
    pub(crate) fn take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
