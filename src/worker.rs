//! A worker writes its own index into its own slot, then reports the write.

use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam::channel::Sender;
use tracing::debug;

use crate::container::Slot;
use crate::error::FanOutError;
use crate::gate::StartGate;
use crate::report::Report;

/// Lifecycle of a [`WorkerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Completed,
    /// The thread panicked before signalling completion.
    Panicked,
}

/// Sent to the coordinator once a worker has written and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub index: usize,
    pub value: i64,
}

#[derive(Debug)]
pub struct Worker<'a> {
    slot: Slot<'a>,
}

impl<'a> Worker<'a> {
    pub fn new(slot: Slot<'a>) -> Self {
        Self { slot }
    }

    pub fn index(&self) -> usize {
        self.slot.index()
    }

    /// Writes the worker's index into its slot, reads it back, and reports it.
    pub fn run<R: Report + ?Sized>(mut self, report: &R) -> Completion {
        let index = self.slot.index();
        self.slot.write(index as i64);

        // Nobody else can reach this slot, so the read sees our write.
        let value = self.slot.read();
        report.confirm(index, value);
        debug!(index, value, "slot written");

        Completion { index, value }
    }
}

/// Coordinator-side view of one spawned worker thread.
#[derive(Debug)]
pub struct WorkerHandle<'scope> {
    index: usize,
    name: String,
    state: WorkerState,
    thread: ScopedJoinHandle<'scope, ()>,
}

impl<'scope> WorkerHandle<'scope> {
    /// Spawns a named thread that stays `Created` until the gate opens.
    pub(crate) fn spawn<'env, R>(
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        worker: Worker<'scope>,
        gate: &'scope StartGate,
        report: &'scope R,
        done: Sender<Completion>,
    ) -> io::Result<Self>
    where
        R: Report + ?Sized,
    {
        let index = worker.index();
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(scope, move || {
                if !gate.wait() {
                    debug!(index, "start abandoned");
                    return;
                }
                let completion = worker.run(report);
                // The coordinator stops listening once its wait is interrupted.
                let _ = done.send(completion);
            })?;

        debug!(index, thread = %name, "worker spawned");
        Ok(Self {
            index,
            name,
            state: WorkerState::Created,
            thread,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub(crate) fn mark_running(&mut self) {
        if self.state == WorkerState::Created {
            self.state = WorkerState::Running;
        }
    }

    pub(crate) fn mark_completed(&mut self) {
        self.state = WorkerState::Completed;
    }

    /// Joins the thread. A panic becomes [`FanOutError::WorkerPanicked`].
    ///
    /// A worker whose completion was never observed (the wait was interrupted)
    /// has nonetheless finished once joined.
    pub(crate) fn join(self) -> (WorkerState, Option<FanOutError>) {
        let index = self.index;
        match self.thread.join() {
            Ok(()) if self.state == WorkerState::Created => (WorkerState::Created, None),
            Ok(()) => (WorkerState::Completed, None),
            Err(payload) => (
                WorkerState::Panicked,
                Some(FanOutError::panicked(index, payload.as_ref())),
            ),
        }
    }
}
