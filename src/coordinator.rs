//! Fan-out / fan-in over a [`SharedContainer`].
//!
//! A run goes through four steps:
//!
//! 1. **Construct** - allocate one zeroed cell per worker.
//! 2. **Spawn** - one named thread per cell, each parked on the start gate.
//! 3. **Start all** - open the gate; workers run in no particular order.
//! 4. **Await all** - block until every worker has signalled completion.
//!
//! Threads are scoped, so every worker is joined before [`Coordinator::run`]
//! returns, including when the wait is interrupted.

use std::io;
use std::thread::{self, Scope};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::config::FanOutConfig;
use crate::container::{SharedContainer, Slot};
use crate::error::{FanOutError, Result};
use crate::gate::StartGate;
use crate::interrupt::Interrupt;
use crate::report::Report;
use crate::worker::{Completion, Worker, WorkerHandle, WorkerState};

/// What a successful run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Container contents after every worker finished.
    pub values: Vec<i64>,
    /// Worker indices in the order their completion reached the coordinator.
    pub completion_order: Vec<usize>,
    /// Final state of each handle, by index.
    pub states: Vec<WorkerState>,
}

impl RunSummary {
    pub fn all_completed(&self) -> bool {
        self.states.iter().all(|state| *state == WorkerState::Completed)
    }
}

#[derive(Debug)]
pub struct Coordinator {
    config: FanOutConfig,
    container: SharedContainer,
    /// Slot whose thread the OS is made to refuse. Only set by tests.
    refuse_spawn_at: Option<usize>,
}

impl Default for Coordinator {
    fn default() -> Self {
        let config = FanOutConfig::default();
        let container = SharedContainer::new(config.workers);
        Self {
            config,
            container,
            refuse_spawn_at: None,
        }
    }
}

impl Coordinator {
    pub fn new(config: FanOutConfig) -> Result<Self> {
        config.validate()?;
        let container = SharedContainer::new(config.workers);
        Ok(Self {
            config,
            container,
            refuse_spawn_at: None,
        })
    }

    #[cfg(test)]
    pub(crate) fn refusing_spawn_at(mut self, index: usize) -> Self {
        self.refuse_spawn_at = Some(index);
        self
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        Self::new(FanOutConfig::with_workers(workers))
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    pub fn container(&self) -> &SharedContainer {
        &self.container
    }

    pub fn into_values(self) -> Vec<i64> {
        self.container.into_vec()
    }

    /// Spawns, starts and awaits one worker per container slot.
    ///
    /// Every cell is zeroed first, so each run starts from a freshly
    /// allocated state.
    pub fn run<R>(&mut self, report: &R, interrupt: &Interrupt) -> Result<RunSummary>
    where
        R: Report + ?Sized,
    {
        self.container.reset();
        let expected = self.container.len();
        let config = &self.config;
        let refuse_spawn_at = self.refuse_spawn_at;
        let slots: Vec<Slot<'_>> = self.container.slots_mut().collect();
        let gate = StartGate::new();
        let (done_tx, done_rx) = channel::unbounded();

        info!(workers = expected, "starting fan-out");

        let (completion_order, states) = thread::scope(|scope| -> Result<_> {
            let mut handles =
                spawn_all(scope, config, slots, &gate, report, done_tx, refuse_spawn_at)?;
            start_all(&gate, &mut handles);

            let awaited = await_all(&mut handles, &done_rx, interrupt);
            let (states, panicked) = join_all(handles);

            let order = match awaited {
                Ok(order) => order,
                // Joining let the remaining workers finish; report what actually completed.
                Err(FanOutError::WaitInterrupted { expected, .. }) => {
                    return Err(FanOutError::WaitInterrupted {
                        completed: finished(&states),
                        expected,
                    });
                }
                Err(err) => return Err(err),
            };
            match panicked {
                Some(err) => Err(err),
                None => Ok((order, states)),
            }
        })?;

        let summary = RunSummary {
            values: self.container.as_slice().to_vec(),
            completion_order,
            states,
        };
        info!(values = ?summary.values, "all workers completed");
        Ok(summary)
    }
}

fn spawn_all<'scope, 'env, R>(
    scope: &'scope Scope<'scope, 'env>,
    config: &FanOutConfig,
    slots: Vec<Slot<'scope>>,
    gate: &'scope StartGate,
    report: &'scope R,
    done: Sender<Completion>,
    refuse_spawn_at: Option<usize>,
) -> Result<Vec<WorkerHandle<'scope>>>
where
    R: Report + ?Sized,
{
    let mut handles = Vec::with_capacity(slots.len());

    for slot in slots {
        let index = slot.index();
        let name = config.thread_name(index);
        let spawned = if refuse_spawn_at == Some(index) {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "thread spawn refused"))
        } else {
            WorkerHandle::spawn(scope, name, Worker::new(slot), gate, report, done.clone())
        };
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                warn!(index, error = %source, "spawn failed, abandoning start");
                gate.abandon();
                join_all(handles);
                return Err(FanOutError::Spawn { index, source });
            }
        }
    }

    Ok(handles)
}

fn start_all(gate: &StartGate, handles: &mut [WorkerHandle<'_>]) {
    gate.open();
    for handle in handles.iter_mut() {
        handle.mark_running();
    }
    debug!(workers = handles.len(), "all workers started");
}

enum Wake {
    Completed(Completion),
    Disconnected,
    Interrupted,
}

/// Blocks until every handle has reported completion or the wait is interrupted.
///
/// A pending interruption is checked before each blocking receive so it is
/// never starved by completions that are already queued.
fn await_all(
    handles: &mut [WorkerHandle<'_>],
    done: &Receiver<Completion>,
    interrupt: &Interrupt,
) -> Result<Vec<usize>> {
    let expected = handles.len();
    let mut order = Vec::with_capacity(expected);

    while order.len() < expected {
        if interrupt.take() {
            warn!(observed = order.len(), expected, "wait interrupted");
            return Err(FanOutError::interrupted(&order, expected));
        }

        let wake = crossbeam::select! {
            recv(done) -> msg => msg.map_or(Wake::Disconnected, Wake::Completed),
            recv(interrupt.receiver()) -> _ => Wake::Interrupted,
        };

        match wake {
            Wake::Completed(completion) => {
                handles[completion.index].mark_completed();
                order.push(completion.index);
                debug!(index = completion.index, "worker completed");
            }
            // Every sender is gone: the missing workers panicked.
            Wake::Disconnected => break,
            Wake::Interrupted => {
                warn!(observed = order.len(), expected, "wait interrupted");
                return Err(FanOutError::interrupted(&order, expected));
            }
        }
    }

    Ok(order)
}

fn finished(states: &[WorkerState]) -> Vec<usize> {
    states
        .iter()
        .enumerate()
        .filter(|(_, state)| **state == WorkerState::Completed)
        .map(|(index, _)| index)
        .collect()
}

/// Joins every handle, returning final states and the first panic seen.
fn join_all(handles: Vec<WorkerHandle<'_>>) -> (Vec<WorkerState>, Option<FanOutError>) {
    let mut states = Vec::with_capacity(handles.len());
    let mut first_panic = None;

    for handle in handles {
        let (state, panicked) = handle.join();
        states.push(state);
        if first_panic.is_none() {
            first_panic = panicked;
        }
    }

    (states, first_panic)
}
