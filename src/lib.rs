//! shared-slots - fan out a fixed number of worker threads over disjoint
//! slots of one array, then fan back in.
//!
//! - [`config`] - worker count, thread naming, logging settings
//! - [`container`] - the zero-initialised array and its per-slot borrows
//! - [`worker`] - the per-slot write and its report
//! - [`coordinator`] - spawn, start, await
//! - [`interrupt`] - external interruption of the wait
//! - [`report`] - where confirmations go
//!
//! # Example
//!
//! ```
//! use shared_slots::prelude::*;
//!
//! let mut coordinator = Coordinator::default();
//! let report = MemoryReport::new();
//! let summary = coordinator.run(&report, &Interrupt::new()).unwrap();
//!
//! assert_eq!(summary.values, vec![0, 1, 2]);
//! assert_eq!(report.len(), 3);
//! ```

pub mod config;
pub mod container;
pub mod coordinator;
pub mod error;
mod gate;
pub mod interrupt;
pub mod report;
pub mod worker;

pub mod prelude {
    pub use crate::config::{FanOutConfig, LogFormat, LoggingConfig};
    pub use crate::container::{SharedContainer, Slot};
    pub use crate::coordinator::{Coordinator, RunSummary};
    pub use crate::error::{FanOutError, Result};
    pub use crate::interrupt::Interrupt;
    pub use crate::report::{confirmation_line, ConsoleReport, MemoryReport, Report};
    pub use crate::worker::{Completion, Worker, WorkerState};
}
