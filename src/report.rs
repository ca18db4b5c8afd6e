//! Where workers report their writes.

use std::sync::{Mutex, PoisonError};

/// Formats the confirmation a worker emits after writing its slot.
pub fn confirmation_line(index: usize, value: i64) -> String {
    format!("myValue[{index}] = {value}")
}

/// Output sink shared by all workers of a run.
pub trait Report: Sync {
    fn confirm(&self, index: usize, value: i64);
}

/// Prints each confirmation as one line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReport;

impl Report for ConsoleReport {
    fn confirm(&self, index: usize, value: i64) {
        // println! holds the stdout lock for the whole line.
        println!("{}", confirmation_line(index, value));
    }
}

/// Collects confirmations in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReport {
    lines: Mutex<Vec<String>>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Report for MemoryReport {
    fn confirm(&self, index: usize, value: i64) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(confirmation_line(index, value));
    }
}
