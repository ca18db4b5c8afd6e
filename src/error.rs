//! Error types for the fan-out run.
//!
//! Interruption of the wait is the one failure the program expects. It is
//! returned to the caller as [`FanOutError::WaitInterrupted`] rather than
//! swallowed, so callers decide whether it changes the exit status.

use std::any::Any;
use std::io;

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, FanOutError>;

#[derive(Error, Debug)]
pub enum FanOutError {
    #[error("wait interrupted: {} of {} workers completed", .completed.len(), .expected)]
    WaitInterrupted {
        /// Workers that had finished by the time the interrupted run returned.
        completed: Vec<usize>,
        expected: usize,
    },

    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker {index} panicked: {message}")]
    WorkerPanicked { index: usize, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FanOutError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::WaitInterrupted { .. })
    }

    pub(crate) fn interrupted(completed: &[usize], expected: usize) -> Self {
        Self::WaitInterrupted {
            completed: completed.to_vec(),
            expected,
        }
    }

    pub(crate) fn panicked(index: usize, payload: &(dyn Any + Send)) -> Self {
        Self::WorkerPanicked {
            index,
            message: panic_message(payload),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_interrupted_display() {
        let error = FanOutError::WaitInterrupted {
            completed: vec![2],
            expected: 3,
        };
        assert_eq!(error.to_string(), "wait interrupted: 1 of 3 workers completed");
        assert!(error.is_interrupted());
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        let error = FanOutError::Spawn {
            index: 1,
            source: io::Error::new(io::ErrorKind::WouldBlock, "no more threads"),
        };
        let display = error.to_string();
        assert!(display.contains("worker 1"));
        assert!(display.contains("no more threads"));
        assert!(std::error::Error::source(&error).is_some());
        assert!(!error.is_interrupted());
    }

    #[test]
    fn test_panic_payloads() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let opaque: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(from_str.as_ref()), "boom");
        assert_eq!(panic_message(from_string.as_ref()), "bang");
        assert_eq!(panic_message(opaque.as_ref()), "non-string panic payload");

        let error = FanOutError::panicked(2, from_str.as_ref());
        assert_eq!(error.to_string(), "worker 2 panicked: boom");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let error: FanOutError = ConfigError::OutOfRange {
            field: "workers".to_string(),
            value: 0,
            min: 1,
            max: 1024,
        }
        .into();
        assert!(error.to_string().starts_with("Value 0 for field 'workers'"));
    }
}
