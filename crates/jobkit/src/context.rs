//! Seams between the pipeline and the outside world
//!
//! The job never spawns processes or prints anything itself: commands go
//! through a [`CommandRunner`] and events end up at an [`EventSink`].

use crate::error::JobError;
use crate::types::CommandOutput;
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Runs shell command lines
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command line to completion, capturing its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`]; `Err` is
    /// reserved for failing to start the command at all.
    async fn run(&self, command: &str) -> io::Result<CommandOutput>;
}

/// Receives the events of a job, one call per drained message
pub trait EventSink: Send + Sync {
    /// A stage or step is starting
    fn delta(&self, message: &str);

    /// Something was skipped or only simulated
    fn notice(&self, message: &str);

    /// Output captured from a command or transfer
    fn response(&self, message: &str);

    /// A stage or step succeeded
    fn information(&self, message: &str);

    fn error(&self, error: &JobError);
}

/// Sink that discards everything
pub struct NoReport;

impl EventSink for NoReport {
    fn delta(&self, _message: &str) {}
    fn notice(&self, _message: &str) {}
    fn response(&self, _message: &str) {}
    fn information(&self, _message: &str) {}
    fn error(&self, _error: &JobError) {}
}

/// One recorded event
#[derive(Debug, Clone)]
pub enum Event {
    Delta(String),
    Notice(String),
    Response(String),
    Information(String),
    Error(JobError),
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<JobError> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    /// Messages of every non-error event of one kind, in order
    pub fn messages(&self, kind: fn(&Event) -> Option<&String>) -> Vec<String> {
        self.events().iter().filter_map(kind).cloned().collect()
    }
}

impl Event {
    pub fn as_delta(&self) -> Option<&String> {
        match self {
            Self::Delta(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_notice(&self) -> Option<&String> {
        match self {
            Self::Notice(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&String> {
        match self {
            Self::Response(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_information(&self) -> Option<&String> {
        match self {
            Self::Information(m) => Some(m),
            _ => None,
        }
    }
}

impl EventSink for EventLog {
    fn delta(&self, message: &str) {
        self.push(Event::Delta(message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.push(Event::Notice(message.to_string()));
    }

    fn response(&self, message: &str) {
        self.push(Event::Response(message.to_string()));
    }

    fn information(&self, message: &str) {
        self.push(Event::Information(message.to_string()));
    }

    fn error(&self, error: &JobError) {
        self.push(Event::Error(error.clone()));
    }
}

/// Cooperative cancellation flag shared between a job and its owner
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop before its next command or file
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.delta("start");
        log.information("done");
        log.error(&JobError::Crashed {
            reason: "gone".into(),
        });

        assert_eq!(log.events().len(), 3);
        assert_eq!(log.messages(Event::as_delta), vec!["start"]);
        assert_eq!(log.messages(Event::as_information), vec!["done"]);
        assert_eq!(log.errors().len(), 1);
    }
}
