//! Job error types

use crate::types::JobStage;
use interpolate::InterpolationError;
use speckit::ResolveError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Step of a file transfer that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    CreateStagingDir,
    CreateDestinationDir,
    Read,
    WriteStaged,
    Move,
    Chown,
    Chmod,
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CreateStagingDir => "create staging directory for",
            Self::CreateDestinationDir => "create directory",
            Self::Read => "read",
            Self::WriteStaged => "write staged copy of",
            Self::Move => "move into place",
            Self::Chown => "change owner of",
            Self::Chmod => "change mode of",
        };
        f.write_str(text)
    }
}

/// Errors raised while running a job.
///
/// Errors travel over the event channel as well as being returned, so they are
/// `Clone`; io sources are shared behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("{stage} command `{command}` failed ({})", exit_text(.status))]
    Command {
        stage: JobStage,
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to start {stage} command `{command}`: {source}")]
    Spawn {
        stage: JobStage,
        command: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to {action} {}: {source}", path.display())]
    Transfer {
        action: TransferAction,
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to interpolate {}: {source}", path.display())]
    Interpolation {
        path: PathBuf,
        #[source]
        source: InterpolationError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{stage} failed for spec '{target}', aborting remaining tasks")]
    Aborted {
        stage: JobStage,
        target: String,
        #[source]
        cause: Box<JobError>,
    },

    #[error("job cancelled during {stage}")]
    Cancelled { stage: JobStage },

    #[error("invalid stage transition from {from} to {to}")]
    InvalidTransition { from: JobStage, to: JobStage },

    #[error("job ended without reporting: {reason}")]
    Crashed { reason: String },
}

impl JobError {
    pub(crate) fn transfer(action: TransferAction, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Transfer {
            action,
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Whether this is (or was caused by) a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Aborted { cause, .. } => cause.is_cancelled(),
            _ => false,
        }
    }

    /// The innermost error behind any `Aborted` wrappers
    pub fn root_cause(&self) -> &JobError {
        match self {
            Self::Aborted { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

fn exit_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
