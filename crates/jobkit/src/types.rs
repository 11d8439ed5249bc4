//! Core types for job execution

use crate::error::JobError;
use std::fmt;
use std::path::PathBuf;
use std::process::Output;

/// Default capacity of each event channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// Pipeline stages, strictly in this order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JobStage {
    #[default]
    Pending,
    PreCommands,
    PackageInstall,
    FileTransfer,
    PostCommands,
    Completed,
    Failed,
}

impl JobStage {
    /// The stage that follows on success, if any
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::PreCommands),
            Self::PreCommands => Some(Self::PackageInstall),
            Self::PackageInstall => Some(Self::FileTransfer),
            Self::FileTransfer => Some(Self::PostCommands),
            Self::PostCommands => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    /// Whether the pipeline may move from `self` to `to`.
    ///
    /// Only the next stage is reachable, plus `Failed` from any active stage.
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Failed {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Move to `to`, rejecting anything but a legal transition
    pub fn advance(&mut self, to: Self) -> Result<(), JobError> {
        if !self.can_transition_to(to) {
            return Err(JobError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::PreCommands => "pre-configuration",
            Self::PackageInstall => "apt-get",
            Self::FileTransfer => "file transfer",
            Self::PostCommands => "post-configuration",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Options for a job
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Prefix for privileged commands ("sudo"); empty runs them directly
    pub privilege: String,
    /// Report every command and transfer without executing it
    pub dry_run: bool,
    /// Directory under which each job creates its own private `cm-*`
    /// staging directory. It should not be writable by other users unless it
    /// is sticky like the system temp directory.
    pub staging_root: PathBuf,
    /// Capacity of each event channel
    pub channel_capacity: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            privilege: speckit::DEFAULT_PRIVILEGE.to_string(),
            dry_run: false,
            staging_root: std::env::temp_dir(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// What a finished job did
#[derive(Debug, Clone, Default)]
pub struct JobSummary {
    pub target: String,
    pub commands_run: usize,
    pub files_transferred: usize,
    /// Post-configuration failures; recorded but not fatal
    pub post_failures: Vec<JobError>,
    pub stage: JobStage,
}

impl JobSummary {
    pub fn is_clean(&self) -> bool {
        self.post_failures.is_empty()
    }
}

/// Output of a shell command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// A successful run with no output
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            success: true,
            ..Default::default()
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            stderr: stderr.as_bytes().to_vec(),
            code: Some(code),
            success: false,
            ..Default::default()
        }
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = JobStage::Pending;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_transition_to(next));
            stage = next;
            seen.push(stage);
        }

        assert_eq!(
            seen,
            vec![
                JobStage::Pending,
                JobStage::PreCommands,
                JobStage::PackageInstall,
                JobStage::FileTransfer,
                JobStage::PostCommands,
                JobStage::Completed,
            ]
        );
    }

    #[test]
    fn test_no_skipping_or_looping_back() {
        assert!(!JobStage::PreCommands.can_transition_to(JobStage::FileTransfer));
        assert!(!JobStage::PostCommands.can_transition_to(JobStage::PreCommands));
        assert!(JobStage::FileTransfer.can_transition_to(JobStage::Failed));
        assert!(!JobStage::Completed.can_transition_to(JobStage::Failed));
        assert!(!JobStage::Failed.can_transition_to(JobStage::PreCommands));
    }

    #[test]
    fn test_advance_rejects_illegal_transition() {
        let mut stage = JobStage::Pending;
        stage.advance(JobStage::PreCommands).unwrap();
        let err = stage.advance(JobStage::PostCommands).unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
        assert_eq!(stage, JobStage::PreCommands);
    }

    #[test]
    fn test_command_output_helpers() {
        assert!(CommandOutput::ok().success);
        let failed = CommandOutput::failed(2, "boom\n");
        assert!(!failed.success);
        assert_eq!(failed.code, Some(2));
        assert_eq!(failed.stderr_str(), "boom\n");
    }
}
