//! # jobkit
//!
//! Runs a resolved spec against the local machine.
//!
//! A [`Job`] walks four stages in order: pre-configuration commands, apt-get
//! packages, file transfers and post-configuration commands. Progress is
//! reported on five bounded channels (deltas, notices, responses,
//! information, errors) that a consumer drains into an [`EventSink`].
//!
//! ```ignore
//! use jobkit::{Job, JobOptions, LocalShell, NoReport, run_job};
//!
//! let (job, receivers) = Job::new("web", vars, repository, Arc::new(LocalShell::new()), JobOptions::default());
//! let summary = run_job(job, receivers, Arc::new(NoReport)).await?;
//! ```

mod context;
mod error;
mod events;
mod executor;
mod shell;
mod transfer;
mod types;

pub use context::{CancelToken, CommandRunner, Event, EventLog, EventSink, NoReport};
pub use error::{JobError, Result, TransferAction};
pub use events::{JobEvents, JobReceivers, drain, job_channels};
pub use executor::{Job, run_job};
pub use shell::{LocalShell, elevate, quote, quote_str};
pub use types::{CommandOutput, DEFAULT_CHANNEL_CAPACITY, JobOptions, JobStage, JobSummary};
