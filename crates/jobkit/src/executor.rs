//! Job pipeline - applies one target spec to the local machine
//!
//! Stages run strictly in order: pre-configuration commands, apt-get, file
//! transfers, post-configuration commands. Anything failing before the post
//! stage aborts the job; post command failures are recorded and the remaining
//! post commands still run.

use crate::context::{CancelToken, CommandRunner, EventSink};
use crate::error::{JobError, Result};
use crate::events::{JobEvents, JobReceivers, drain, job_channels};
use crate::types::{CommandOutput, JobOptions, JobStage, JobSummary};
use interpolate::Variables;
use log::debug;
use speckit::{CommandPhase, ResolveError, Resolver, SpecRepository, apt_get_commands};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

static NEXT_JOB: AtomicU64 = AtomicU64::new(0);

/// One run of the pipeline for one target spec.
///
/// Each job stages files under its own private directory, created when the
/// transfer stage starts, but the final move writes to shared system paths:
/// running two jobs whose destinations overlap at the same time is up to the
/// caller.
pub struct Job {
    pub(crate) id: String,
    pub(crate) target: String,
    pub(crate) vars: Variables,
    pub(crate) repository: Arc<SpecRepository>,
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) options: JobOptions,
    pub(crate) cancel: CancelToken,
    pub(crate) events: JobEvents,
    pub(crate) stage: JobStage,
    pub(crate) summary: JobSummary,
}

impl Job {
    /// Create a job and the receiving ends of its event channels
    pub fn new(
        target: impl Into<String>,
        mut vars: Variables,
        repository: Arc<SpecRepository>,
        runner: Arc<dyn CommandRunner>,
        options: JobOptions,
    ) -> (Self, JobReceivers) {
        let target = target.into();
        if vars.specname.is_empty() {
            vars.specname = target.clone();
        }

        let seq = NEXT_JOB.fetch_add(1, Ordering::Relaxed);
        let (events, receivers) = job_channels(options.channel_capacity);

        let job = Self {
            id: format!("{}-{seq}", std::process::id()),
            summary: JobSummary {
                target: target.clone(),
                ..Default::default()
            },
            target,
            vars,
            repository,
            runner,
            options,
            cancel: CancelToken::new(),
            events,
            stage: JobStage::Pending,
        };

        (job, receivers)
    }

    /// Share an existing cancellation token with this job
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every stage. The event channels close when this returns.
    pub async fn run(mut self) -> Result<JobSummary> {
        debug!("Job {} starting for spec '{}'", self.id, self.target);

        match self.pipeline().await {
            Ok(()) => {
                self.enter(JobStage::Completed).await?;
                self.events
                    .information(format!("Spec [{}] configured", self.target))
                    .await;
                self.summary.stage = JobStage::Completed;
                Ok(self.summary)
            }
            Err(err) => {
                self.stage = JobStage::Failed;
                debug!("Job {} failed: {err}", self.id);
                Err(err)
            }
        }
    }

    async fn pipeline(&mut self) -> Result<()> {
        self.enter(JobStage::PreCommands).await?;
        self.run_pre_commands().await?;

        self.enter(JobStage::PackageInstall).await?;
        self.install_packages().await?;

        self.enter(JobStage::FileTransfer).await?;
        self.transfer_files().await?;

        self.enter(JobStage::PostCommands).await?;
        self.run_post_commands().await
    }

    async fn enter(&mut self, to: JobStage) -> Result<()> {
        self.stage.advance(to)?;
        self.summary.stage = to;
        if !to.is_terminal() {
            self.events
                .delta(format!("Starting {to} for [{}]", self.target))
                .await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------------

    async fn run_pre_commands(&mut self) -> Result<()> {
        let commands = self.resolve(|r, t| r.pre_commands(t)).await?;
        let tailed = self
            .resolve(|r, t| r.tailed_commands(t, CommandPhase::Pre))
            .await?;

        self.run_fail_fast(&commands, &tailed).await?;
        self.events
            .information(format!("pre-configuration for [{}] succeeded", self.target))
            .await;
        Ok(())
    }

    async fn install_packages(&mut self) -> Result<()> {
        let packages = self.resolve(|r, t| r.apt_packages(t)).await?;
        if packages.is_empty() {
            self.events.notice("No apt-get packages to install").await;
            return Ok(());
        }

        let commands = apt_get_commands(&packages, &self.options.privilege);
        self.run_fail_fast(&commands, &HashSet::new()).await?;
        self.events
            .information(format!("Installed packages: {}", packages.join(" ")))
            .await;
        Ok(())
    }

    async fn run_post_commands(&mut self) -> Result<()> {
        let commands = self.resolve(|r, t| r.post_commands(t)).await?;
        let tailed = self
            .resolve(|r, t| r.tailed_commands(t, CommandPhase::Post))
            .await?;

        for command in &commands {
            self.events
                .delta(format!("Running post-configuration command: [{command}]"))
                .await;

            match self.run_command(command).await {
                Ok(output) => {
                    self.forward_tail(command, &output, &tailed).await;
                    self.events
                        .information(format!("post-configuration command: [{command}] succeeded"))
                        .await;
                }
                Err(err) if err.is_cancelled() => return Err(self.abort(err).await),
                Err(err) => {
                    self.events.error(err.clone()).await;
                    self.summary.post_failures.push(err);
                }
            }
        }

        match self.summary.post_failures.len() {
            0 => {
                self.events
                    .information(format!("post-configuration for [{}] succeeded", self.target))
                    .await;
            }
            failed => {
                self.events
                    .notice(format!(
                        "post-configuration for [{}] finished with {failed} failed command(s)",
                        self.target
                    ))
                    .await;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Run commands in order, aborting the job on the first failure
    async fn run_fail_fast(&mut self, commands: &[String], tailed: &HashSet<String>) -> Result<()> {
        let stage = self.stage;
        for command in commands {
            self.events
                .delta(format!("Running {stage} command: [{command}]"))
                .await;

            let output = match self.run_command(command).await {
                Ok(output) => output,
                Err(err) => return Err(self.abort(err).await),
            };

            self.forward_tail(command, &output, tailed).await;
            self.events
                .information(format!("{stage} command: [{command}] succeeded"))
                .await;
        }
        Ok(())
    }

    /// Run one command, turning a non-zero exit into an error.
    ///
    /// Output of a failed command is always forwarded as responses.
    async fn run_command(&mut self, command: &str) -> Result<CommandOutput> {
        self.check_cancelled()?;

        if self.options.dry_run {
            self.events.notice(format!("Would run: {command}")).await;
            return Ok(CommandOutput::ok());
        }

        let output = self
            .runner
            .run(command)
            .await
            .map_err(|source| JobError::Spawn {
                stage: self.stage,
                command: command.to_string(),
                source: Arc::new(source),
            })?;
        self.summary.commands_run += 1;

        if output.success {
            return Ok(output);
        }

        let stdout = output.stdout_str();
        let stderr = output.stderr_str();
        for text in [&stdout, &stderr] {
            if !text.trim().is_empty() {
                self.events.response(text.trim_end()).await;
            }
        }

        Err(JobError::Command {
            stage: self.stage,
            command: command.to_string(),
            status: output.code,
            stdout,
            stderr,
        })
    }

    async fn forward_tail(&self, command: &str, output: &CommandOutput, tailed: &HashSet<String>) {
        if !tailed.contains(command) {
            return;
        }
        let stdout = output.stdout_str();
        if !stdout.trim().is_empty() {
            self.events.response(stdout.trim_end()).await;
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled { stage: self.stage });
        }
        Ok(())
    }

    /// Ask the resolver about the target, aborting the job on failure
    pub(crate) async fn resolve<T>(
        &self,
        query: impl FnOnce(Resolver<'_>, &str) -> std::result::Result<T, ResolveError>,
    ) -> Result<T> {
        match query(self.repository.resolver(), &self.target) {
            Ok(value) => Ok(value),
            Err(err) => Err(self.abort(err.into()).await),
        }
    }

    /// Report `cause` followed by the abort notice for the current stage
    pub(crate) async fn abort(&self, cause: JobError) -> JobError {
        self.events.error(cause.clone()).await;

        let aborted = JobError::Aborted {
            stage: self.stage,
            target: self.target.clone(),
            cause: Box::new(cause),
        };
        self.events.error(aborted.clone()).await;
        aborted
    }
}

/// Run `job` on its own task while one consumer task drains its events into
/// `sink`.
///
/// Returns once the job has signalled completion and every event it emitted
/// has reached the sink.
pub async fn run_job(job: Job, receivers: JobReceivers, sink: Arc<dyn EventSink>) -> Result<JobSummary> {
    let consumer = tokio::spawn(async move { drain(receivers, sink.as_ref()).await });

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = job.run().await;
        if done_tx.send(result).is_err() {
            debug!("job finished after its owner stopped waiting");
        }
    });

    let result = done_rx.await.unwrap_or_else(|_| {
        Err(JobError::Crashed {
            reason: "job task stopped before completing".to_string(),
        })
    });

    if let Err(err) = consumer.await {
        return Err(JobError::Crashed {
            reason: format!("event consumer failed: {err}"),
        });
    }

    result
}
