//! File transfer stage
//!
//! Each file is read whole into memory, interpolated when flagged, written to
//! the job's staging directory and then moved into place with the privilege
//! prefix. Config files are expected to be small.
//!
//! The staging directory is created fresh for every run with a random name
//! and mode 0700, so nothing already present under the staging root can
//! redirect the staged writes.

use crate::error::{JobError, Result, TransferAction};
use crate::executor::Job;
use crate::shell::{elevate, quote, quote_str};
use log::{debug, warn};
use speckit::FileTransfer;
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// Name prefix of per-job staging directories
pub(crate) const STAGING_PREFIX: &str = "cm-";

impl Job {
    pub(crate) async fn transfer_files(&mut self) -> Result<()> {
        let transfers = self.resolve(|r, t| r.file_transfers(t)).await?;
        if transfers.is_empty() {
            self.events.information("No files to transfer").await;
            return Ok(());
        }

        let mut outcome = Ok(());
        if self.options.dry_run {
            for transfer in &transfers {
                if let Err(err) = self.report_transfer(transfer).await {
                    outcome = Err(err);
                    break;
                }
            }
        } else {
            let staging = match self.create_staging().await {
                Ok(staging) => staging,
                Err(err) => return Err(self.abort(err).await),
            };
            for transfer in &transfers {
                if let Err(err) = self.transfer_one(transfer, staging.path()).await {
                    outcome = Err(err);
                    break;
                }
            }
            self.remove_staging(staging).await;
        }

        match outcome {
            Ok(()) => {
                self.events
                    .information(format!("File copy succeeded ({} files)", transfers.len()))
                    .await;
                Ok(())
            }
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn report_transfer(&self, transfer: &FileTransfer) -> Result<()> {
        self.check_cancelled()?;
        self.events
            .notice(format!(
                "Would copy {} to {}",
                transfer.source.display(),
                transfer.destination.display()
            ))
            .await;
        Ok(())
    }

    /// Create a new private directory under the staging root.
    ///
    /// Only the root itself may already exist; the directory below it is
    /// created exclusively, never reused.
    pub(crate) async fn create_staging(&self) -> Result<TempDir> {
        let root = self.options.staging_root.clone();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| JobError::transfer(TransferAction::CreateStagingDir, &root, e))?;

        let created = tokio::task::spawn_blocking({
            let root = root.clone();
            move || tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir_in(root)
        })
        .await
        .map_err(io::Error::other)
        .and_then(|created| created)
        .map_err(|e| JobError::transfer(TransferAction::CreateStagingDir, &root, e))?;

        debug!("Job {} staging under {}", self.id, created.path().display());
        Ok(created)
    }

    async fn transfer_one(&mut self, transfer: &FileTransfer, staging: &Path) -> Result<()> {
        self.check_cancelled()?;

        let destination = &transfer.destination;
        let staged = staging.join(destination.strip_prefix("/").unwrap_or(destination));

        self.events
            .delta(format!("Copying file: {}", destination.display()))
            .await;

        if let Some(parent) = staged.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| JobError::transfer(TransferAction::CreateStagingDir, destination, e))?;
        }

        let folder = &transfer.destination_folder;
        self.privileged(
            &format!("mkdir -p {}", quote(folder)),
            TransferAction::CreateDestinationDir,
            folder,
        )
        .await?;

        let bytes = tokio::fs::read(&transfer.source)
            .await
            .map_err(|e| JobError::transfer(TransferAction::Read, &transfer.source, e))?;

        let bytes = if transfer.interpolate {
            interpolate::evaluate(&bytes, &self.vars).map_err(|source| JobError::Interpolation {
                path: transfer.source.clone(),
                source,
            })?
        } else {
            self.events
                .notice(format!(
                    "Skipping interpolation on file: {}",
                    destination.display()
                ))
                .await;
            bytes
        };

        tokio::fs::write(&staged, bytes)
            .await
            .map_err(|e| JobError::transfer(TransferAction::WriteStaged, destination, e))?;

        self.privileged(
            &format!("mv {} {}", quote(&staged), quote(destination)),
            TransferAction::Move,
            destination,
        )
        .await?;

        if let Some(owner) = &transfer.owner {
            self.privileged(
                &format!("chown {} {}", quote_str(owner), quote(destination)),
                TransferAction::Chown,
                destination,
            )
            .await?;
        }

        if let Some(mode) = &transfer.mode {
            self.privileged(
                &format!("chmod {} {}", quote_str(mode), quote(destination)),
                TransferAction::Chmod,
                destination,
            )
            .await?;
        }

        self.summary.files_transferred += 1;
        self.events
            .information(format!("Completed copy of file: {}", destination.display()))
            .await;
        Ok(())
    }

    /// Run a filesystem command with the privilege prefix
    async fn privileged(&self, command: &str, action: TransferAction, path: &Path) -> Result<()> {
        let command = elevate(&self.options.privilege, command);
        let output = self
            .runner
            .run(&command)
            .await
            .map_err(|e| JobError::transfer(action, path, e))?;

        if output.success {
            return Ok(());
        }

        let stderr = output.stderr_str();
        let detail = if stderr.trim().is_empty() {
            match output.code {
                Some(code) => format!("`{command}` exited with code {code}"),
                None => format!("`{command}` was terminated by a signal"),
            }
        } else {
            stderr.trim().to_string()
        };
        Err(JobError::transfer(action, path, io::Error::other(detail)))
    }

    /// Remove the staging directory; failure only warns.
    ///
    /// The privileged `rm -rf` covers anything a privileged command left
    /// behind. Whatever still remains goes when `staging` is dropped.
    async fn remove_staging(&self, staging: TempDir) {
        let path = staging.path();
        let command = elevate(&self.options.privilege, &format!("rm -rf {}", quote(path)));
        let failure = match self.runner.run(&command).await {
            Ok(output) if output.success => {
                debug!("Removed staging directory {}", path.display());
                return;
            }
            Ok(output) => output.stderr_str().trim().to_string(),
            Err(err) => err.to_string(),
        };

        warn!("Could not remove staging directory {}: {failure}", path.display());
        self.events
            .notice(format!("Could not remove staging directory {}", path.display()))
            .await;
    }
}
