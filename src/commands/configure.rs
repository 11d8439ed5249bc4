//! `configure` - apply a spec to this machine
//!
//! The sudo session is validated before the runtime starts and released after
//! it has shut down; only the job itself runs async.

use crate::Context;
use crate::cli::ConfigureArgs;
use crate::commands::load_repository;
use crate::config::CmConfig;
use crate::sudo::{self, SudoContext};
use crate::ui::{self, TerminalReporter};
use anyhow::{Context as AnyhowContext, Result, bail};
use interpolate::Variables;
use jobkit::{Job, JobOptions, JobReceivers, JobSummary, LocalShell, run_job};
use std::sync::Arc;

pub fn run(ctx: &Context, args: ConfigureArgs) -> Result<()> {
    let repository = load_repository(ctx)?;
    if !repository.contains(&args.name) {
        ui::error_box(
            "Unable to find Spec!",
            &format!("I was unable to find a spec named [{}].", args.name),
        );
        bail!("unknown spec '{}'", args.name);
    }

    let options = JobOptions {
        privilege: effective_privilege(&ctx.config.privilege, args.no_sudo, sudo::is_root()),
        dry_run: args.dry_run,
        channel_capacity: ctx.config.channel_capacity,
        ..Default::default()
    };

    let _sudo = if !options.dry_run && sudo::supports_session(&options.privilege) {
        Some(SudoContext::acquire(
            &options.privilege,
            &format!("configuring this machine with spec [{}]", args.name),
        )?)
    } else {
        None
    };

    let (job, receivers) = Job::new(
        args.name.clone(),
        variables(&ctx.config, &args),
        Arc::new(repository),
        Arc::new(LocalShell::new()),
        options,
    );

    if args.dry_run {
        ui::info(&format!("Dry run of spec [{}], nothing will change", args.name));
    } else {
        ui::info(&format!("Configuring this machine with spec [{}]", args.name));
    }

    // declared after the session so it shuts down before the session drops
    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let summary = runtime
        .block_on(execute(job, receivers, ctx.quiet))
        .with_context(|| format!("Failed to configure spec [{}]", args.name))?;

    report(&summary);
    Ok(())
}

/// Run the job, cancelling it on Ctrl-C
async fn execute(job: Job, receivers: JobReceivers, quiet: bool) -> jobkit::Result<JobSummary> {
    let cancel = job.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping before the next step");
            cancel.cancel();
        }
    });

    run_job(job, receivers, Arc::new(TerminalReporter::new(quiet))).await
}

/// CLI values win over config defaults
fn variables(config: &CmConfig, args: &ConfigureArgs) -> Variables {
    let pick = |cli: &Option<String>, default: &String| cli.clone().unwrap_or_else(|| default.clone());

    Variables {
        class: pick(&args.class, &config.variables.class),
        sequence: pick(&args.sequence, &config.variables.sequence),
        locale: pick(&args.locale, &config.variables.locale),
        specname: args.name.clone(),
    }
}

/// Root, or an explicit `--no-sudo`, needs no prefix
fn effective_privilege(configured: &str, no_sudo: bool, is_root: bool) -> String {
    if no_sudo || is_root {
        String::new()
    } else {
        configured.trim().to_string()
    }
}

fn report(summary: &JobSummary) {
    if summary.is_clean() {
        ui::success(&format!(
            "Spec [{}] applied: {} commands run, {} files installed",
            summary.target, summary.commands_run, summary.files_transferred
        ));
        return;
    }

    ui::warn(&format!(
        "Spec [{}] applied, but {} post-configuration command(s) failed:",
        summary.target,
        summary.post_failures.len()
    ));
    for failure in &summary.post_failures {
        ui::dim(&failure.to_string());
    }
}
