mod cli;
mod commands;
mod config;
mod paths;
mod sudo;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::CmConfig;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub strict: bool,
    pub config: CmConfig,
    /// Spec directories given on the command line; replace the configured ones
    pub specs_dirs: Vec<PathBuf>,
}

impl Context {
    /// Candidate spec directories in scan order
    pub fn spec_dirs(&self) -> Vec<PathBuf> {
        if self.specs_dirs.is_empty() {
            self.config.spec_dirs()
        } else {
            self.specs_dirs.clone()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let config = CmConfig::load()?;
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        strict: cli.strict || config.strict,
        config,
        specs_dirs: cli.specs_dirs,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::ListSpecs { json } => commands::specs::list(&ctx, json),
        Command::DescribeSpec { name, json } => commands::specs::describe(&ctx, &name, json),
        Command::Configure(args) => commands::configure::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cm", &mut io::stdout());
            Ok(())
        }
    }
}
