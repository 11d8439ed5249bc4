use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cm")]
#[command(author = "Praveen Sastry")]
#[command(version)]
#[command(about = "Command line configuration management driven by declarative specs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Spec directory to scan (repeatable; replaces the configured list)
    #[arg(long = "specs-dir", env = "CM_SPECS_DIR", value_delimiter = ':', global = true)]
    pub specs_dirs: Vec<PathBuf>,

    /// Fail on spec documents without a NAME instead of skipping them
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all available specs
    #[command(visible_alias = "ls")]
    ListSpecs {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show what a given spec will build
    #[command(visible_alias = "ds")]
    DescribeSpec {
        /// Spec name
        name: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Configure this machine with a given spec
    #[command(visible_alias = "c")]
    Configure(ConfigureArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Spec name
    pub name: String,

    /// Host class, available to templates as var.class
    #[arg(long)]
    pub class: Option<String>,

    /// Host sequence, available to templates as var.sequence
    #[arg(long)]
    pub sequence: Option<String>,

    /// Host locale, available to templates as var.locale
    #[arg(long)]
    pub locale: Option<String>,

    /// Show what would run without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run privileged steps without a privilege prefix
    #[arg(long)]
    pub no_sudo: bool,
}
