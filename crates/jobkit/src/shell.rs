//! Local command execution through `sh -c`

use crate::context::CommandRunner;
use crate::types::CommandOutput;
use async_trait::async_trait;
use log::debug;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs command lines with the local POSIX shell
#[derive(Debug, Clone)]
pub struct LocalShell {
    shell: String,
}

impl Default for LocalShell {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl LocalShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell binary (it must accept `-c <command>`)
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for LocalShell {
    async fn run(&self, command: &str) -> io::Result<CommandOutput> {
        debug!("{} -c {}", self.shell, command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(output.into())
    }
}

/// Quote a path for safe use as one shell word
pub fn quote(path: &Path) -> String {
    quote_str(&path.to_string_lossy())
}

/// Quote a string for safe use as one shell word
pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Prefix `command` with the privilege helper, if any
pub fn elevate(privilege: &str, command: &str) -> String {
    if privilege.trim().is_empty() {
        command.to_string()
    } else {
        format!("{} {command}", privilege.trim())
    }
}
