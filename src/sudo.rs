//! Scoped sudo session for `configure`
//!
//! The credential timestamp is validated once before the job starts so that
//! the `sudo` commands it runs do not prompt mid-pipeline, and invalidated again
//! when the session is dropped. Both calls block on the child process, so the
//! session lives outside the async runtime.

use anyhow::{Context, Result, bail};
use std::process::Command;

/// Scoped sudo context - invalidates the cached credentials on drop
pub struct SudoContext {
    program: String,
}

impl SudoContext {
    /// Validate `program` (normally "sudo"), prompting for a password if needed
    pub fn acquire(program: &str, reason: &str) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        let status = Command::new(program)
            .arg("-v")
            .status()
            .with_context(|| format!("Failed to execute {program}"))?;

        if !status.success() {
            bail!("Failed to acquire {program} privileges");
        }

        Ok(Self {
            program: program.to_string(),
        })
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        let _ = Command::new(&self.program).arg("-k").status();
    }
}

/// Whether the current process already runs as root (EUID 0)
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Only plain `sudo` supports the validate/invalidate session dance
pub fn supports_session(privilege: &str) -> bool {
    privilege.trim() == "sudo"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_session() {
        assert!(supports_session("sudo"));
        assert!(supports_session(" sudo "));
        assert!(!supports_session("sudo -u deploy"));
        assert!(!supports_session(""));
        assert!(!supports_session("doas"));
    }

    #[test]
    fn test_is_root_follows_effective_uid() {
        let euid = nix::unistd::Uid::effective();
        assert_eq!(is_root(), euid.as_raw() == 0);
    }

    #[test]
    fn test_session_validates_and_releases() {
        let session = SudoContext::acquire("true", "testing").unwrap();
        assert_eq!(session.program, "true");
        drop(session);

        assert!(SudoContext::acquire("false", "testing").is_err());
        assert!(SudoContext::acquire("/nonexistent/sudo", "testing").is_err());
    }
}
