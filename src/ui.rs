use colored::Colorize;
use jobkit::{EventSink, JobError};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print an error with a bold title and a detail line
pub fn error_box(title: &str, detail: &str) {
    eprintln!("{} {}", "✗".red(), title.red().bold());
    eprintln!("  {detail}");
}

/// Print a step in progress
pub fn step(msg: &str) {
    println!("{} {}", "→".blue(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a label followed by one indented line per item
pub fn list(label: &str, items: &[String]) {
    if items.is_empty() {
        kv(label, &"none".dimmed().to_string());
        return;
    }
    println!("  {}:", label.dimmed());
    for item in items {
        println!("    {}", item.cyan());
    }
}

// ============================================================================
// Job Reporter
// ============================================================================

/// Prints job events as they are drained
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    /// `quiet` hides progress and command output, keeping results and errors
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl EventSink for TerminalReporter {
    fn delta(&self, message: &str) {
        if !self.quiet {
            step(message);
        }
    }

    fn notice(&self, message: &str) {
        warn(message);
    }

    fn response(&self, message: &str) {
        if !self.quiet {
            for line in message.lines() {
                dim(line);
            }
        }
    }

    fn information(&self, message: &str) {
        if !self.quiet {
            success(message);
        }
    }

    fn error(&self, error: &JobError) {
        self::error(&error.to_string());
    }
}
