use colored::*;
use std::fmt::Display;
use std::io::Write;

/// Tagged console output shared by the executor and the manager.
///
/// `[INFO]` lines are only printed in verbose mode; warnings and errors are
/// always printed to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    verbose: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn info(&self, msg: impl Display) {
        if self.verbose {
            println!("{} {}", "[INFO]".cyan(), msg);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        eprintln!("{} {}", "[WARN]".yellow(), msg);
    }

    pub fn error(&self, msg: impl Display) {
        eprintln!("{} {}", "[ERROR]".red().bold(), msg);
    }

    /// Copies a subprocess's captured stderr to our own stderr.
    pub fn forward_stderr(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if our own stderr is gone.
        let _ = stderr.write_all(bytes);
        let _ = stderr.flush();
    }
}
