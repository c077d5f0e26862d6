//! Error types for the target pipeline and the binary introspector.
//!
//! Every target-scoped variant carries the target key so a failure can be
//! reported against the configuration slot that produced it.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or ambiguous configuration for a target.
    Config,
    /// An external tool could not be started or exited unsuccessfully.
    ToolInvocation,
    /// A wasm binary could not be read or is not a valid module.
    Introspection,
}

/// Main error type of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The target lacks information a step requires.
    #[error("\"{target}\": {message}")]
    Config {
        /// Key of the target.
        target: String,
        /// Description of the configuration problem.
        message: String,
    },

    /// An external tool exited with a non-zero status.
    #[error("\"{target}\": `{command}` failed ({status})")]
    ToolFailed {
        /// Key of the target.
        target: String,
        /// Full command line that was executed.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
    },

    /// An external tool could not be spawned at all.
    #[error("\"{target}\": failed to spawn `{program}`")]
    Spawn {
        /// Key of the target.
        target: String,
        /// Program name.
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `cargo metadata` printed something that is not the expected JSON.
    #[error("\"{target}\": unreadable cargo metadata")]
    Metadata {
        /// Key of the target.
        target: String,
        #[source]
        source: serde_json::Error,
    },

    /// The wasm file could not be read.
    #[error("failed to read wasm file {}", path.display())]
    WasmRead {
        /// Path of the binary.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The wasm file is not a valid core module.
    #[error("invalid wasm module {}: {message}", path.display())]
    WasmInvalid {
        /// Path of the binary.
        path: PathBuf,
        /// Validator or parser message.
        message: String,
    },
}

impl Error {
    pub(crate) fn config(target: &str, message: impl Into<String>) -> Self {
        Self::Config {
            target: target.to_string(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::ToolFailed { .. } | Self::Spawn { .. } | Self::Metadata { .. } => {
                ErrorKind::ToolInvocation
            }
            Self::WasmRead { .. } | Self::WasmInvalid { .. } => ErrorKind::Introspection,
        }
    }

    /// Returns `true` for missing or ambiguous configuration.
    pub fn is_config_error(&self) -> bool {
        self.kind() == ErrorKind::Config
    }

    /// Returns `true` when an external tool failed or could not run.
    pub fn is_tool_error(&self) -> bool {
        self.kind() == ErrorKind::ToolInvocation
    }

    /// Returns `true` when a wasm binary could not be introspected.
    pub fn is_introspection_error(&self) -> bool {
        self.kind() == ErrorKind::Introspection
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_variants() {
        assert!(Error::config("gen/app", "no manifest path").is_config_error());

        let failed = Error::ToolFailed {
            target: "gen/app".into(),
            command: "cargo build".into(),
            status: "exit status: 101".into(),
        };
        assert!(failed.is_tool_error());

        let invalid = Error::WasmInvalid {
            path: PathBuf::from("a.wasm"),
            message: "bad magic".into(),
        };
        assert!(invalid.is_introspection_error());
        assert!(!invalid.is_config_error());
    }

    #[test]
    fn message_names_target() {
        let err = Error::config("gen/app", "multiple packages");
        assert_eq!(err.to_string(), "\"gen/app\": multiple packages");
    }
}
