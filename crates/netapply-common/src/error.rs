//! Error types for netapply operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for configuration errors (`EX_CONFIG` from sysexits.h).
pub const EX_CONFIG: u8 = 78;

/// Result type alias for netapply operations.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Errors that can occur during a reconciliation pass.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// The configuration generator exited non-zero.
    #[error("Configuration generator failed with exit code {exit_code}")]
    GenerationFailed {
        /// Exit code reported by the generator.
        exit_code: i32,
    },

    /// Declared or tool configuration is unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The operational state attribute of a device could not be read.
    #[error("Cannot determine operstate of {device}: {source}")]
    DeviceState {
        /// The interface name.
        device: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The live interface list could not be enumerated.
    #[error("Failed to enumerate network devices: {source}")]
    Enumeration {
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Renaming a single device failed.
    #[error("Failed to rename {device} to {new_name}: {message}")]
    Rename {
        /// Current interface name.
        device: String,
        /// Requested interface name.
        new_name: String,
        /// Error message.
        message: String,
    },

    /// Waiting for the device event queue to drain failed.
    #[error("Device settle failed: {message}")]
    Settle {
        /// Error message.
        message: String,
    },

    /// Filesystem access failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl ApplyError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a filesystem error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status to report when this error ends the program.
    pub fn exit_code(&self) -> u8 {
        match self {
            ApplyError::GenerationFailed { .. } => EX_CONFIG,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApplyError::configuration("the configuration could not be generated");
        assert_eq!(
            err.to_string(),
            "Configuration error: the configuration could not be generated"
        );
    }

    #[test]
    fn test_shell_command_failed() {
        let err = ApplyError::ShellCommandFailed {
            command: "ip link set dev eth0 name lan0".to_string(),
            exit_code: 2,
            output: "RTNETLINK answers: Device or resource busy".to_string(),
        };
        assert!(err.to_string().contains("ip link set dev"));
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_device_state_display() {
        let err = ApplyError::DeviceState {
            device: "eth0".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Cannot determine operstate of eth0: gone");
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(ApplyError::GenerationFailed { exit_code: 1 }.exit_code(), 78);
        assert_eq!(ApplyError::configuration("bad").exit_code(), 1);
        assert_eq!(
            ApplyError::Settle {
                message: "timeout".to_string()
            }
            .exit_code(),
            1
        );
    }
}
