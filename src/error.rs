//! Error types for the proxysweep CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Detection and cleaning never surface these to the caller — they fold every
//! failure into a Finding/Outcome value — so this enum covers the command
//! layer: bad arguments, unusable platforms, and backup plumbing.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for proxysweep operations.
///
/// Each variant maps to a specific process exit code.
#[derive(Error, Debug)]
pub enum SweepError {
    /// User provided invalid arguments or referenced something that does not exist.
    #[error("{0}")]
    UserError(String),

    /// The running platform or distribution could not be classified.
    #[error("unsupported environment: {0}")]
    Unsupported(String),

    /// A backup archive could not be created, listed, or restored.
    #[error("backup operation failed: {0}")]
    BackupError(String),

    /// An external tool invocation failed in a way the command cannot recover from.
    #[error("external tool failed: {0}")]
    ToolError(String),
}

impl SweepError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SweepError::UserError(_) => exit_codes::USER_ERROR,
            SweepError::Unsupported(_) => exit_codes::UNSUPPORTED,
            SweepError::BackupError(_) => exit_codes::BACKUP_FAILURE,
            SweepError::ToolError(_) => exit_codes::TOOL_FAILURE,
        }
    }
}

/// Result type alias for proxysweep operations.
pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = SweepError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn unsupported_has_correct_exit_code() {
        let err = SweepError::Unsupported("BeOS".to_string());
        assert_eq!(err.exit_code(), exit_codes::UNSUPPORTED);
    }

    #[test]
    fn backup_error_has_correct_exit_code() {
        let err = SweepError::BackupError("disk full".to_string());
        assert_eq!(err.exit_code(), exit_codes::BACKUP_FAILURE);
    }

    #[test]
    fn tool_error_has_correct_exit_code() {
        let err = SweepError::ToolError("snap timed out".to_string());
        assert_eq!(err.exit_code(), exit_codes::TOOL_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = SweepError::Unsupported("could not read /etc/os-release".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported environment: could not read /etc/os-release"
        );

        let err = SweepError::BackupError("archive truncated".to_string());
        assert_eq!(err.to_string(), "backup operation failed: archive truncated");
    }
}
