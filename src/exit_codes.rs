//! Exit code constants for the proxysweep CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing file)
//! - 2: Unsupported platform or unrecognized distribution
//! - 3: Backup failure
//! - 4: External tool failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a referenced file/archive that does not exist.
pub const USER_ERROR: i32 = 1;

/// The running platform or Linux distribution could not be classified.
pub const UNSUPPORTED: i32 = 2;

/// Backup creation, listing, or restore failure.
pub const BACKUP_FAILURE: i32 = 3;

/// External tool invocation failure that aborted the command.
pub const TOOL_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, UNSUPPORTED, BACKUP_FAILURE, TOOL_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
