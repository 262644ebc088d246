//! Exit codes for the rr-core CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and downstream errors

/// Exit codes for rr-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// Invalid arguments or missing/invalid configuration
    ConfigError = 10,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error (reading input, writing output, binding the listener)
    IoError = 21,

    /// The document could not be rendered
    RenderError = 22,

    /// The messaging API did not accept the document
    DeliveryError = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::RenderError => "ERR_RENDER",
            ExitCode::DeliveryError => "ERR_DELIVERY",
        }
    }
}
