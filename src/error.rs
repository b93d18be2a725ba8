//! Typed setup errors carrying the process exit code.
//!
//! Exit-code contract: 1 for privilege, option, file, install, and control
//! failures; 2 for anything that goes wrong acquiring the package over HTTP.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the setup flow.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("this command must be run as root (try: sudo beacon-setup)")]
    NotRoot,

    #[error("cannot read override config file {path}: {source}")]
    OverrideUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed: {0}")]
    Download(String),

    #[error("package SHA256 mismatch\n  Expected: {expected}\n  Actual:   {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("package install failed ({program} exited with {code}):\n{stderr}")]
    InstallFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("beaconctl {action} failed (exit {code}):\n{stderr}")]
    ControlFailed {
        action: String,
        code: i32,
        stderr: String,
    },
}

impl SetupError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Download(_) | Self::ChecksumMismatch { .. } => 2,
            _ => 1,
        }
    }
}

/// Map an error chain to a process exit code.
///
/// Anything that is not a [`SetupError`] (spawn failures, I/O errors,
/// context-wrapped anyhow errors) exits 1.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<SetupError>()
        .map_or(1, SetupError::exit_code)
}
