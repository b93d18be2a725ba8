//! Effective-user privilege check.
//!
//! Installing packages and writing under `/usr/local` needs root. The check
//! shells out to `id -u` through the [`CommandRunner`] port so the setup
//! flow stays testable without actually being root.

use anyhow::{Context, Result};

use crate::command_runner::CommandRunner;
use crate::error::SetupError;

/// Fail with [`SetupError::NotRoot`] unless the effective user is root.
///
/// Runs before any filesystem mutation.
///
/// # Errors
///
/// Returns [`SetupError::NotRoot`] for a non-root caller, or an error if
/// `id -u` cannot be executed or produces unparseable output.
pub async fn require_root(runner: &impl CommandRunner) -> Result<()> {
    let out = runner
        .run("id", &["-u"])
        .await
        .context("checking effective user")?;
    anyhow::ensure!(out.status.success(), "id -u failed");

    let uid: u32 = String::from_utf8_lossy(&out.stdout)
        .trim()
        .parse()
        .context("unexpected output from id -u")?;

    if uid == 0 {
        Ok(())
    } else {
        Err(SetupError::NotRoot.into())
    }
}

#[cfg(test)]
mod tests {
    use super::require_root;
    use crate::command_runner::CommandRunner;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};
    use std::time::Duration;

    /// Test double returning a canned `id -u` result.
    struct CannedRunner {
        stdout: &'static [u8],
        code: i32,
    }

    impl CommandRunner for CannedRunner {
        async fn run(&self, _program: &str, _args: &[&str]) -> anyhow::Result<Output> {
            Ok(Output {
                status: ExitStatus::from_raw(self.code << 8),
                stdout: self.stdout.to_vec(),
                stderr: Vec::new(),
            })
        }

        async fn run_with_timeout(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Duration,
        ) -> anyhow::Result<Output> {
            self.run(program, args).await
        }
    }

    #[tokio::test]
    async fn test_uid_zero_passes() {
        let runner = CannedRunner { stdout: b"0\n", code: 0 };
        assert!(require_root(&runner).await.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_uid_is_not_root_error() {
        let runner = CannedRunner { stdout: b"1000\n", code: 0 };
        let err = require_root(&runner).await.unwrap_err();
        assert!(err.to_string().contains("must be run as root"), "got: {err}");
        assert_eq!(crate::error::exit_code(&err), 1);
    }

    #[tokio::test]
    async fn test_garbage_output_is_error() {
        let runner = CannedRunner { stdout: b"wat\n", code: 0 };
        assert!(require_root(&runner).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_id_command_is_error() {
        let runner = CannedRunner { stdout: b"", code: 1 };
        assert!(require_root(&runner).await.is_err());
    }
}
