//! Idempotent package installation via the OS package manager.

use std::path::Path;

use anyhow::{Context, Result};

use crate::command_runner::{CommandRunner, INSTALL_TIMEOUT};
use crate::error::SetupError;
use crate::os::PackageKind;

/// How many trailing stderr bytes to surface in install failures.
const STDERR_TAIL: usize = 2048;

/// Package manager invocation for a package kind.
#[must_use]
pub fn install_command(kind: PackageKind) -> (&'static str, &'static [&'static str]) {
    match kind {
        PackageKind::Rpm => ("rpm", &["-Uvh"]),
        PackageKind::Deb => ("dpkg", &["-i"]),
    }
}

/// Install a downloaded package file with `rpm`/`dpkg`.
///
/// # Errors
///
/// Returns [`SetupError::InstallFailed`] when the package manager exits
/// non-zero, or a spawn error if it is missing entirely.
pub async fn install_package(
    runner: &impl CommandRunner,
    kind: PackageKind,
    package: &Path,
) -> Result<()> {
    let (program, base_args) = install_command(kind);
    let package = package
        .to_str()
        .with_context(|| format!("non-UTF-8 package path: {}", package.display()))?;

    let mut args: Vec<&str> = base_args.to_vec();
    args.push(package);

    let out = runner
        .run_with_timeout(program, &args, INSTALL_TIMEOUT)
        .await
        .with_context(|| format!("running {program}"))?;

    if out.status.success() {
        Ok(())
    } else {
        Err(SetupError::InstallFailed {
            program: program.to_string(),
            code: out.status.code().unwrap_or(-1),
            stderr: stderr_tail(&out.stderr),
        }
        .into())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        text.to_string()
    } else {
        let cut = text.len() - STDERR_TAIL;
        // Don't split a UTF-8 char.
        let start = (cut..text.len())
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(text.len());
        format!("...{}", &text[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::{install_command, install_package, stderr_tail};
    use crate::command_runner::CommandRunner;
    use crate::os::PackageKind;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use std::process::{ExitStatus, Output};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_install_command_per_kind() {
        assert_eq!(install_command(PackageKind::Rpm).0, "rpm");
        assert_eq!(install_command(PackageKind::Deb).0, "dpkg");
    }

    #[test]
    fn test_stderr_tail_short_text_untruncated() {
        assert_eq!(stderr_tail(b"  boom \n"), "boom");
    }

    #[test]
    fn test_stderr_tail_long_text_keeps_tail() {
        let long = "x".repeat(5000);
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.starts_with("..."));
        assert!(tail.len() < 3000);
    }

    /// Records invocations and returns a fixed exit code.
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        code: i32,
        stderr: Vec<u8>,
    }

    impl RecordingRunner {
        fn new(code: i32, stderr: &[u8]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                code,
                stderr: stderr.to_vec(),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<Output> {
            self.run_with_timeout(program, args, Duration::ZERO).await
        }

        async fn run_with_timeout(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Duration,
        ) -> anyhow::Result<Output> {
            self.calls
                .lock()
                .expect("lock")
                .push((program.to_string(), args.iter().map(|s| (*s).to_string()).collect()));
            Ok(Output {
                status: ExitStatus::from_raw(self.code << 8),
                stdout: Vec::new(),
                stderr: self.stderr.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_install_deb_invokes_dpkg_i() {
        let runner = RecordingRunner::new(0, b"");
        install_package(&runner, PackageKind::Deb, Path::new("/tmp/a.deb"))
            .await
            .expect("install");
        let calls = runner.calls.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "dpkg");
        assert_eq!(calls[0].1, vec!["-i", "/tmp/a.deb"]);
    }

    #[tokio::test]
    async fn test_install_rpm_invokes_rpm_uvh() {
        let runner = RecordingRunner::new(0, b"");
        install_package(&runner, PackageKind::Rpm, Path::new("/tmp/a.rpm"))
            .await
            .expect("install");
        let calls = runner.calls.lock().expect("lock");
        assert_eq!(calls[0].0, "rpm");
        assert_eq!(calls[0].1, vec!["-Uvh", "/tmp/a.rpm"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_surfaces_stderr() {
        let runner = RecordingRunner::new(1, b"dependency problems");
        let err = install_package(&runner, PackageKind::Deb, Path::new("/tmp/a.deb"))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dependency problems"), "got: {msg}");
        assert_eq!(crate::error::exit_code(&err), 1);
    }
}
