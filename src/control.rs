//! Invocations of the vendor control executable (`beaconctl`).
//!
//! The control tool's mode and config-locator vocabulary is the vendor's
//! contract, not ours: `-m` and `-c` values pass through verbatim with no
//! validation, and any rejection comes back as the tool's own exit status.

use anyhow::{Context, Result};

use crate::command_runner::CommandRunner;
use crate::error::SetupError;
use crate::paths::AgentPaths;

/// Build the `load-config` argument list. Flags appear only when the
/// caller supplied them.
#[must_use]
pub fn load_config_args(mode: Option<&str>, locator: Option<&str>) -> Vec<String> {
    let mut args = vec!["load-config".to_string()];
    if let Some(mode) = mode {
        args.push("-m".to_string());
        args.push(mode.to_string());
    }
    if let Some(locator) = locator {
        args.push("-c".to_string());
        args.push(locator.to_string());
    }
    args
}

/// Ask the agent to load the config file just written.
///
/// # Errors
///
/// Returns [`SetupError::ControlFailed`] when `beaconctl` exits non-zero,
/// or a spawn error when the control executable is missing — the case a
/// skipped install leads to.
pub async fn apply_config(
    runner: &impl CommandRunner,
    paths: &AgentPaths,
    mode: Option<&str>,
    locator: Option<&str>,
) -> Result<()> {
    let args = load_config_args(mode, locator);
    run_control(runner, paths, "load-config", &args).await
}

/// Start the agent service.
///
/// # Errors
///
/// Same failure modes as [`apply_config`].
pub async fn start_agent(runner: &impl CommandRunner, paths: &AgentPaths) -> Result<()> {
    run_control(runner, paths, "start", &["start".to_string()]).await
}

async fn run_control(
    runner: &impl CommandRunner,
    paths: &AgentPaths,
    action: &str,
    args: &[String],
) -> Result<()> {
    let control = paths.control_bin();
    let control = control
        .to_str()
        .with_context(|| format!("non-UTF-8 control path: {}", control.display()))?;
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let out = runner
        .run(control, &arg_refs)
        .await
        .with_context(|| format!("running {control}"))?;

    if out.status.success() {
        Ok(())
    } else {
        Err(SetupError::ControlFailed {
            action: action.to_string(),
            code: out.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::load_config_args;

    #[test]
    fn test_no_flags_is_bare_load_config() {
        assert_eq!(load_config_args(None, None), vec!["load-config"]);
    }

    #[test]
    fn test_mode_and_locator_pass_through_verbatim() {
        let args = load_config_args(Some("weird mode!"), Some("://not-a-real-locator"));
        assert_eq!(
            args,
            vec!["load-config", "-m", "weird mode!", "-c", "://not-a-real-locator"]
        );
    }

    #[test]
    fn test_locator_only() {
        assert_eq!(
            load_config_args(None, Some("cms")),
            vec!["load-config", "-c", "cms"]
        );
    }

    mod proptests {
        use super::super::load_config_args;
        use proptest::prelude::*;

        proptest! {
            /// Whatever the caller typed for -m/-c reaches the control
            /// invocation byte for byte.
            #[test]
            fn prop_values_never_rewritten(
                mode in "\\PC{1,40}",
                locator in "\\PC{1,40}",
            ) {
                let args = load_config_args(Some(&mode), Some(&locator));
                prop_assert_eq!(&args[2], &mode);
                prop_assert_eq!(&args[4], &locator);
            }
        }
    }
}
