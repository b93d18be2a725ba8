//! `--check` — dry-run report of host and install state.
//!
//! Reads only; never mutates and never requires root.

use anyhow::Result;
use owo_colors::OwoColorize as _;

use crate::os::OsInfo;
use crate::output::OutputContext;
use crate::paths::AgentPaths;
use crate::receipt::{self, InstallReceipt};

/// Collected check results.
#[derive(Debug)]
pub struct CheckReport {
    /// Agent executable present at its known path.
    pub installed: bool,
    /// Human-readable distribution name, when identified.
    pub distribution: Option<String>,
    /// Whether the distribution maps to a supported package kind.
    pub os_supported: bool,
    /// Fixed config file present.
    pub config_present: bool,
    /// Install receipt, when one exists and parses.
    pub receipt: Option<InstallReceipt>,
}

/// Gather the report. A corrupt receipt reads as absent here — `--check`
/// diagnoses, it does not fail.
#[must_use]
pub fn collect(paths: &AgentPaths, os: Option<&OsInfo>) -> CheckReport {
    CheckReport {
        installed: paths.is_installed(),
        distribution: os.map(|o| o.display_name().to_string()),
        os_supported: os.and_then(OsInfo::package_kind).is_some(),
        config_present: paths.config_file().exists(),
        receipt: receipt::load(paths).ok().flatten(),
    }
}

/// Run `beacon-setup --check`.
///
/// # Errors
///
/// Never fails in practice; the signature matches the other entry points.
pub fn run(ctx: &OutputContext, paths: &AgentPaths, os: Option<&OsInfo>) -> Result<()> {
    let report = collect(paths, os);

    println!();
    ctx.header("Beacon Setup Check");
    println!();

    print_check(
        ctx,
        report.installed,
        &format!("Agent installed at {}", paths.agent_bin().display()),
    );
    match &report.distribution {
        Some(name) if report.os_supported => {
            print_check(ctx, true, &format!("Distribution supported: {name}"));
        }
        Some(name) => {
            print_check(
                ctx,
                false,
                &format!("Distribution not recognized: {name} (install would be skipped)"),
            );
        }
        None => print_check(ctx, false, "Cannot read /etc/os-release"),
    }
    print_check(
        ctx,
        report.config_present,
        &format!("Config present at {}", paths.config_file().display()),
    );
    if let Some(r) = &report.receipt {
        let sha = r
            .sha256
            .as_deref()
            .map(|s| format!(" (SHA256: {}...)", &s[..s.len().min(12)]))
            .unwrap_or_default();
        print_check(
            ctx,
            true,
            &format!("Install receipt: {} {}{sha}", r.version, r.arch),
        );
    }

    println!();
    if report.installed {
        ctx.info("Running setup again would skip download and install.");
    } else if report.os_supported {
        ctx.info("Running setup would download and install the agent package.");
    } else {
        ctx.warn("Running setup would skip the install step entirely.");
    }
    println!();

    Ok(())
}

fn print_check(ctx: &OutputContext, ok: bool, msg: &str) {
    if ok {
        println!("    {} {msg}", "✓".style(ctx.styles.success));
    } else {
        println!("    {} {msg}", "✗".style(ctx.styles.error));
    }
}

#[cfg(test)]
mod tests {
    use super::collect;
    use crate::os::parse_os_release;
    use crate::paths::AgentPaths;
    use tempfile::TempDir;

    #[test]
    fn test_collect_empty_root() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        let report = collect(&paths, None);
        assert!(!report.installed);
        assert!(!report.config_present);
        assert!(report.receipt.is_none());
        assert!(!report.os_supported);
    }

    #[test]
    fn test_collect_sees_installed_agent_and_config() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        std::fs::create_dir_all(paths.agent_bin().parent().expect("parent")).expect("mkdir");
        std::fs::write(paths.agent_bin(), b"x").expect("write");
        std::fs::create_dir_all(paths.config_file().parent().expect("parent")).expect("mkdir");
        std::fs::write(paths.config_file(), b"{}").expect("write");

        let ubuntu = parse_os_release("ID=ubuntu\n");
        let report = collect(&paths, Some(&ubuntu));
        assert!(report.installed);
        assert!(report.config_present);
        assert!(report.os_supported);
    }

    #[test]
    fn test_collect_tolerates_corrupt_receipt() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        std::fs::create_dir_all(paths.receipt_file().parent().expect("parent")).expect("mkdir");
        std::fs::write(paths.receipt_file(), b"not json").expect("write");
        assert!(collect(&paths, None).receipt.is_none());
    }
}
