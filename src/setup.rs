//! The setup flow — privilege, idempotent install, config write, control.
//!
//! State machine: NotInstalled → Installed → Configured → (Started |
//! NotStarted). The install step is idempotent: an agent executable already
//! on disk means zero download and zero package-manager activity.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::command_runner::CommandRunner;
use crate::config;
use crate::control;
use crate::download::{self, DownloadContext};
use crate::os::OsInfo;
use crate::output::OutputContext;
use crate::paths::AgentPaths;
use crate::privilege;
use crate::receipt::{self, InstallReceipt};

/// Immutable options for one setup invocation.
pub struct SetupOptions {
    /// `-m` value, passed verbatim to `beaconctl`.
    pub mode: Option<String>,
    /// `-c` value, passed verbatim to `beaconctl`.
    pub config_locator: Option<String>,
    /// `-f` override config file.
    pub override_file: Option<PathBuf>,
    /// Start the agent after configuring (`-d` turns this off).
    pub start: bool,
    /// Vendor download base URL.
    pub download_base: String,
    /// Agent package version to fetch.
    pub version: String,
}

/// What the install step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Agent executable was already present; nothing downloaded or installed.
    AlreadyInstalled,
    /// Package was downloaded and installed.
    Installed,
    /// Distribution not recognized; install skipped, later steps still ran.
    SkippedUnknownOs,
}

/// Result of a completed setup flow.
#[derive(Debug)]
pub struct SetupOutcome {
    pub install: InstallStep,
    pub started: bool,
}

/// Run the whole flow.
///
/// Option validation happens first, then the privilege check, then the
/// mutating steps — a non-root caller never gets as far as touching the
/// filesystem. The temp download directory is cleaned up on every exit
/// path by RAII.
///
/// # Errors
///
/// Propagates typed errors from each step; see [`crate::error::SetupError`].
pub async fn run_setup(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    paths: &AgentPaths,
    os: Option<&OsInfo>,
    opts: &SetupOptions,
) -> Result<SetupOutcome> {
    if let Some(file) = opts.override_file.as_deref() {
        config::check_override_readable(file)?;
    }

    privilege::require_root(runner).await?;

    let install = install_if_absent(ctx, runner, paths, os, opts).await?;

    config::write_config(paths, opts.override_file.as_deref())?;
    ctx.success(&format!("Config written to {}", paths.config_file().display()));

    control::apply_config(
        runner,
        paths,
        opts.mode.as_deref(),
        opts.config_locator.as_deref(),
    )
    .await?;
    ctx.success("Agent config loaded.");

    let started = if opts.start {
        control::start_agent(runner, paths).await?;
        ctx.success("Beacon agent started.");
        true
    } else {
        ctx.info("Auto-start disabled. Start later with: beaconctl start");
        false
    };

    Ok(SetupOutcome { install, started })
}

/// The idempotent install step.
async fn install_if_absent(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    paths: &AgentPaths,
    os: Option<&OsInfo>,
    opts: &SetupOptions,
) -> Result<InstallStep> {
    if paths.is_installed() {
        ctx.info(&format!(
            "Beacon agent already installed at {}; skipping download and install.",
            paths.agent_bin().display()
        ));
        return Ok(InstallStep::AlreadyInstalled);
    }

    let kind = os.and_then(OsInfo::package_kind);
    let Some(kind) = kind else {
        let name = os.map_or("unknown", OsInfo::display_name);
        ctx.warn(&format!(
            "Unrecognized distribution ({name}); skipping package install. \
             Configuration and start will be attempted against a missing agent."
        ));
        return Ok(InstallStep::SkippedUnknownOs);
    };

    // Temp dir is removed when this guard drops, error paths included.
    let tmp = tempfile::tempdir().context("creating temp download directory")?;

    ctx.info(&format!(
        "Downloading beacon-agent {} ({})...",
        opts.version,
        kind.extension()
    ));
    let pkg = {
        let base = opts.download_base.clone();
        let version = opts.version.clone();
        let dir = tmp.path().to_path_buf();
        let dl_ctx = DownloadContext {
            quiet: !ctx.show_progress(),
        };
        tokio::task::spawn_blocking(move || {
            download::download_package(&base, &version, kind, &dir, &dl_ctx)
        })
        .await
        .context("download task")??
    };

    if pkg.sha256.is_none() {
        ctx.warn("No checksum published for this package; installing unverified.");
    }

    crate::install::install_package(runner, kind, &pkg.path).await?;

    receipt::write(
        paths,
        &InstallReceipt {
            version: opts.version.clone(),
            sha256: pkg.sha256,
            arch: kind.arch().map(str::to_string).unwrap_or_default(),
            source: pkg.url,
            installed_at: Utc::now(),
        },
    )?;

    ctx.success(&format!("Installed beacon-agent {}.", opts.version));
    Ok(InstallStep::Installed)
}
