//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::check;
use crate::command_runner::TokioCommandRunner;
use crate::download;
use crate::os;
use crate::output::OutputContext;
use crate::paths::AgentPaths;
use crate::setup::{self, InstallStep, SetupOptions};

/// Install and configure the Beacon monitoring agent
#[derive(Parser)]
#[command(name = "beacon-setup", version)]
pub struct Cli {
    /// Do not start the agent after configuration
    #[arg(short = 'd', long = "no-start")]
    pub no_start: bool,

    /// Run mode, passed verbatim to beaconctl
    #[arg(short = 'm', long = "mode", value_name = "MODE")]
    pub mode: Option<String>,

    /// Config locator, passed verbatim to beaconctl
    #[arg(short = 'c', long = "config", value_name = "LOCATOR")]
    pub config: Option<String>,

    /// Write this file as the agent config instead of the built-in default
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Report what setup would do, without changing anything
    #[arg(long)]
    pub check: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Execute the setup flow (or the `--check` report).
    ///
    /// # Errors
    ///
    /// Returns an error when any step of the flow fails; `main` maps it to
    /// the exit-code contract.
    pub async fn run(self) -> Result<()> {
        let ctx = OutputContext::new(self.no_color, self.quiet);
        let paths = AgentPaths::from_env();
        let os = os::detect();

        if self.check {
            return check::run(&ctx, &paths, os.as_ref());
        }

        let runner = TokioCommandRunner::default();
        let opts = SetupOptions {
            mode: self.mode,
            config_locator: self.config,
            override_file: self.file,
            start: !self.no_start,
            download_base: std::env::var("BEACON_DOWNLOAD_BASE")
                .unwrap_or_else(|_| download::DEFAULT_DOWNLOAD_BASE.to_string()),
            version: std::env::var("BEACON_AGENT_VERSION")
                .unwrap_or_else(|_| download::DEFAULT_AGENT_VERSION.to_string()),
        };

        let outcome = setup::run_setup(&ctx, &runner, &paths, os.as_ref(), &opts).await?;

        if !ctx.quiet {
            println!();
        }
        match outcome.install {
            InstallStep::AlreadyInstalled | InstallStep::Installed => {
                ctx.success("Beacon agent setup complete.");
            }
            InstallStep::SkippedUnknownOs => {
                ctx.warn("Setup finished, but no package was installed on this host.");
            }
        }
        ctx.kv("Status ", "beacon-setup --check");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_defaults_start_enabled_no_mode() {
        let cli = Cli::try_parse_from(["beacon-setup"]).expect("parse");
        assert!(!cli.no_start);
        assert!(cli.mode.is_none());
        assert!(cli.config.is_none());
        assert!(cli.file.is_none());
        assert!(!cli.check);
    }

    #[test]
    fn test_short_flags_parse() {
        let cli = Cli::try_parse_from([
            "beacon-setup", "-d", "-m", "daemon", "-c", "fleet://eu-1", "-f", "/tmp/c.json",
        ])
        .expect("parse");
        assert!(cli.no_start);
        assert_eq!(cli.mode.as_deref(), Some("daemon"));
        assert_eq!(cli.config.as_deref(), Some("fleet://eu-1"));
        assert_eq!(cli.file.as_deref(), Some(std::path::Path::new("/tmp/c.json")));
    }

    #[test]
    fn test_unknown_flag_is_parse_error() {
        assert!(Cli::try_parse_from(["beacon-setup", "--bogus"]).is_err());
    }

    #[test]
    fn test_mode_without_value_is_parse_error() {
        assert!(Cli::try_parse_from(["beacon-setup", "-m"]).is_err());
    }
}
