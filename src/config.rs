//! Metrics-collection config document.
//!
//! The schema (`agent` + `metrics` top-level keys) is an external contract
//! with the Beacon agent. The file at [`AgentPaths::config_file`] is always
//! fully replaced: either the fixed default document, or the `-f` override
//! file's bytes verbatim. Never merged.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::paths::AgentPaths;

/// Top-level config document consumed by the agent.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Daemon settings.
    pub agent: AgentSection,
    /// Collectors to run.
    pub metrics: Vec<MetricSpec>,
}

/// Daemon settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentSection {
    /// Ingest endpoint the agent reports to.
    pub endpoint: String,
    /// Collection interval in seconds.
    pub interval_secs: u64,
    /// Agent log level.
    pub log_level: String,
}

/// A single metrics collector.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub enabled: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let metric = |name: &str| MetricSpec {
            name: name.to_string(),
            enabled: true,
        };
        Self {
            agent: AgentSection {
                endpoint: "https://ingest.beacon-monitor.io/v1/metrics".to_string(),
                interval_secs: 15,
                log_level: "info".to_string(),
            },
            metrics: vec![
                metric("cpu"),
                metric("memory"),
                metric("disk"),
                metric("network"),
                metric("load"),
            ],
        }
    }
}

/// Render the default document as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_default() -> Result<String> {
    let mut doc =
        serde_json::to_string_pretty(&AgentConfig::default()).context("serializing config")?;
    doc.push('\n');
    Ok(doc)
}

/// Write the config file, unconditionally replacing any prior content.
///
/// With `override_file`, the file's bytes land on disk verbatim — no
/// parsing, no merging. Content validation belongs to the agent.
///
/// # Errors
///
/// Returns [`SetupError::OverrideUnreadable`] if the override file cannot
/// be read, or an error if the destination cannot be written.
pub fn write_config(paths: &AgentPaths, override_file: Option<&Path>) -> Result<()> {
    let content = match override_file {
        Some(path) => std::fs::read(path).map_err(|source| SetupError::OverrideUnreadable {
            path: path.to_path_buf(),
            source,
        })?,
        None => render_default()?.into_bytes(),
    };

    let dest = paths.config_file();
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(&dest, content).with_context(|| format!("cannot write {}", dest.display()))
}

/// Validate that the override file is readable, without writing anything.
///
/// Option validation happens once, up front, before the privilege check —
/// a bad `-f` should fail the same way for root and non-root callers.
///
/// # Errors
///
/// Returns [`SetupError::OverrideUnreadable`] if the file cannot be opened.
pub fn check_override_readable(path: &Path) -> Result<()> {
    std::fs::File::open(path)
        .map(drop)
        .map_err(|source| SetupError::OverrideUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
