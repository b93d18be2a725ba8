//! Filesystem layout of the installed Beacon agent.

use std::path::{Path, PathBuf};

/// Default agent install root on Linux hosts.
pub const DEFAULT_AGENT_ROOT: &str = "/usr/local/beacon-agent";

/// Resolved agent paths. The root comes from `BEACON_HOME` when set,
/// which is also the seam the tests use to point at a temp directory.
#[derive(Debug, Clone)]
pub struct AgentPaths {
    root: PathBuf,
}

impl AgentPaths {
    /// Resolve the agent root from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let root = std::env::var("BEACON_HOME")
            .map_or_else(|_| PathBuf::from(DEFAULT_AGENT_ROOT), PathBuf::from);
        Self { root }
    }

    /// Build paths rooted at an explicit directory.
    #[must_use]
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The agent daemon executable. Its presence is the installation state.
    #[must_use]
    pub fn agent_bin(&self) -> PathBuf {
        self.root.join("bin").join("beacon-agent")
    }

    /// The vendor control executable used to load config and start the agent.
    #[must_use]
    pub fn control_bin(&self) -> PathBuf {
        self.root.join("bin").join("beaconctl")
    }

    /// Fixed metrics-collection config path. Always fully replaced, never merged.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join("etc").join("collect.json")
    }

    /// Install receipt written after a successful package install.
    #[must_use]
    pub fn receipt_file(&self) -> PathBuf {
        self.root.join("etc").join("install.json")
    }

    /// Whether the agent executable is present.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.agent_bin().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::AgentPaths;
    use tempfile::TempDir;

    #[test]
    fn test_paths_hang_off_root() {
        let p = AgentPaths::rooted_at("/opt/beacon");
        assert_eq!(p.agent_bin(), std::path::Path::new("/opt/beacon/bin/beacon-agent"));
        assert_eq!(p.control_bin(), std::path::Path::new("/opt/beacon/bin/beaconctl"));
        assert_eq!(p.config_file(), std::path::Path::new("/opt/beacon/etc/collect.json"));
        assert_eq!(p.receipt_file(), std::path::Path::new("/opt/beacon/etc/install.json"));
    }

    #[test]
    fn test_is_installed_false_for_empty_root() {
        let dir = TempDir::new().expect("tempdir");
        assert!(!AgentPaths::rooted_at(dir.path()).is_installed());
    }

    #[test]
    fn test_is_installed_true_when_agent_bin_exists() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        std::fs::create_dir_all(paths.agent_bin().parent().expect("parent")).expect("mkdir");
        std::fs::write(paths.agent_bin(), b"#!/bin/sh\n").expect("write");
        assert!(paths.is_installed());
    }
}
