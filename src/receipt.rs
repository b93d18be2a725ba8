//! Install receipt — what was installed, from where, and when.
//!
//! Written to `{root}/etc/install.json` after a successful package install
//! and read back by `--check`. A host without a receipt (agent installed by
//! other means, or an older setup tool) is never an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paths::AgentPaths;

/// Metadata recorded after a successful install.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstallReceipt {
    /// Package version that was installed, e.g. `"1.8.2"`.
    pub version: String,
    /// Hex SHA-256 of the package file, when the vendor published one.
    pub sha256: Option<String>,
    /// Host architecture at install time.
    pub arch: String,
    /// URL the package was fetched from.
    pub source: String,
    /// When the install completed.
    pub installed_at: DateTime<Utc>,
}

/// Write the receipt, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write(paths: &AgentPaths, receipt: &InstallReceipt) -> Result<()> {
    let path = paths.receipt_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(receipt).context("serializing install receipt")?;
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

/// Load the receipt if one exists.
///
/// # Errors
///
/// Returns an error only if the file exists but cannot be read or parsed.
pub fn load(paths: &AgentPaths) -> Result<Option<InstallReceipt>> {
    let path = paths.receipt_file();
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let receipt =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(receipt))
}

#[cfg(test)]
mod tests {
    use super::{InstallReceipt, load, write};
    use crate::paths::AgentPaths;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_receipt_is_none() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        assert!(load(&paths).expect("load").is_none());
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        let receipt = InstallReceipt {
            version: "1.8.2".to_string(),
            sha256: Some("ab".repeat(32)),
            arch: "amd64".to_string(),
            source: "https://dl.example.com/agent/1.8.2/x.deb".to_string(),
            installed_at: Utc::now(),
        };
        write(&paths, &receipt).expect("write");

        let loaded = load(&paths).expect("load").expect("receipt exists");
        assert_eq!(loaded.version, receipt.version);
        assert_eq!(loaded.sha256, receipt.sha256);
        assert_eq!(loaded.source, receipt.source);
    }

    #[test]
    fn test_corrupt_receipt_is_error() {
        let dir = TempDir::new().expect("tempdir");
        let paths = AgentPaths::rooted_at(dir.path());
        std::fs::create_dir_all(paths.receipt_file().parent().expect("parent")).expect("mkdir");
        std::fs::write(paths.receipt_file(), b"not json").expect("write");
        assert!(load(&paths).is_err());
    }
}
