//! OS detection — map `/etc/os-release` to a package kind.

use std::path::Path;

use anyhow::Result;

/// Package format the host's package manager consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Rpm,
    Deb,
}

impl PackageKind {
    /// File extension used in vendor package names.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Rpm => "rpm",
            Self::Deb => "deb",
        }
    }

    /// Architecture suffix used in vendor package names.
    ///
    /// rpm and deb ecosystems spell the same architectures differently.
    ///
    /// # Errors
    ///
    /// Returns an error if the current architecture is not `x86_64` or `aarch64`.
    pub fn arch(self) -> Result<&'static str> {
        match (self, std::env::consts::ARCH) {
            (Self::Rpm, "x86_64") => Ok("x86_64"),
            (Self::Rpm, "aarch64") => Ok("aarch64"),
            (Self::Deb, "x86_64") => Ok("amd64"),
            (Self::Deb, "aarch64") => Ok("arm64"),
            (_, other) => anyhow::bail!("unsupported architecture: {other}"),
        }
    }
}

/// Parsed identity fields from an os-release file.
#[derive(Debug, Clone, Default)]
pub struct OsInfo {
    /// `ID=` value, e.g. `"ubuntu"`.
    pub id: String,
    /// `ID_LIKE=` tokens, e.g. `["debian"]`.
    pub id_like: Vec<String>,
    /// `PRETTY_NAME=` value, for messages.
    pub pretty_name: Option<String>,
}

impl OsInfo {
    /// Map the distribution to a package kind. `None` means unrecognized.
    #[must_use]
    pub fn package_kind(&self) -> Option<PackageKind> {
        kind_for_id(&self.id).or_else(|| {
            self.id_like
                .iter()
                .find_map(|like| kind_for_id(like))
        })
    }

    /// Human-readable name for log messages.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.pretty_name.as_deref().unwrap_or(&self.id)
    }
}

fn kind_for_id(id: &str) -> Option<PackageKind> {
    match id {
        "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "amzn" | "ol" | "sles"
        | "opensuse" | "opensuse-leap" | "suse" => Some(PackageKind::Rpm),
        "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some(PackageKind::Deb),
        _ => None,
    }
}

/// Read and parse `/etc/os-release`.
///
/// An unreadable or missing file means the OS cannot be identified; callers
/// treat that the same as an unrecognized distribution.
#[must_use]
pub fn detect() -> Option<OsInfo> {
    detect_from(Path::new("/etc/os-release"))
}

/// Read and parse an os-release file at an explicit path.
#[must_use]
pub fn detect_from(path: &Path) -> Option<OsInfo> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(parse_os_release(&content))
}

/// Parse os-release `KEY=value` lines. Values may be double- or
/// single-quoted; comments and malformed lines are skipped.
#[must_use]
pub fn parse_os_release(content: &str) -> OsInfo {
    let mut info = OsInfo::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            "ID" => info.id = value.to_lowercase(),
            "ID_LIKE" => {
                info.id_like = value
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect();
            }
            "PRETTY_NAME" => info.pretty_name = Some(value),
            _ => {}
        }
    }
    info
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}
