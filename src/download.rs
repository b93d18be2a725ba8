//! Vendor package download — HTTP with resume and checksum verification.
//!
//! Packages come from a fixed vendor URL template. Downloads go to
//! `{dest}.partial` and are renamed into place on success; an interrupted
//! download resumes with an HTTP `Range` request. When the vendor publishes
//! a `.sha256` sidecar next to the package, the download is verified
//! against it; vendors that don't publish one get a warning instead.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::error::SetupError;
use crate::os::PackageKind;

/// Vendor download base URL. `BEACON_DOWNLOAD_BASE` overrides.
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://dl.beacon-monitor.io/agent";

/// Pinned agent package version. `BEACON_AGENT_VERSION` overrides.
pub const DEFAULT_AGENT_VERSION: &str = "1.8.2";

/// Context for download progress display.
pub struct DownloadContext {
    /// Whether to suppress progress output.
    pub quiet: bool,
}

/// A package acquired from the vendor.
#[derive(Debug)]
pub struct DownloadedPackage {
    /// Local path of the downloaded package file.
    pub path: PathBuf,
    /// Hex SHA-256 when a vendor sidecar was available to verify against.
    pub sha256: Option<String>,
    /// URL the package was fetched from.
    pub url: String,
}

/// Package filename per the vendor naming scheme,
/// e.g. `beacon-agent-1.8.2-amd64.deb`.
///
/// # Errors
///
/// Returns an error for an unsupported host architecture.
pub fn package_filename(version: &str, kind: PackageKind) -> Result<String> {
    let arch = kind
        .arch()
        .map_err(|e| SetupError::Download(e.to_string()))?;
    Ok(format!(
        "beacon-agent-{version}-{arch}.{}",
        kind.extension()
    ))
}

/// Full download URL: `{base}/{version}/{filename}`.
///
/// # Errors
///
/// Returns an error for an unsupported host architecture.
pub fn package_url(base: &str, version: &str, kind: PackageKind) -> Result<String> {
    let name = package_filename(version, kind)?;
    Ok(format!("{}/{version}/{name}", base.trim_end_matches('/')))
}

/// Download the agent package into `dest_dir` and verify it when possible.
///
/// # Errors
///
/// Returns [`SetupError::Download`] (exit code 2) if the fetch fails and
/// [`SetupError::ChecksumMismatch`] if a published sidecar disagrees with
/// the downloaded bytes.
pub fn download_package(
    base: &str,
    version: &str,
    kind: PackageKind,
    dest_dir: &Path,
    ctx: &DownloadContext,
) -> Result<DownloadedPackage> {
    let url = package_url(base, version, kind)?;
    let dest = dest_dir.join(package_filename(version, kind)?);

    download_with_resume(&url, &dest, ctx)?;

    let sha256 = match fetch_published_checksum(&url)? {
        Some(expected) => {
            let actual = sha256_file(&dest)?;
            if actual != expected {
                return Err(SetupError::ChecksumMismatch { expected, actual }.into());
            }
            Some(actual)
        }
        None => None,
    };

    Ok(DownloadedPackage { path: dest, sha256, url })
}

// ── HTTP transfer ─────────────────────────────────────────────────────────────

/// Download `url` to `dest` with HTTP Range resume support.
///
/// Writes to `{dest}.partial` during download, renames to `dest` on success.
/// Resumes an interrupted download if a `.partial` file already exists.
///
/// # Errors
///
/// Returns [`SetupError::Download`] if the HTTP request fails, and an I/O
/// error if the file cannot be written.
pub fn download_with_resume(url: &str, dest: &Path, ctx: &DownloadContext) -> Result<()> {
    let partial = partial_path(dest);
    let existing = partial.metadata().map(|m| m.len()).unwrap_or(0);
    do_download(url, dest, &partial, existing, ctx, true)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".partial");
    PathBuf::from(s)
}

fn do_download(
    url: &str,
    dest: &Path,
    partial: &Path,
    existing: u64,
    ctx: &DownloadContext,
    allow_retry: bool,
) -> Result<()> {
    let req = ureq::get(url);
    let req = if existing > 0 {
        req.set("Range", &format!("bytes={existing}-"))
    } else {
        req
    };

    let response = match req.call() {
        Ok(r) => r,
        Err(ureq::Error::Status(416, _)) if allow_retry => {
            std::fs::remove_file(partial).ok();
            return do_download(url, dest, partial, 0, ctx, false);
        }
        Err(ureq::Error::Status(code, _)) => {
            return Err(SetupError::Download(format!("HTTP {code} fetching {url}")).into());
        }
        Err(e) => {
            return Err(SetupError::Download(format!("{e} fetching {url}")).into());
        }
    };

    let status = response.status();
    let (mut file, start_pos) = if status == 206 {
        let f = OpenOptions::new()
            .append(true)
            .create(true)
            .open(partial)
            .context("opening partial file")?;
        (f, existing)
    } else if status == 200 {
        let f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(partial)
            .context("opening partial file")?;
        (f, 0_u64)
    } else {
        return Err(SetupError::Download(format!("HTTP {status} fetching {url}")).into());
    };

    let total = parse_content_length(&response, start_pos);

    // Stale partial: existing bytes >= total → restart fresh.
    if start_pos > 0
        && let Some(t) = total
        && start_pos >= t
    {
        drop(file);
        std::fs::remove_file(partial).ok();
        return do_download(url, dest, partial, 0, ctx, false);
    }

    let pb = if ctx.quiet {
        indicatif::ProgressBar::hidden()
    } else if let Some(t) = total {
        let pb = indicatif::ProgressBar::new(t);
        pb.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("[{bar:40}] {percent}% ({bytes}/{total_bytes})")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb.set_position(start_pos);
        pb
    } else {
        indicatif::ProgressBar::new_spinner()
    };

    let mut reader = response.into_reader();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                return Err(SetupError::Download(format!("interrupted: {e}")).into());
            }
        };
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).context("writing package file")?;
        pb.inc(n as u64);
    }

    pb.finish_and_clear();
    drop(file);

    std::fs::rename(partial, dest).context("failed to finalize downloaded package")?;
    Ok(())
}

/// Parse total content length from response headers.
///
/// For 206 Partial Content, returns `existing_bytes + Content-Length`.
/// For 200 OK, returns `Content-Length`.
fn parse_content_length(response: &ureq::Response, existing_bytes: u64) -> Option<u64> {
    let len = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())?;
    if response.status() == 206 {
        Some(existing_bytes + len)
    } else {
        Some(len)
    }
}

// ── Checksum verification ─────────────────────────────────────────────────────

/// Fetch the vendor's `.sha256` sidecar for a package URL.
///
/// Returns `None` on HTTP 404 — not every release publishes one.
///
/// # Errors
///
/// Returns [`SetupError::Download`] on any other HTTP failure or a
/// malformed sidecar body.
pub fn fetch_published_checksum(package_url: &str) -> Result<Option<String>> {
    let url = format!("{package_url}.sha256");
    let response = match ureq::get(&url).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(404, _)) => return Ok(None),
        Err(ureq::Error::Status(code, _)) => {
            return Err(SetupError::Download(format!("HTTP {code} fetching {url}")).into());
        }
        Err(e) => {
            return Err(SetupError::Download(format!("{e} fetching {url}")).into());
        }
    };

    let body = response
        .into_string()
        .map_err(|e| SetupError::Download(format!("reading checksum body: {e}")))?;
    let hex = body
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(
            SetupError::Download("malformed checksum file: expected 64-hex SHA-256".into()).into(),
        );
    }
    Ok(Some(hex))
}

/// Compute the hex SHA-256 of a file, reading in 64 KiB chunks.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading package file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}
