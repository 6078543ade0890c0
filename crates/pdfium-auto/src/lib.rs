//! # pdfium-auto
//!
//! Find a usable PDFium shared library for `pdfium-render`, downloading it
//! once into a per-user cache when nothing is installed.
//!
//! Resolution order used by [`locate`]:
//!
//! 1. an explicit path handed in by the caller (e.g. a `--pdfium-lib` flag);
//! 2. the `PDFIUM_LIB_PATH` environment variable;
//! 3. the cache directory (see [`pdfium_cache_dir`]);
//! 4. a fresh download from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries).
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium_from_path, locate};
//!
//! let path = locate(None, None).expect("PDFium unavailable");
//! let pdfium = bind_pdfium_from_path(&path).expect("bind failed");
//! # drop(pdfium);
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{info, warn};

/// pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Name of the per-user cache folder.
const CACHE_APP_DIR: &str = "pdfdesk";

/// Progress hook: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Where a platform's library lives inside the release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Asset {
    archive: &'static str,
    member: &'static str,
    file_name: &'static str,
}

const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

fn asset_for(os: &str, arch: &str) -> Result<Asset, PdfiumAutoError> {
    let (archive, (member, file_name)) = match (os, arch) {
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", SO),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", SO),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", DYLIB),
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", DYLIB),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", DLL),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", DLL),
        ("windows", "x86") => ("pdfium-win-x86.tgz", DLL),
        (os, arch) => {
            return Err(PdfiumAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(Asset {
        archive,
        member,
        file_name,
    })
}

fn current_asset() -> Result<Asset, PdfiumAutoError> {
    asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Per-version cache directory, e.g. `~/.cache/pdfdesk/pdfium-7690/`.
///
/// `PDFIUM_AUTO_CACHE_DIR` replaces the platform cache root.
pub fn pdfium_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(root) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(root).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_APP_DIR)
        .join(versioned)
}

/// Returns an existing library without touching the network.
pub fn find_existing(explicit: Option<&Path>) -> Option<PathBuf> {
    let candidates = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from))
        .chain(current_asset().ok().map(|a| pdfium_cache_dir().join(a.file_name)));

    candidates.into_iter().find(|p| p.is_file())
}

static LOCATED: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path of a PDFium library, downloading it on first use.
///
/// Safe to call concurrently; the resolved path is memoised for the life of
/// the process.
pub fn locate(
    explicit: Option<&Path>,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = LOCATED.get() {
        return Ok(path.clone());
    }

    if let Some(p) = explicit {
        if !p.is_file() {
            warn!("PDFium library '{}' not found, falling back", p.display());
        }
    }

    let path = match find_existing(explicit) {
        Some(p) => p,
        None => download_into_cache(on_progress)?,
    };

    let _ = LOCATED.set(path.clone());
    Ok(path)
}

/// Binds `pdfium-render` to the library at `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download_into_cache(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    let asset = current_asset()?;
    let dir = pdfium_cache_dir();
    let dest = dir.join(asset.file_name);

    std::fs::create_dir_all(&dir).map_err(PdfiumAutoError::CacheDir)?;

    let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive);
    info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);

    let archive = fetch(&url, on_progress)?;
    unpack_member(&archive, asset.member, &dest)?;

    info!("PDFium cached at {}", dest.display());
    Ok(dest)
}

fn fetch(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                body.extend_from_slice(&buf[..n]);
                if let Some(cb) = on_progress {
                    cb(body.len() as u64, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(body)
}

/// Extracts one member of a `.tgz` archive to `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());

    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    for entry in tar.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let matches = entry.path().map_err(extract_err)?.to_string_lossy() == member;
        if matches {
            entry.unpack(dest).map_err(extract_err)?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_resolve() {
        let linux = asset_for("linux", "x86_64").unwrap();
        assert_eq!(linux.file_name, "libpdfium.so");
        assert_eq!(linux.member, "lib/libpdfium.so");

        let mac = asset_for("macos", "aarch64").unwrap();
        assert_eq!(mac.archive, "pdfium-mac-arm64.tgz");

        let win = asset_for("windows", "x86").unwrap();
        assert_eq!(win.member, "bin/pdfium.dll");
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let err = asset_for("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"));
    }

    #[test]
    fn cache_dir_is_versioned() {
        let d = pdfium_cache_dir();
        assert!(d.to_string_lossy().contains(PDFIUM_VERSION));
    }

    #[test]
    fn explicit_existing_file_wins() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let found = find_existing(Some(tmp.path()));
        assert_eq!(found.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn unpack_reports_missing_member() {
        let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
            Vec::new(),
            flate2::Compression::fast(),
        ));
        let data = b"not a library";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, "lib/other.so", &data[..])
            .unwrap();
        let gz = builder.into_inner().unwrap().finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = unpack_member(&gz, "lib/libpdfium.so", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
