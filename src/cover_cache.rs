//! Deduplicated on-disk cover cache keyed by remote URL.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::http_fetch::HttpFetcher;

const DEFAULT_EXTENSION: &str = ".jpg";

/// Fetches raw cover bytes from a remote origin.
pub trait ImageFetch: Send + Sync {
    fn fetch_bytes(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>, String>;
}

impl ImageFetch for HttpFetcher {
    fn fetch_bytes(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>, String> {
        self.get_bytes(url, referer)
    }
}

/// Storage capability behind the cache: existence probe, atomic write, and
/// key-to-path resolution.
pub trait CoverStore: Send + Sync {
    fn exists(&self, file_name: &str) -> bool;
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, String>;
    fn resolve(&self, file_name: &str) -> PathBuf;
}

/// Disk-backed store rooted at one cache directory, created on demand.
pub struct DiskCoverStore {
    root: PathBuf,
}

impl DiskCoverStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl CoverStore for DiskCoverStore {
    fn exists(&self, file_name: &str) -> bool {
        self.root.join(file_name).exists()
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, String> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)
                .map_err(|error| format!("Failed to create {}: {error}", self.root.display()))?;
        }
        let target_path = self.root.join(file_name);
        let temp_path = self.root.join(format!("{file_name}.tmp"));
        fs::write(&temp_path, bytes)
            .map_err(|error| format!("Failed to write {}: {error}", temp_path.display()))?;
        if let Err(error) = fs::rename(&temp_path, &target_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(format!(
                "Failed to publish {}: {error}",
                target_path.display()
            ));
        }
        Ok(target_path)
    }

    fn resolve(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

/// Capability the resolver uses to turn remote cover URLs into local files.
pub trait CoverMaterializer: Send + Sync {
    fn materialize(&self, remote_url: &str, label: &str, force: bool) -> Option<PathBuf>;
}

/// Maps remote cover URLs to stable local files, downloading on first use.
///
/// Racing writers for the same URL are tolerated: each publishes a complete
/// file via temp-file + rename, last writer wins.
pub struct CoverCache {
    fetch: Box<dyn ImageFetch>,
    store: Box<dyn CoverStore>,
}

impl CoverCache {
    pub fn new(fetch: Box<dyn ImageFetch>, store: Box<dyn CoverStore>) -> Self {
        Self { fetch, store }
    }

    pub fn on_disk(root: PathBuf) -> Self {
        Self::new(
            Box::new(HttpFetcher::new()),
            Box::new(DiskCoverStore::new(root)),
        )
    }
}

impl CoverMaterializer for CoverCache {
    /// Returns the local file for a remote cover URL, downloading it when the
    /// cache has no copy yet. `force` re-fetches and overwrites an existing
    /// copy. Every failure degrades to `None`.
    fn materialize(&self, remote_url: &str, label: &str, force: bool) -> Option<PathBuf> {
        let file_name = cache_file_name(remote_url);
        if !force && self.store.exists(&file_name) {
            debug!("Covers[{label}]: reusing cached {file_name}");
            return Some(self.store.resolve(&file_name));
        }

        let referer = url_origin(remote_url);
        let bytes = match self.fetch.fetch_bytes(remote_url, referer.as_deref()) {
            Ok(bytes) => bytes,
            Err(reason) => {
                warn!("Covers[{label}]: download failed for '{remote_url}': {reason}");
                return None;
            }
        };
        if bytes.is_empty() {
            warn!("Covers[{label}]: empty response for '{remote_url}'");
            return None;
        }

        match self.store.write(&file_name, &bytes) {
            Ok(path) => {
                info!("Covers[{label}]: stored {} ({} bytes)", path.display(), bytes.len());
                Some(path)
            }
            Err(reason) => {
                warn!("Covers[{label}]: {reason}");
                None
            }
        }
    }
}

/// Cache file name for a URL: md5 hex of the URL string plus the URL's file
/// extension, `.jpg` when it has none.
pub fn cache_file_name(url: &str) -> String {
    format!("{:x}{}", md5::compute(url.as_bytes()), url_extension(url))
}

fn url_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or("");
    match segment.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty()
                && !extension.is_empty()
                && extension.len() <= 5
                && extension.chars().all(|ch| ch.is_ascii_alphanumeric()) =>
        {
            format!(".{}", extension.to_ascii_lowercase())
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Scheme and host of a URL, sent as `Referer` on cover downloads since some
/// hosts reject hot-linked requests without one.
fn url_origin(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}/"))
}
