//! Image upload destinations.
//!
//! Each destination implements [`ImageHost`] and hides its request shape and
//! response schema behind [`UploadResult`]. The [`HostRegistry`] is populated
//! at startup from configuration and drives the destination menu.

pub mod envs;
pub mod imgbb;
pub mod imgbox;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::core::config;

/// Outcome of a single upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Success { link: Url },
    Failure { reason: String },
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success { .. })
    }
}

/// Why an adapter could not produce a link.
///
/// Never leaves the adapter: [`ImageHost::upload`] turns it into
/// [`UploadResult::Failure`].
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("source file {path:?} is not readable: {source}")]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not configured")]
    MissingCredentials(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("rejected by host: {0}")]
    Rejected(String),
}

/// Upload capability of one destination
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Short identifier used in callback payloads and commands ("imgbb")
    fn tag(&self) -> &str;

    /// Human readable name shown on buttons and in result messages
    fn display_name(&self) -> &str;

    /// Provider exchange. Implementations only return `Ok` with a link the
    /// provider actually issued.
    async fn try_upload(&self, location: &Path) -> Result<Url, UploadError>;

    /// Uploads `location`, never failing outside of the returned value.
    async fn upload(&self, location: &Path) -> UploadResult {
        match self.try_upload(location).await {
            Ok(link) => {
                log::info!("✅ {} upload succeeded: {}", self.display_name(), link);
                UploadResult::Success { link }
            }
            Err(e) => {
                log::warn!("❌ {} upload failed: {}", self.display_name(), e);
                UploadResult::Failure { reason: e.to_string() }
            }
        }
    }
}

/// Configured destinations in menu order
#[derive(Default, Clone)]
pub struct HostRegistry {
    hosts: Vec<Arc<dyn ImageHost>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from environment configuration.
    ///
    /// ImgBB is only offered when `IMGBB_API_KEY` is set. The keyless hosts
    /// are always offered.
    pub fn from_config(client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        if let Some(key) = config::hosts::IMGBB_API_KEY.clone() {
            registry.register(Arc::new(imgbb::ImgbbHost::new(client.clone(), Some(key))));
        }
        registry.register(Arc::new(envs::EnvsHost::new(client.clone())));
        registry.register(Arc::new(imgbox::ImgboxHost::new(client)));
        registry
    }

    /// Adds a host. A host with an already registered tag replaces the old one
    /// in place.
    pub fn register(&mut self, host: Arc<dyn ImageHost>) {
        match self.hosts.iter().position(|h| h.tag() == host.tag()) {
            Some(index) => self.hosts[index] = host,
            None => self.hosts.push(host),
        }
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn ImageHost>> {
        self.hosts.iter().find(|h| h.tag() == tag).cloned()
    }

    pub fn all(&self) -> &[Arc<dyn ImageHost>] {
        &self.hosts
    }

    pub fn tags(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.tag()).collect()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Shared HTTP client for all adapters
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config::network::timeout())
        .user_agent(concat!("imglinker/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Reads the asset into memory, mapping any IO error to `MissingFile`
pub(crate) async fn read_asset(location: &Path) -> Result<Vec<u8>, UploadError> {
    tokio::fs::read(location).await.map_err(|source| UploadError::MissingFile {
        path: location.to_path_buf(),
        source,
    })
}

/// File name sent in the multipart part
pub(crate) fn file_name(location: &Path) -> String {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string())
}

/// MIME type from the file extension
pub(crate) fn mime_for(location: &Path) -> &'static str {
    let ext = location
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Accepts only absolute http(s) URLs with a host
pub(crate) fn absolute_link(raw: &str) -> Result<Url, UploadError> {
    let link = Url::parse(raw.trim()).map_err(|e| UploadError::MalformedResponse(format!("{raw:?} is not a URL: {e}")))?;
    match (link.scheme(), link.host_str()) {
        ("http" | "https", Some(host)) if !host.is_empty() => Ok(link),
        _ => Err(UploadError::MalformedResponse(format!("{raw:?} is not an absolute link"))),
    }
}

/// Response body trimmed for error messages
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
