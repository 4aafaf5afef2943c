//! Fetching artwork bytes.
//!
//! [`ArtworkLoader`] is the async seam between the batch processor and
//! wherever artwork lives. [`HttpLoader`] serves `http(s)://` URLs with
//! `reqwest` and everything else from the local filesystem, so the fixed
//! fallback image path resolves against a configurable asset directory.

use crate::error::PipelineError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("hueify/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Loads the raw bytes of an artwork image.
#[async_trait]
pub trait ArtworkLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Loads artwork over HTTP(S) or from disk.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
    asset_root: Option<PathBuf>,
}

impl HttpLoader {
    pub fn new() -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Load(e.to_string()))?;
        Ok(Self {
            client,
            asset_root: None,
        })
    }

    /// Resolves root-relative paths such as `/spotify/spotify-green.png`
    /// against `root` instead of the filesystem root.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    fn local_path(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);
        match &self.asset_root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => Path::new(path).to_path_buf(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        tracing::debug!(url = %url, "fetching artwork");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Load(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Load(format!("{url}: HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Load(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[async_trait]
impl ArtworkLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        if is_remote(url) {
            return self.fetch(url).await;
        }
        let path = self.local_path(url);
        tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::Load(format!("{}: {e}", path.display())))
    }
}
