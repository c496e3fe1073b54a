//! Best-effort archival of post media before retirement. Failures here
//! never block the pipeline.

use reqwest::Client;
use scour_core::{CoreError, Post};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".mp4"];

pub struct MediaArchiver {
    http: Client,
    dir: PathBuf,
}

impl MediaArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            http: Client::new(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_media_url(url: &str) -> bool {
        let lowered = url.to_lowercase();
        MEDIA_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
    }

    /// Download the post's linked media, if any. Every failure is logged
    /// and swallowed.
    pub async fn archive(&self, post: &Post) {
        let Some(raw) = post.url.as_deref() else {
            return;
        };
        if !Self::is_media_url(raw) {
            return;
        }
        if let Err(e) = self.fetch(raw).await {
            warn!(id = %post.id, url = raw, error = %e, "media fetch failed");
        }
    }

    async fn fetch(&self, raw: &str) -> Result<(), CoreError> {
        let url = Url::parse(raw).map_err(|e| CoreError::MediaFetchFailed {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        let name = media_file_name(&url).ok_or_else(|| CoreError::MediaFetchFailed {
            url: raw.to_string(),
            reason: "no file name in url path".to_string(),
        })?;
        let target = self.dir.join(name);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(CoreError::Network)?;
        let bytes = response.bytes().await.map_err(CoreError::Network)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        // Collisions overwrite silently.
        tokio::fs::write(&target, &bytes).await?;
        info!(path = %target.display(), "archived media");
        Ok(())
    }
}

/// Basename of the URL path, used as the local file name.
fn media_file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .last()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
