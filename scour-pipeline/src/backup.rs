//! Append-only audit log written before any remote mutation.

use chrono::{DateTime, Utc};
use scour_core::{CleanerConfig, ContentItem, CoreError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const SEPARATOR: &str =
    "--------------------------------------------------";

#[derive(Debug, Clone)]
pub struct BackupLog {
    path: PathBuf,
}

impl BackupLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record block. No-op when backups are disabled. The
    /// caller must not mutate the item if this returns an error.
    pub fn record(&self, item: &ContentItem, config: &CleanerConfig) -> Result<(), CoreError> {
        if !config.backup_enabled {
            return Ok(());
        }
        let block = render_record(item, Utc::now());
        self.append(&block).map_err(|e| CoreError::BackupWriteFailed {
            id: item.id().to_string(),
            reason: e.to_string(),
        })
    }

    fn append(&self, block: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()
    }
}

fn render_record(item: &ContentItem, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Type: {}\n", item.kind()));
    out.push_str(&format!("Timestamp: {now}\n"));
    out.push_str(&format!("Score: {}\n", item.score()));
    out.push_str(&format!("Sub: {}\n", item.subreddit()));
    match item {
        ContentItem::Post(post) => {
            out.push_str(&format!("Title: {}\n", post.title));
            if let Some(text) = &post.selftext {
                out.push_str(&format!("Content: {text}\n"));
            }
            if let Some(url) = &post.url {
                out.push_str(&format!("URL: {url}\n"));
            }
        }
        ContentItem::Comment(comment) => {
            out.push_str(&format!("Content: {}\n", comment.body));
        }
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    out
}
