use crate::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Comment,
    Post,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment => f.write_str("comment"),
            Self::Post => f.write_str("post"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,
    pub subreddit: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub body: String,
    /// Direct replies at observation time.
    pub reply_count: u32,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub subreddit: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    /// Self-text; `None` for link posts.
    pub selftext: Option<String>,
    /// Linked resource; `None` for self posts, where Reddit reports the
    /// permalink instead.
    pub url: Option<String>,
}

/// One item of the authenticated user's history. The variant decides
/// which fields exist: comments carry a reply count, posts carry a
/// title and an optional link.
#[derive(Debug, Clone)]
pub enum ContentItem {
    Comment(Comment),
    Post(Post),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Comment(_) => ContentKind::Comment,
            Self::Post(_) => ContentKind::Post,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Comment(c) => &c.id,
            Self::Post(p) => &p.id,
        }
    }

    /// Reddit thing fullname, `t1_` for comments and `t3_` for posts.
    pub fn fullname(&self) -> String {
        match self {
            Self::Comment(c) => format!("t1_{}", c.id),
            Self::Post(p) => format!("t3_{}", p.id),
        }
    }

    pub fn subreddit(&self) -> &str {
        match self {
            Self::Comment(c) => &c.subreddit,
            Self::Post(p) => &p.subreddit,
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            Self::Comment(c) => c.score,
            Self::Post(p) => p.score,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Comment(c) => c.created_at,
            Self::Post(p) => p.created_at,
        }
    }

    /// Comment body, or post self-text. `None` for link posts.
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            Self::Comment(c) => Some(&c.body),
            Self::Post(p) => p.selftext.as_deref(),
        }
    }
}

/// One listing page plus the cursor for the next one. An absent cursor
/// means the service has no further pages.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<ContentItem>,
    pub after: Option<String>,
}

/// Boundary to the remote content service: newest-first listings of the
/// authenticated user's history plus the two mutations. Neither mutation
/// is idempotent remotely; deleting an already-deleted item fails and
/// callers tolerate that per item.
#[async_trait]
pub trait UserContent: Send + Sync {
    async fn comments_page(&self, after: Option<&str>) -> Result<Page, CoreError>;
    async fn posts_page(&self, after: Option<&str>) -> Result<Page, CoreError>;
    async fn edit(&self, fullname: &str, body: &str) -> Result<(), CoreError>;
    async fn delete(&self, fullname: &str) -> Result<(), CoreError>;
}

/// Per-item result of the retirement pipeline. Feeds the batch counters
/// only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetirementOutcome {
    Retired,
    SkippedExcluded,
    SkippedNotSelected,
    FailedTransient { reason: String },
}

/// Aggregate counters for one command run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: u64,
    pub retired: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &RetirementOutcome) {
        self.processed += 1;
        match outcome {
            RetirementOutcome::Retired => self.retired += 1,
            RetirementOutcome::SkippedExcluded | RetirementOutcome::SkippedNotSelected => {
                self.skipped += 1;
            }
            RetirementOutcome::FailedTransient { .. } => self.failed += 1,
        }
    }
}
