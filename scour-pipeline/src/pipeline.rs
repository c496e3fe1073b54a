//! The command state machine: Counting → Processing → Summarizing.

use crate::backup::BackupLog;
use crate::executor::{Retirer, Throttle, TokioThrottle};
use crate::filter::{is_excluded, Selection};
use crate::media::MediaArchiver;
use crate::source::ContentStream;
use chrono::Utc;
use scour_core::{
    BatchSummary, CleanerConfig, ContentItem, ContentKind, CoreError, RetirementOutcome,
    UserContent,
};
use tracing::{debug, info, warn};

/// Orchestrates one retirement command at a time over the remote
/// account: a counting traversal for the progress total, then a
/// processing traversal applying exclusion, selection, backup, media
/// archival, and the executor per item.
pub struct Cleaner<S: UserContent> {
    api: S,
    config: CleanerConfig,
    backup: BackupLog,
    media: MediaArchiver,
    throttle: Box<dyn Throttle>,
}

impl<S: UserContent> Cleaner<S> {
    pub fn new(api: S, config: CleanerConfig, backup: BackupLog, media: MediaArchiver) -> Self {
        Self {
            api,
            config,
            backup,
            media,
            throttle: Box::new(TokioThrottle),
        }
    }

    /// Replace the pause implementation; tests record pauses instead of
    /// sleeping through them.
    pub fn with_throttle(mut self, throttle: Box<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// The dry-run toggle flips here between commands, never during a
    /// traversal.
    pub fn config_mut(&mut self) -> &mut CleanerConfig {
        &mut self.config
    }

    pub async fn remove_old_comments(&self, days: i64) -> Result<BatchSummary, CoreError> {
        let days = non_negative(days, "days")?;
        self.run(&[ContentKind::Comment], Selection::OlderThan { days })
            .await
    }

    pub async fn remove_negative_karma(&self) -> Result<BatchSummary, CoreError> {
        self.run(&[ContentKind::Comment], Selection::NegativeScore)
            .await
    }

    pub async fn remove_low_engagement(&self) -> Result<BatchSummary, CoreError> {
        self.run(&[ContentKind::Comment], Selection::LowEngagement)
            .await
    }

    pub async fn remove_all_posts(&self) -> Result<BatchSummary, CoreError> {
        self.run(&[ContentKind::Post], Selection::AllPosts).await
    }

    pub async fn remove_old_posts(&self, days: i64) -> Result<BatchSummary, CoreError> {
        let days = non_negative(days, "days")?;
        self.run(&[ContentKind::Post], Selection::OlderThan { days })
            .await
    }

    pub async fn remove_low_karma_posts(&self, threshold: i64) -> Result<BatchSummary, CoreError> {
        self.run(&[ContentKind::Post], Selection::ScoreBelow { threshold })
            .await
    }

    pub async fn remove_by_subreddit(&self, name: &str) -> Result<BatchSummary, CoreError> {
        let name = non_empty(name, "subreddit")?;
        self.run(
            &[ContentKind::Comment, ContentKind::Post],
            Selection::InSubreddit { name },
        )
        .await
    }

    pub async fn remove_by_keyword(&self, keyword: &str) -> Result<BatchSummary, CoreError> {
        let keyword = non_empty(keyword, "keyword")?;
        self.run(
            &[ContentKind::Comment, ContentKind::Post],
            Selection::ContainsKeyword { keyword },
        )
        .await
    }

    async fn run(
        &self,
        kinds: &[ContentKind],
        selection: Selection,
    ) -> Result<BatchSummary, CoreError> {
        self.config.validate()?;

        // Counting pass: a full traversal purely for the progress total.
        // The remote set can drift before the processing pass runs, so
        // the total is an estimate.
        let mut total: u64 = 0;
        for kind in kinds {
            total += self.count(*kind).await?;
        }
        info!(total, rule = ?selection, dry_run = self.config.dry_run, "counted items");

        // Processing pass: an independent traversal from the top.
        let mut progress = Progress::new(total);
        let mut summary = BatchSummary::default();
        let retirer = Retirer::new(&self.api, self.throttle.as_ref());
        for kind in kinds {
            let mut stream = ContentStream::new(&self.api, *kind, self.config.on_page_error);
            while let Some(item) = stream.next().await? {
                let outcome = self.process_item(&retirer, &selection, &item).await;
                summary.record(&outcome);
                progress.advance();
            }
        }

        info!(
            processed = summary.processed,
            retired = summary.retired,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch complete"
        );
        Ok(summary)
    }

    async fn count(&self, kind: ContentKind) -> Result<u64, CoreError> {
        let mut stream = ContentStream::new(&self.api, kind, self.config.on_page_error);
        let mut count = 0;
        while stream.next().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn process_item(
        &self,
        retirer: &Retirer<'_>,
        selection: &Selection,
        item: &ContentItem,
    ) -> RetirementOutcome {
        if is_excluded(item, &self.config) {
            debug!(id = item.id(), sub = item.subreddit(), "excluded by policy");
            return RetirementOutcome::SkippedExcluded;
        }
        if !selection.selects(item, Utc::now()) {
            return RetirementOutcome::SkippedNotSelected;
        }

        // The audit record must land before any mutation. A failed
        // append leaves the item untouched.
        if let Err(e) = self.backup.record(item, &self.config) {
            warn!(
                id = item.id(),
                sub = item.subreddit(),
                error = %e,
                "backup failed, leaving item untouched"
            );
            return RetirementOutcome::FailedTransient {
                reason: e.to_string(),
            };
        }

        if let ContentItem::Post(post) = item {
            self.media.archive(post).await;
        }

        retirer.retire(item, &self.config).await
    }
}

/// One unit per item regardless of outcome. The total is the counting
/// pass's estimate and can drift from what processing actually sees.
struct Progress {
    done: u64,
    total: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self { done: 0, total }
    }

    fn advance(&mut self) {
        self.done += 1;
        if self.done % 10 == 0 || self.done >= self.total {
            info!(done = self.done, total = self.total, "progress");
        }
    }
}

fn non_negative(value: i64, field: &str) -> Result<i64, CoreError> {
    if value < 0 {
        return Err(CoreError::InvalidParameter {
            message: format!("{field} must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

fn non_empty(value: &str, field: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidParameter {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(trimmed.to_string())
}
