//! The redact-then-delete mutation and its mandatory inter-mutation
//! pause.

use async_trait::async_trait;
use scour_core::{CleanerConfig, ContentItem, CoreError, RetirementOutcome, UserContent};
use std::time::Duration;
use tracing::{info, warn};

/// Seam for the pause after each real mutation, so tests can observe
/// pauses without waiting them out.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Production throttle backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioThrottle;

#[async_trait]
impl Throttle for TokioThrottle {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform sample from `[min_delay, max_delay]` seconds.
pub fn sample_delay(min_delay: f64, max_delay: f64) -> Duration {
    let span = (max_delay - min_delay).max(0.0);
    Duration::from_secs_f64(min_delay + fastrand::f64() * span)
}

pub struct Retirer<'a> {
    api: &'a dyn UserContent,
    throttle: &'a dyn Throttle,
}

impl<'a> Retirer<'a> {
    pub fn new(api: &'a dyn UserContent, throttle: &'a dyn Throttle) -> Self {
        Self { api, throttle }
    }

    /// Overwrite the body when there is one, then delete, then pause.
    /// Dry run suppresses every remote call and the pause. A failed
    /// mutation is logged and isolated to this item.
    pub async fn retire(&self, item: &ContentItem, config: &CleanerConfig) -> RetirementOutcome {
        if config.dry_run {
            info!(
                id = item.id(),
                sub = item.subreddit(),
                kind = %item.kind(),
                "dry run, would retire"
            );
            return RetirementOutcome::Retired;
        }

        if let Err(e) = self.mutate(item, config).await {
            warn!(
                id = item.id(),
                sub = item.subreddit(),
                error = %e,
                "mutation failed"
            );
            return RetirementOutcome::FailedTransient {
                reason: e.to_string(),
            };
        }

        self.throttle
            .pause(sample_delay(config.min_delay, config.max_delay))
            .await;
        info!(id = item.id(), sub = item.subreddit(), kind = %item.kind(), "retired");
        RetirementOutcome::Retired
    }

    async fn mutate(&self, item: &ContentItem, config: &CleanerConfig) -> Result<(), CoreError> {
        let fullname = item.fullname();
        if item.primary_text().is_some_and(|text| !text.is_empty()) {
            self.api.edit(&fullname, &config.replacement_text).await?;
        }
        self.api.delete(&fullname).await
    }
}
