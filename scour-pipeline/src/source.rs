//! Lazy traversal over one kind of the user's content.

use scour_core::{ContentItem, ContentKind, CoreError, Page, PageErrorPolicy, UserContent};
use std::collections::VecDeque;
use tracing::warn;

/// Pulls listing pages on demand and yields items newest-first until the
/// service reports no further pages.
///
/// Each constructed stream restarts pagination from the top. Two streams
/// over the same account are not guaranteed to observe the same set:
/// scores, reply counts, and the items themselves can change remotely
/// between traversals. Callers running a count-then-process pattern must
/// tolerate that drift.
pub struct ContentStream<'a> {
    api: &'a dyn UserContent,
    kind: ContentKind,
    policy: PageErrorPolicy,
    buffer: VecDeque<ContentItem>,
    after: Option<String>,
    fetched_first: bool,
    exhausted: bool,
}

impl<'a> ContentStream<'a> {
    pub fn new(api: &'a dyn UserContent, kind: ContentKind, policy: PageErrorPolicy) -> Self {
        Self {
            api,
            kind,
            policy,
            buffer: VecDeque::new(),
            after: None,
            fetched_first: false,
            exhausted: false,
        }
    }

    /// Next item, or `Ok(None)` once the stream ends. A first-page
    /// failure means the source itself is unreachable and is fatal;
    /// later page failures follow the configured policy.
    pub async fn next(&mut self) -> Result<Option<ContentItem>, CoreError> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(e) if !self.fetched_first => {
                    return Err(CoreError::SourceUnavailable {
                        reason: e.to_string(),
                    });
                }
                Err(e) => match self.policy {
                    PageErrorPolicy::Truncate => {
                        warn!(
                            kind = %self.kind,
                            after = ?self.after,
                            error = %e,
                            "page fetch failed, truncating stream"
                        );
                        self.exhausted = true;
                        return Ok(None);
                    }
                    PageErrorPolicy::Fail => return Err(e),
                },
            };

            self.fetched_first = true;
            self.exhausted = page.after.is_none() || page.items.is_empty();
            self.after = page.after;
            self.buffer.extend(page.items);
        }
    }

    async fn fetch_page(&self) -> Result<Page, CoreError> {
        match self.kind {
            ContentKind::Comment => self.api.comments_page(self.after.as_deref()).await,
            ContentKind::Post => self.api.posts_page(self.after.as_deref()).await,
        }
    }
}
