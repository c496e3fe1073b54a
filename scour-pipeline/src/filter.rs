//! Pure predicates: protection rules and per-command selection rules.
//! Both gates are evaluated per item; exclusion always wins.

use chrono::{DateTime, Duration, Utc};
use scour_core::{CleanerConfig, ContentItem};

/// True when the item is protected from any retirement action, either by
/// subreddit (exact, case-sensitive) or by a keyword occurring in the
/// item's primary text. Link posts have no primary text, so only the
/// subreddit rule can protect them here.
pub fn is_excluded(item: &ContentItem, config: &CleanerConfig) -> bool {
    if config.excluded_subs.contains(item.subreddit()) {
        return true;
    }
    let Some(text) = item.primary_text() else {
        return false;
    };
    let lowered = text.to_lowercase();
    config
        .excluded_keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// One retirement rule per command.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    OlderThan { days: i64 },
    NegativeScore,
    LowEngagement,
    AllPosts,
    ScoreBelow { threshold: i64 },
    InSubreddit { name: String },
    ContainsKeyword { keyword: String },
}

impl Selection {
    /// The clock is passed in so the predicate stays pure.
    pub fn selects(&self, item: &ContentItem, now: DateTime<Utc>) -> bool {
        match self {
            Self::OlderThan { days } => now - item.created_at() >= Duration::days(*days),
            Self::NegativeScore => {
                matches!(item, ContentItem::Comment(c) if c.score < 0)
            }
            Self::LowEngagement => {
                matches!(item, ContentItem::Comment(c) if c.score <= 1 && c.reply_count == 0)
            }
            Self::AllPosts => matches!(item, ContentItem::Post(_)),
            Self::ScoreBelow { threshold } => {
                matches!(item, ContentItem::Post(p) if p.score < *threshold)
            }
            Self::InSubreddit { name } => {
                item.subreddit().to_lowercase() == name.to_lowercase()
            }
            Self::ContainsKeyword { keyword } => {
                let needle = keyword.to_lowercase();
                match item {
                    ContentItem::Comment(c) => c.body.to_lowercase().contains(&needle),
                    ContentItem::Post(p) => {
                        p.title.to_lowercase().contains(&needle)
                            || p.selftext
                                .as_deref()
                                .is_some_and(|text| text.to_lowercase().contains(&needle))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scour_core::{Comment, Post};

    fn comment(subreddit: &str, score: i64, reply_count: u32, body: &str) -> ContentItem {
        ContentItem::Comment(Comment {
            id: "c1".to_string(),
            subreddit: subreddit.to_string(),
            score,
            created_at: Utc::now() - Duration::days(30),
            body: body.to_string(),
            reply_count,
        })
    }

    fn post(subreddit: &str, score: i64, title: &str, selftext: Option<&str>) -> ContentItem {
        ContentItem::Post(Post {
            id: "p1".to_string(),
            subreddit: subreddit.to_string(),
            score,
            created_at: Utc::now() - Duration::days(30),
            title: title.to_string(),
            selftext: selftext.map(str::to_string),
            url: None,
        })
    }

    fn config_excluding(subs: &[&str], keywords: &[&str]) -> CleanerConfig {
        let mut config = CleanerConfig::default();
        config.excluded_subs = subs.iter().map(|s| s.to_string()).collect();
        config.excluded_keywords = keywords.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn excluded_sub_matches_exactly() {
        let config = config_excluding(&["AskHistorians"], &[]);
        assert!(is_excluded(&comment("AskHistorians", 1, 0, "x"), &config));
        // Case-sensitive on purpose: sub exclusion is an exact name list.
        assert!(!is_excluded(&comment("askhistorians", 1, 0, "x"), &config));
    }

    #[test]
    fn excluded_keyword_is_case_insensitive_substring() {
        let config = config_excluding(&[], &["Keep This"]);
        assert!(is_excluded(&comment("rust", 1, 0, "please KEEP THIS one"), &config));
        assert!(!is_excluded(&comment("rust", 1, 0, "nothing special"), &config));
    }

    #[test]
    fn keyword_exclusion_skips_title_and_link_posts() {
        let config = config_excluding(&[], &["secret"]);
        // Keyword present only in the title: not an exclusion match.
        assert!(!is_excluded(&post("rust", 1, "my secret project", None), &config));
        assert!(is_excluded(&post("rust", 1, "a title", Some("the secret text")), &config));
    }

    #[test]
    fn age_selection_uses_day_cutoff() {
        let now = Utc::now();
        let selection = Selection::OlderThan { days: 7 };
        assert!(selection.selects(&comment("rust", 1, 0, "x"), now));
        assert!(!selection.selects(&comment("rust", 1, 0, "x"), now - Duration::days(29)));
    }

    #[test]
    fn negative_score_applies_to_comments_only() {
        let now = Utc::now();
        let selection = Selection::NegativeScore;
        assert!(selection.selects(&comment("rust", -1, 0, "x"), now));
        assert!(!selection.selects(&comment("rust", 0, 0, "x"), now));
        assert!(!selection.selects(&post("rust", -10, "t", None), now));
    }

    #[test]
    fn low_engagement_needs_low_score_and_no_replies() {
        let now = Utc::now();
        let selection = Selection::LowEngagement;
        assert!(selection.selects(&comment("rust", 1, 0, "x"), now));
        assert!(!selection.selects(&comment("rust", 1, 3, "x"), now));
        assert!(!selection.selects(&comment("rust", 2, 0, "x"), now));
    }

    #[test]
    fn score_below_applies_to_posts_only() {
        let now = Utc::now();
        let selection = Selection::ScoreBelow { threshold: 5 };
        assert!(selection.selects(&post("rust", 4, "t", None), now));
        assert!(!selection.selects(&post("rust", 5, "t", None), now));
        assert!(!selection.selects(&comment("rust", 1, 0, "x"), now));
    }

    #[test]
    fn subreddit_match_ignores_case() {
        let now = Utc::now();
        let selection = Selection::InSubreddit {
            name: "Rust".to_string(),
        };
        assert!(selection.selects(&comment("rust", 1, 0, "x"), now));
        assert!(selection.selects(&post("RUST", 1, "t", None), now));
        assert!(!selection.selects(&comment("golang", 1, 0, "x"), now));
    }

    #[test]
    fn keyword_match_checks_title_or_selftext_for_posts() {
        let now = Utc::now();
        let selection = Selection::ContainsKeyword {
            keyword: "FOO".to_string(),
        };
        assert!(selection.selects(&comment("rust", 1, 0, "some foo here"), now));
        assert!(selection.selects(&post("rust", 1, "foo in title", None), now));
        assert!(selection.selects(&post("rust", 1, "t", Some("foo in body")), now));
        assert!(!selection.selects(&post("rust", 1, "t", None), now));
    }

    #[test]
    fn predicates_are_idempotent() {
        let now = Utc::now();
        let config = config_excluding(&["test"], &["foo"]);
        let item = comment("test", -1, 0, "foo bar");
        let selection = Selection::NegativeScore;

        assert_eq!(is_excluded(&item, &config), is_excluded(&item, &config));
        assert_eq!(selection.selects(&item, now), selection.selects(&item, now));
    }
}
