//! Wire model for Reddit listing responses.

use chrono::{DateTime, Utc};
use scour_core::{Comment, ContentItem, Post};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    pub children: Vec<Thing>,
    pub after: Option<String>,
}

/// A listing child, discriminated by Reddit's `kind` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Thing {
    #[serde(rename = "t1")]
    Comment(CommentData),
    #[serde(rename = "t3")]
    Post(PostData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    pub id: String,
    pub subreddit: String,
    pub score: i64,
    pub created_utc: f64,
    pub body: String,
    /// Nested listing of replies, or an empty string when there are none.
    #[serde(default)]
    pub replies: serde_json::Value,
}

impl CommentData {
    pub fn reply_count(&self) -> u32 {
        self.replies
            .pointer("/data/children")
            .and_then(|children| children.as_array())
            .map(|children| children.len() as u32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    pub id: String,
    pub subreddit: String,
    pub score: i64,
    pub created_utc: f64,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_self: bool,
}

fn timestamp(created_utc: f64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(created_utc as i64, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl From<Thing> for ContentItem {
    fn from(thing: Thing) -> Self {
        match thing {
            Thing::Comment(data) => {
                let reply_count = data.reply_count();
                Self::Comment(Comment {
                    id: data.id,
                    subreddit: data.subreddit,
                    score: data.score,
                    created_at: timestamp(data.created_utc),
                    body: data.body,
                    reply_count,
                })
            }
            Thing::Post(data) => {
                // For self posts Reddit's `url` is the permalink, never a
                // linked resource.
                let url = if data.is_self { None } else { data.url };
                let selftext = if data.selftext.is_empty() {
                    None
                } else {
                    Some(data.selftext)
                };
                Self::Post(Post {
                    id: data.id,
                    subreddit: data.subreddit,
                    score: data.score,
                    created_at: timestamp(data.created_utc),
                    title: data.title,
                    selftext,
                    url,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENT_LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t1_next",
            "children": [
                {
                    "kind": "t1",
                    "data": {
                        "id": "c1",
                        "subreddit": "rust",
                        "score": -2,
                        "created_utc": 1640995200.0,
                        "body": "a comment",
                        "replies": {
                            "kind": "Listing",
                            "data": { "after": null, "children": [
                                { "kind": "t1", "data": { "id": "r1", "subreddit": "rust", "score": 1, "created_utc": 1640995300.0, "body": "reply" } }
                            ] }
                        }
                    }
                }
            ]
        }
    }"#;

    const POST_LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": null,
            "children": [
                {
                    "kind": "t3",
                    "data": {
                        "id": "p1",
                        "subreddit": "pics",
                        "score": 10,
                        "created_utc": 1640995200.0,
                        "title": "a picture",
                        "selftext": "",
                        "url": "https://i.example.com/cat.png",
                        "is_self": false
                    }
                },
                {
                    "kind": "t3",
                    "data": {
                        "id": "p2",
                        "subreddit": "rust",
                        "score": 3,
                        "created_utc": 1640995200.0,
                        "title": "a question",
                        "selftext": "some text",
                        "url": "https://reddit.com/r/rust/comments/p2",
                        "is_self": true
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn comment_listing_deserializes_with_reply_count() {
        let listing: Listing = serde_json::from_str(COMMENT_LISTING).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t1_next"));
        assert_eq!(listing.data.children.len(), 1);

        let item = ContentItem::from(listing.data.children[0].clone());
        match item {
            ContentItem::Comment(comment) => {
                assert_eq!(comment.id, "c1");
                assert_eq!(comment.score, -2);
                assert_eq!(comment.reply_count, 1);
            }
            ContentItem::Post(_) => panic!("expected a comment"),
        }
    }

    #[test]
    fn replies_as_empty_string_count_zero() {
        let data: CommentData = serde_json::from_str(
            r#"{"id":"c2","subreddit":"rust","score":1,"created_utc":0.0,"body":"x","replies":""}"#,
        )
        .unwrap();
        assert_eq!(data.reply_count(), 0);
    }

    #[test]
    fn link_post_keeps_url_and_drops_empty_selftext() {
        let listing: Listing = serde_json::from_str(POST_LISTING).unwrap();
        let item = ContentItem::from(listing.data.children[0].clone());
        match item {
            ContentItem::Post(post) => {
                assert_eq!(post.url.as_deref(), Some("https://i.example.com/cat.png"));
                assert_eq!(post.selftext, None);
            }
            ContentItem::Comment(_) => panic!("expected a post"),
        }
    }

    #[test]
    fn self_post_drops_permalink_url() {
        let listing: Listing = serde_json::from_str(POST_LISTING).unwrap();
        let item = ContentItem::from(listing.data.children[1].clone());
        match item {
            ContentItem::Post(post) => {
                assert_eq!(post.url, None);
                assert_eq!(post.selftext.as_deref(), Some("some text"));
            }
            ContentItem::Comment(_) => panic!("expected a post"),
        }
    }
}
