use crate::models::Listing;
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::Credentials;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use scour_core::{ContentItem, CoreError, Page, RedditApiError, UserContent};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const PAGE_LIMIT: &str = "100";
// Refresh slightly before the token actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    error: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug)]
struct SessionToken {
    access_token: String,
    expires_at: Instant,
}

/// Authenticated session for one script-app account. Listings and
/// mutations all go through the shared rate limiter.
pub struct RedditSession {
    http: Client,
    credentials: Credentials,
    rate_limiter: RateLimiter,
    token: Mutex<Option<SessionToken>>,
}

impl RedditSession {
    pub fn new(credentials: Credentials, user_agent: &str) -> Result<Self, CoreError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http,
            credentials,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_script()),
            token: Mutex::new(None),
        })
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Authenticate eagerly so a bad credential fails before any
    /// traversal starts.
    pub async fn login(&self) -> Result<(), CoreError> {
        let token = self.fetch_token().await?;
        *self.token.lock().await = Some(token);
        Ok(())
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
            debug!("access token expired, refreshing");
        }
        let token = self.fetch_token().await?;
        let access = token.access_token.clone();
        *slot = Some(token);
        Ok(access)
    }

    async fn fetch_token(&self) -> Result<SessionToken, CoreError> {
        debug!(user = %self.credentials.username, "requesting access token");
        let response = self
            .http
            .post(REDDIT_TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "client credentials rejected".to_string(),
            }));
        }
        if !status.is_success() {
            return Err(CoreError::RedditApi(RedditApiError::ServerError {
                status_code: status.as_u16(),
            }));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse token response");
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "failed to parse token response".to_string(),
            })
        })?;

        // Reddit reports bad account credentials as 200 with an error body.
        if let Some(reason) = token.error {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason,
            }));
        }
        if token.access_token.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "no access token in response".to_string(),
            }));
        }

        info!(user = %self.credentials.username, "authenticated with Reddit");
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));
        Ok(SessionToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        self.rate_limiter.acquire().await;
        let access_token = self.access_token().await?;

        let url = format!("{REDDIT_API_BASE}{endpoint}");
        let mut builder = self.http.request(method.clone(), &url).bearer_auth(access_token);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(form) = form {
            builder = builder.form(form);
        }

        debug!(%method, endpoint, "Reddit API request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
            }
            Err(e) => return Err(CoreError::Network(e)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        error!(%status, endpoint, "Reddit API request failed");

        let err = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(60);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::NotFound {
                resource: endpoint.to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            _ => RedditApiError::InvalidResponse {
                details: format!("unexpected status {status} for {endpoint}"),
            },
        };
        Err(CoreError::RedditApi(err))
    }

    async fn user_listing(&self, which: &str, after: Option<&str>) -> Result<Page, CoreError> {
        let endpoint = format!("/user/{}/{}", self.credentials.username, which);
        let mut params = vec![("sort", "new"), ("limit", PAGE_LIMIT), ("raw_json", "1")];
        if let Some(after) = after {
            params.push(("after", after));
        }

        let response = self
            .request(Method::GET, &endpoint, Some(&params), None)
            .await?;

        let listing: Listing = response.json().await.map_err(|e| {
            error!(endpoint, error = %e, "failed to parse listing");
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("failed to parse listing for {endpoint}"),
            })
        })?;

        debug!(
            endpoint,
            count = listing.data.children.len(),
            after = ?listing.data.after,
            "fetched listing page"
        );
        Ok(Page {
            after: listing.data.after,
            items: listing
                .data
                .children
                .into_iter()
                .map(ContentItem::from)
                .collect(),
        })
    }
}

#[async_trait]
impl UserContent for RedditSession {
    async fn comments_page(&self, after: Option<&str>) -> Result<Page, CoreError> {
        self.user_listing("comments", after).await
    }

    async fn posts_page(&self, after: Option<&str>) -> Result<Page, CoreError> {
        self.user_listing("submitted", after).await
    }

    async fn edit(&self, fullname: &str, body: &str) -> Result<(), CoreError> {
        let form = [("api_type", "json"), ("thing_id", fullname), ("text", body)];
        let response = self
            .request(Method::POST, "/api/editusertext", None, Some(&form))
            .await?;

        // Edit failures come back as 200 with a populated errors array.
        let value: serde_json::Value = response.json().await.map_err(|e| {
            error!(fullname, error = %e, "failed to parse edit response");
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("failed to parse edit response for {fullname}"),
            })
        })?;
        let errors = value
            .pointer("/json/errors")
            .and_then(|errors| errors.as_array());
        if let Some(errors) = errors {
            if !errors.is_empty() {
                return Err(CoreError::MutationFailed {
                    id: fullname.to_string(),
                    reason: serde_json::Value::Array(errors.clone()).to_string(),
                });
            }
        }
        Ok(())
    }

    async fn delete(&self, fullname: &str) -> Result<(), CoreError> {
        let form = [("id", fullname)];
        self.request(Method::POST, "/api/del", None, Some(&form))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> Credentials {
        Credentials {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            username: "test_user".to_string(),
            password: "test_password".to_string(),
        }
    }

    #[tokio::test]
    async fn session_creation() {
        let session = RedditSession::new(test_credentials(), "scour/0.1 test").unwrap();
        assert_eq!(session.username(), "test_user");
        assert!(session.rate_limiter.available_tokens().await > 0.0);
    }

    #[tokio::test]
    async fn session_starts_unauthenticated() {
        let session = RedditSession::new(test_credentials(), "scour/0.1 test").unwrap();
        assert!(session.token.lock().await.is_none());
    }
}
