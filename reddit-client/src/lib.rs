pub mod api;
pub mod models;
pub mod rate_limiter;

pub use api::RedditSession;

use scour_core::{ConfigError, CoreError};
use std::path::Path;

/// Script-app credentials: client id, client secret, account username,
/// account password — one per line.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        let mut lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());

        let mut next_line = |field: &str| {
            lines
                .next()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MalformedCredentials {
                    details: format!("missing {field} line"),
                })
        };

        Ok(Self {
            client_id: next_line("client id")?,
            client_secret: next_line("client secret")?,
            username: next_line("username")?,
            password: next_line("password")?,
        })
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
