use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Runtime configuration for the retirement pipeline. Loaded once per
/// invocation; the file is created with defaults on first run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Body written over an item before it is deleted.
    pub replacement_text: String,
    /// Lower bound, in seconds, of the pause after each real mutation.
    pub min_delay: f64,
    /// Upper bound, in seconds, of the pause after each real mutation.
    pub max_delay: f64,
    /// Subreddits whose content is never retired. Exact, case-sensitive
    /// names.
    pub excluded_subs: BTreeSet<String>,
    /// Case-insensitive substrings that protect an item when found in its
    /// body or self-text.
    pub excluded_keywords: BTreeSet<String>,
    pub backup_enabled: bool,
    pub dry_run: bool,
    /// What to do when a page fetch fails after the first page succeeded.
    pub on_page_error: PageErrorPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Log a warning and end the traversal early.
    #[default]
    Truncate,
    /// Propagate the error and abort the command.
    Fail,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            replacement_text: ".".to_string(),
            min_delay: 6.0,
            max_delay: 8.0,
            excluded_subs: BTreeSet::new(),
            excluded_keywords: BTreeSet::new(),
            backup_enabled: true,
            dry_run: false,
            on_page_error: PageErrorPolicy::Truncate,
        }
    }
}

impl CleanerConfig {
    /// Read the config file, or write defaults out and return them when
    /// no file exists yet.
    pub fn load_or_init(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&raw)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            info!(path = %path.display(), "wrote default configuration");
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Delay bounds must satisfy `0 <= min_delay <= max_delay`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_delay.is_finite() || self.min_delay < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "min_delay".to_string(),
                value: self.min_delay.to_string(),
            });
        }
        if !self.max_delay.is_finite() || self.max_delay < self.min_delay {
            return Err(ConfigError::InvalidValue {
                field: "max_delay".to_string(),
                value: self.max_delay.to_string(),
            });
        }
        Ok(())
    }
}
