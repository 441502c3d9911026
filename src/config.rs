// Configuration module: credentials, the target handle and the API origin
// are all read from the process environment. Nothing is persisted.

use anyhow::{Context, Result};

/// Default API origin. The banner endpoint hangs off this base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

/// The three credential strings used to open a session.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Primary identifier (account username).
    pub auth_info_1: String,
    /// Secondary identifier (account email).
    pub auth_info_2: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    /// Handle whose followers are listed. Only the follower flow needs it.
    pub target_username: Option<String>,
    pub api_base_url: String,
}

impl Config {
    /// Build a config from `TWITTER_USERNAME`, `TWITTER_EMAIL`,
    /// `TWITTER_PASSWORD`, `TARGET_USERNAME` and `TWITTER_API_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`, so callers
    /// (and tests) can supply their own source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("Missing environment variable {}", key))
        };

        let credentials = Credentials {
            auth_info_1: required("TWITTER_USERNAME")?,
            auth_info_2: required("TWITTER_EMAIL")?,
            password: required("TWITTER_PASSWORD")?,
        };

        let api_base_url = lookup("TWITTER_API_BASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        Ok(Config {
            credentials,
            target_username: lookup("TARGET_USERNAME").filter(|v| !v.is_empty()),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The handle to list followers for, or an error if it was not set.
    pub fn target_username(&self) -> Result<&str> {
        self.target_username
            .as_deref()
            .context("Missing environment variable TARGET_USERNAME")
    }
}
