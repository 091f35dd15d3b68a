use crate::error::{BroadcasterError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub slack: SlackConfig,
    pub directory: DirectoryConfig,
    pub dispatch: DispatchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub api_timeout_secs: u64,
    pub max_retries: u32,
}

impl SlackConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Longest accepted directory cache TTL (one week)
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub cache_ttl_secs: u64,
    pub page_size: u16,
    pub max_pages: usize,
    pub users_failure_policy: UsersFailurePolicy,
}

impl DirectoryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            page_size: 200,
            max_pages: 1000,
            users_failure_policy: UsersFailurePolicy::Fail,
        }
    }
}

/// What to serve when channels were fetched but the user list was not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsersFailurePolicy {
    /// Fail the whole directory request
    #[default]
    Fail,
    /// Serve the channels alone
    ChannelsOnly,
}

impl FromStr for UsersFailurePolicy {
    type Err = BroadcasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "channels_only" | "channels-only" => Ok(Self::ChannelsOnly),
            other => Err(BroadcasterError::Config(format!(
                "Invalid DIRECTORY_USERS_FAILURE_POLICY: {other} (expected fail or channels_only)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub max_concurrency: usize,
    pub stamp_messages: bool,
    pub username: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            stamp_messages: false,
            username: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub static_dir: PathBuf,
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_lookup(|key| std::env::var(key).ok())
}

impl Settings {
    /// Build settings from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Load Slack config
        let slack = SlackConfig {
            bot_token: lookup("SLACK_BOT_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| BroadcasterError::Config("SLACK_BOT_TOKEN not set".to_string()))?,
            api_timeout_secs: parse("SLACK_API_TIMEOUT_SECS", &var("SLACK_API_TIMEOUT_SECS", "10"))?,
            max_retries: parse("SLACK_MAX_RETRIES", &var("SLACK_MAX_RETRIES", "2"))?,
        };
        if slack.api_timeout_secs == 0 {
            return Err(BroadcasterError::Config(
                "SLACK_API_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        // Load directory config
        let directory = DirectoryConfig {
            cache_ttl_secs: parse(
                "DIRECTORY_CACHE_TTL_SECS",
                &var("DIRECTORY_CACHE_TTL_SECS", "60"),
            )?,
            page_size: parse("DIRECTORY_PAGE_SIZE", &var("DIRECTORY_PAGE_SIZE", "200"))?,
            max_pages: parse("DIRECTORY_MAX_PAGES", &var("DIRECTORY_MAX_PAGES", "1000"))?,
            users_failure_policy: var("DIRECTORY_USERS_FAILURE_POLICY", "fail").parse()?,
        };
        if directory.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(BroadcasterError::Config(format!(
                "DIRECTORY_CACHE_TTL_SECS must be at most {MAX_CACHE_TTL_SECS}"
            )));
        }
        if directory.page_size == 0 || directory.max_pages == 0 {
            return Err(BroadcasterError::Config(
                "DIRECTORY_PAGE_SIZE and DIRECTORY_MAX_PAGES must be positive".to_string(),
            ));
        }

        // Load dispatch config
        let dispatch = DispatchConfig {
            max_concurrency: parse::<usize>(
                "DISPATCH_MAX_CONCURRENCY",
                &var("DISPATCH_MAX_CONCURRENCY", "8"),
            )?
            .clamp(1, 64),
            stamp_messages: parse(
                "DISPATCH_STAMP_MESSAGES",
                &var("DISPATCH_STAMP_MESSAGES", "false"),
            )?,
            username: lookup("DISPATCH_USERNAME").filter(|u| !u.trim().is_empty()),
        };

        // Load server config; PORT alone is honoured for hosted deployments
        let bind = lookup("SERVER_BIND").unwrap_or_else(|| format!("0.0.0.0:{}", var("PORT", "3000")));
        let server = ServerConfig {
            bind,
            static_dir: var("STATIC_DIR", "public").into(),
        };

        Ok(Settings {
            slack,
            directory,
            dispatch,
            server,
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BroadcasterError::Config(format!("Invalid {key}: {raw}")))
}
