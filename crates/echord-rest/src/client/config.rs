//! REST client configuration.

use echord_common::ClientConfig;
use std::time::Duration;

/// REST client configuration
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub token: String,
    pub base_url: String,
    pub version: u8,
    pub user_agent: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: "https://discord.com/api".to_string(),
            version: 10,
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL for an API path: `{base}/v{version}{path}`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/v{}{}",
            self.base_url.trim_end_matches('/'),
            self.version,
            path
        )
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

impl From<&ClientConfig> for RestConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            version: config.api.version,
            ..Self::new(config.token.clone())
        }
    }
}

fn default_user_agent() -> String {
    format!("DiscordBot (echord, {})", env!("CARGO_PKG_VERSION"))
}
