//! Gateway client configuration

use echord_common::ClientConfig;
use echord_core::GatewayIntents;
use std::time::Duration;

use crate::protocol::{IdentifyProperties, PresenceUpdatePayload};

/// Default gateway endpoint
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// Default gateway protocol version
pub const DEFAULT_GATEWAY_VERSION: u8 = 10;

/// Settings for one gateway connection
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: String,
    pub intents: GatewayIntents,
    /// Endpoint used for fresh sessions
    pub url: String,
    pub version: u8,
    /// Request zlib-stream transport compression
    pub compress: bool,
    pub large_threshold: Option<u16>,
    /// `[shard_id, num_shards]`
    pub shard: Option<[u32; 2]>,
    pub properties: IdentifyProperties,
    /// Presence sent with Identify
    pub presence: Option<PresenceUpdatePayload>,
    /// First delay of the fresh-connect backoff
    pub reconnect_base: Duration,
    /// Upper bound of the fresh-connect backoff
    pub reconnect_max: Duration,
    /// Wait after an Invalid Session before the next attempt
    pub invalid_session_delay: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(token: impl Into<String>, intents: GatewayIntents) -> Self {
        Self {
            token: token.into(),
            intents,
            url: DEFAULT_GATEWAY_URL.to_string(),
            version: DEFAULT_GATEWAY_VERSION,
            compress: true,
            large_threshold: None,
            shard: None,
            properties: IdentifyProperties::default(),
            presence: None,
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(60),
            invalid_session_delay: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[must_use]
    pub fn with_shard(mut self, shard_id: u32, num_shards: u32) -> Self {
        self.shard = Some([shard_id, num_shards]);
        self
    }

    #[must_use]
    pub fn with_presence(mut self, presence: PresenceUpdatePayload) -> Self {
        self.presence = Some(presence);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_reconnect_delays(mut self, base: Duration, max: Duration, invalid_session: Duration) -> Self {
        self.reconnect_base = base;
        self.reconnect_max = max;
        self.invalid_session_delay = invalid_session;
        self
    }

    /// Full connection URL for `base`, with version and encoding parameters
    #[must_use]
    pub fn endpoint(&self, base: &str) -> String {
        let compress = if self.compress { "&compress=zlib-stream" } else { "" };
        format!(
            "{}/?v={}&encoding=json{compress}",
            base.trim_end_matches('/'),
            self.version
        )
    }
}

impl From<&ClientConfig> for GatewayConfig {
    fn from(config: &ClientConfig) -> Self {
        let gateway = &config.gateway;
        Self {
            url: gateway.url.clone(),
            version: gateway.version,
            compress: gateway.compress,
            large_threshold: gateway.large_threshold,
            reconnect_base: gateway.reconnect_base,
            reconnect_max: gateway.reconnect_max,
            invalid_session_delay: gateway.invalid_session_delay,
            ..Self::new(config.token.clone(), config.intents)
        }
    }
}
