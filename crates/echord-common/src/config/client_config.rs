//! Client configuration
//!
//! Loads settings for the gateway session, the REST dispatcher and the entity
//! caches from environment variables (and a `.env` file when present).

use echord_core::GatewayIntents;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Top-level client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    /// Bot token, sent in Identify and in the `Authorization` header
    pub token: String,
    pub intents: GatewayIntents,
    pub gateway: GatewaySettings,
    pub api: ApiSettings,
    pub cache: CacheSettings,
}

/// General application settings
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub url: String,
    pub version: u8,
    pub compress: bool,
    pub large_threshold: Option<u16>,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
    pub invalid_session_delay: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            version: 10,
            compress: true,
            large_threshold: None,
            reconnect_base: Duration::from_millis(1_000),
            reconnect_max: Duration::from_millis(60_000),
            invalid_session_delay: Duration::from_millis(5_000),
        }
    }
}

/// REST API settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub version: u8,
    /// Requests allowed per window for a bucket the server has not described yet
    pub bucket_limit: u32,
    pub bucket_window: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            version: 10,
            bucket_limit: 5,
            bucket_window: Duration::from_millis(5_000),
        }
    }
}

/// Overrides for one entity cache; `None` keeps the cache's own default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheKindSettings {
    pub max_size: Option<usize>,
    pub ttl: Option<Duration>,
    pub sweep_interval: Option<Duration>,
}

/// Cache overrides per entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheSettings {
    pub guilds: CacheKindSettings,
    pub channels: CacheKindSettings,
    pub messages: CacheKindSettings,
    pub users: CacheKindSettings,
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg".to_string()
}

fn default_api_url() -> String {
    "https://discord.com/api".to_string()
}

impl ClientConfig {
    /// Create a configuration with defaults for everything except the token
    pub fn new(token: impl Into<String>, intents: GatewayIntents) -> Self {
        Self {
            app: AppSettings::default(),
            token: token.into(),
            intents,
            gateway: GatewaySettings::default(),
            api: ApiSettings::default(),
            cache: CacheSettings::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `ECHORD_TOKEN` is missing or a variable fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);
        let gateway_defaults = GatewaySettings::default();
        let api_defaults = ApiSettings::default();

        let token = vars
            .get("ECHORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("ECHORD_TOKEN"))?;

        Ok(Self {
            app: AppSettings {
                env: vars.parse_or("APP_ENV", Environment::default())?,
            },
            token,
            intents: GatewayIntents::from_bits_truncate(vars.parse_or("ECHORD_INTENTS", 0u64)?),
            gateway: GatewaySettings {
                url: vars.get("GATEWAY_URL").unwrap_or(gateway_defaults.url),
                version: vars.parse_or("GATEWAY_VERSION", gateway_defaults.version)?,
                compress: vars.flag_or("GATEWAY_COMPRESS", gateway_defaults.compress)?,
                large_threshold: vars.parse_opt("GATEWAY_LARGE_THRESHOLD")?,
                reconnect_base: vars
                    .millis_or("GATEWAY_RECONNECT_BASE_MS", gateway_defaults.reconnect_base)?,
                reconnect_max: vars
                    .millis_or("GATEWAY_RECONNECT_MAX_MS", gateway_defaults.reconnect_max)?,
                invalid_session_delay: vars.millis_or(
                    "GATEWAY_INVALID_SESSION_DELAY_MS",
                    gateway_defaults.invalid_session_delay,
                )?,
            },
            api: ApiSettings {
                base_url: vars.get("API_BASE_URL").unwrap_or(api_defaults.base_url),
                version: vars.parse_or("API_VERSION", api_defaults.version)?,
                bucket_limit: vars.parse_or("API_BUCKET_LIMIT", api_defaults.bucket_limit)?,
                bucket_window: vars.millis_or("API_BUCKET_WINDOW_MS", api_defaults.bucket_window)?,
            },
            cache: CacheSettings {
                guilds: vars.cache_kind("GUILDS")?,
                channels: vars.cache_kind("CHANNELS")?,
                messages: vars.cache_kind("MESSAGES")?,
                users: vars.cache_kind("USERS")?,
            },
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn parse_opt<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ConfigError> {
        match self.get(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue(name, raw)),
            None => Ok(None),
        }
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.parse_opt(name)?.unwrap_or(default))
    }

    fn flag_or(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue(name, raw)),
            },
            None => Ok(default),
        }
    }

    fn millis_opt(&self, name: &'static str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.parse_opt::<u64>(name)?.map(Duration::from_millis))
    }

    fn millis_or(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Ok(self.millis_opt(name)?.unwrap_or(default))
    }

    fn cache_kind(&self, kind: &'static str) -> Result<CacheKindSettings, ConfigError> {
        let (max_size, ttl, sweep) = match kind {
            "GUILDS" => (
                "CACHE_GUILDS_MAX_SIZE",
                "CACHE_GUILDS_TTL_MS",
                "CACHE_GUILDS_SWEEP_INTERVAL_MS",
            ),
            "CHANNELS" => (
                "CACHE_CHANNELS_MAX_SIZE",
                "CACHE_CHANNELS_TTL_MS",
                "CACHE_CHANNELS_SWEEP_INTERVAL_MS",
            ),
            "MESSAGES" => (
                "CACHE_MESSAGES_MAX_SIZE",
                "CACHE_MESSAGES_TTL_MS",
                "CACHE_MESSAGES_SWEEP_INTERVAL_MS",
            ),
            _ => (
                "CACHE_USERS_MAX_SIZE",
                "CACHE_USERS_TTL_MS",
                "CACHE_USERS_SWEEP_INTERVAL_MS",
            ),
        };

        Ok(CacheKindSettings {
            max_size: self.parse_opt(max_size)?,
            ttl: self.millis_opt(ttl)?,
            sweep_interval: self.millis_opt(sweep)?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
