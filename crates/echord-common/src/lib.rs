//! # echord-common
//!
//! Shared utilities: client configuration loaded from the environment and tracing setup.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    ApiSettings, AppSettings, CacheKindSettings, CacheSettings, ClientConfig, ConfigError,
    Environment, GatewaySettings,
};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    LogFormat, TracingConfig, TracingError,
};
