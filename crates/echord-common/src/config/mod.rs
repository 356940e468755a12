//! Configuration structs

mod client_config;

pub use client_config::{
    ApiSettings, AppSettings, CacheKindSettings, CacheSettings, ClientConfig, ConfigError,
    Environment, GatewaySettings,
};
