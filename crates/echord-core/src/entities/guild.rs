//! Guild entity - a server

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Guild record as sent by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
    /// Set when the guild is unavailable due to an outage
    #[serde(default)]
    pub unavailable: bool,
}
