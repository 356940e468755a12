//! Typed `d` payloads
//!
//! Everything the client sends, plus the few server payloads the session reads.

use echord_core::{GatewayIntents, Snowflake};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Op 10, the first frame on every socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }
}

/// Op 2
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,

    /// Event groups this session wants to receive
    pub intents: GatewayIntents,

    pub properties: IdentifyProperties,

    /// Member count above which offline members are not sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_threshold: Option<u16>,

    /// `[shard_id, num_shards]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard: Option<[u32; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceUpdatePayload>,
}

/// Identifies the library to the gateway; informational only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl IdentifyProperties {
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = browser.into();
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "echord".to_string(),
            device: "echord".to_string(),
        }
    }
}

/// Op 6; replays everything after `seq` on the new socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

/// Online status shown to other users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Online,
    Dnd,
    Idle,
    Invisible,
    Offline,
}

/// A single activity in a presence update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,

    /// Activity type (0 playing, 1 streaming, 2 listening, 3 watching, 4 custom, 5 competing)
    #[serde(rename = "type")]
    pub kind: u8,

    /// Stream URL, only honored for streaming activities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Activity {
    pub const PLAYING: u8 = 0;
    pub const STREAMING: u8 = 1;
    pub const LISTENING: u8 = 2;
    pub const WATCHING: u8 = 3;

    #[must_use]
    pub fn new(name: impl Into<String>, kind: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            url: None,
        }
    }

    #[must_use]
    pub fn playing(name: impl Into<String>) -> Self {
        Self::new(name, Self::PLAYING)
    }

    #[must_use]
    pub fn streaming(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(name, Self::STREAMING)
        }
    }

    #[must_use]
    pub fn listening(name: impl Into<String>) -> Self {
        Self::new(name, Self::LISTENING)
    }

    #[must_use]
    pub fn watching(name: impl Into<String>) -> Self {
        Self::new(name, Self::WATCHING)
    }
}

/// Op 3, also embedded in Identify as the initial presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Unix time in milliseconds the client went idle
    pub since: Option<u64>,

    pub activities: Vec<Activity>,

    pub status: Status,

    pub afk: bool,
}

impl PresenceUpdatePayload {
    #[must_use]
    pub fn new(status: Status) -> Self {
        Self {
            since: None,
            activities: Vec::new(),
            status,
            afk: false,
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    #[must_use]
    pub fn with_afk(mut self, since: u64) -> Self {
        self.since = Some(since);
        self.afk = true;
        self
    }
}

/// Op 8
///
/// Members arrive afterwards as `GUILD_MEMBERS_CHUNK` dispatches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestGuildMembersPayload {
    pub guild_id: Snowflake,

    /// Username prefix; an empty string requests every member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Maximum number of members to send; 0 means no limit
    pub limit: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presences: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<Snowflake>>,

    /// Echoed back in the chunk dispatches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl RequestGuildMembersPayload {
    /// Request members whose username starts with `query`
    #[must_use]
    pub fn by_query(guild_id: Snowflake, query: impl Into<String>, limit: u32) -> Self {
        Self {
            guild_id,
            query: Some(query.into()),
            limit,
            presences: None,
            user_ids: None,
            nonce: None,
        }
    }

    /// Request specific members
    #[must_use]
    pub fn by_ids(guild_id: Snowflake, user_ids: Vec<Snowflake>) -> Self {
        Self {
            guild_id,
            query: None,
            limit: 0,
            presences: None,
            user_ids: Some(user_ids),
            nonce: None,
        }
    }

    #[must_use]
    pub fn with_presences(mut self, presences: bool) -> Self {
        self.presences = Some(presences);
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// The part of the READY dispatch the session needs to resume later
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,

    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}
