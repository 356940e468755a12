//! Canned gateway payloads

use serde_json::{json, Value};

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_SESSION_ID: &str = "9f4c2a1e7b";

/// Op 10 with the given heartbeat interval in milliseconds
pub fn hello(heartbeat_interval: u64) -> Value {
    json!({ "op": 10, "d": { "heartbeat_interval": heartbeat_interval } })
}

pub fn heartbeat_ack() -> Value {
    json!({ "op": 11 })
}

pub fn reconnect() -> Value {
    json!({ "op": 7, "d": null })
}

pub fn invalid_session(resumable: bool) -> Value {
    json!({ "op": 9, "d": resumable })
}

/// READY pointing resumes at `resume_url`
pub fn ready(seq: u64, resume_url: &str) -> Value {
    json!({
        "op": 0,
        "t": "READY",
        "s": seq,
        "d": {
            "v": 10,
            "session_id": TEST_SESSION_ID,
            "resume_gateway_url": resume_url,
            "user": { "id": "80351110224678912", "username": "echord-bot", "bot": true },
            "guilds": [],
        }
    })
}

pub fn resumed(seq: u64) -> Value {
    dispatch("RESUMED", seq, Value::Null)
}

pub fn dispatch(name: &str, seq: u64, data: Value) -> Value {
    json!({ "op": 0, "t": name, "s": seq, "d": data })
}

pub fn message_create(seq: u64, content: &str) -> Value {
    dispatch(
        "MESSAGE_CREATE",
        seq,
        json!({
            "id": "1100000000000000001",
            "channel_id": "41771983423143937",
            "author": { "id": "80351110224678912", "username": "nelly" },
            "content": content,
            "timestamp": "2024-05-01T12:00:00.000000+00:00",
            "edited_timestamp": null,
            "tts": false,
            "mention_everyone": false,
        }),
    )
}
