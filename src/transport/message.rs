use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client may send. Unrecognized `type` values parse as
/// [`ClientMessage::Unknown`] so newer clients never break older servers.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        topic: Option<String>,
    },
    Unsubscribe {
        #[serde(default)]
        topic: Option<String>,
    },
    Echo {
        #[serde(default)]
        data: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        message: String,
        ts: String,
    },
    Echo {
        data: Value,
        ts: String,
    },
    PowerState {
        #[serde(rename = "powerMode")]
        power_mode: String,
        ts: String,
    },
}

impl ServerMessage {
    /// Greeting sent once right after the handshake.
    pub fn welcome() -> Self {
        Self::Welcome {
            message: "connected".to_string(),
            ts: timestamp(),
        }
    }

    pub fn echo(data: Value) -> Self {
        Self::Echo {
            data,
            ts: timestamp(),
        }
    }

    pub fn power_state(power_mode: impl Into<String>) -> Self {
        Self::PowerState {
            power_mode: power_mode.into(),
            ts: timestamp(),
        }
    }
}

/// Current time as ISO-8601 in UTC, e.g. `2025-01-01T12:00:00.123456+00:00`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
