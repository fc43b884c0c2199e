//! Error types for `tvhub`.
//!
//! Each concern gets its own enum. The hub never lets these escape a
//! broadcast or a lifecycle hook; they are logged at the call site.
//! Bootstrap code bubbles them up through [`Error`].

use thiserror::Error;

/// Top-level error used by process bootstrap and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Failures inside the subscription hub and its hooks.
#[derive(Debug, Error)]
pub enum HubError {
    /// A payload could not be turned into JSON.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The connection's outbound channel has been dropped.
    #[error("connection {0} is closed")]
    ConnectionClosed(String),

    /// A lifecycle hook reported a failure of its own.
    #[error("hook failed: {0}")]
    Hook(String),
}

/// Failures talking to the remote device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device host was configured.
    #[error("device host is not configured (set roku.host or ROKU_IP)")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with a non-success status.
    #[error("{action} failed with status {status}: {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
