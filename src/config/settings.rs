use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub roku: RokuSettings,
    pub log: LogSettings,
}

/// Where the WebSocket endpoint listens.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Request path accepted during the WebSocket handshake.
    pub path: String,
}

/// The device polled by the `roku_power` topic.
#[derive(Debug, Deserialize, Clone)]
pub struct RokuSettings {
    /// Device address; `None` leaves the device unconfigured.
    pub host: Option<String>,
    pub port: u16,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from [`Settings::default`].
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub roku: Option<PartialRokuSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRokuSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                path: "/ws/app".to_string(),
            },
            roku: RokuSettings {
                host: None,
                port: 8060,
                timeout_ms: 2000,
                poll_interval_ms: 2000,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
