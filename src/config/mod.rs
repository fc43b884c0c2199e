mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{LogSettings, RokuSettings, ServerSettings, Settings};

/// Environment variable consulted when `roku.host` is not set.
pub const ROKU_IP_VAR: &str = "ROKU_IP";

/// Loads the configuration from `config/default` and `TVHUB_*` environment
/// variables (`TVHUB_ROKU__POLL_INTERVAL_MS=500`), then merges it over the
/// defaults. A `.env` file in the working directory is read first.
pub fn load_config() -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("TVHUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(merge(partial))
}

fn merge(partial: PartialSettings) -> Settings {
    let default = Settings::default();
    let server = partial.server.as_ref();
    let roku = partial.roku.as_ref();

    Settings {
        server: ServerSettings {
            host: server
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server.and_then(|s| s.port).unwrap_or(default.server.port),
            path: server
                .and_then(|s| s.path.clone())
                .unwrap_or(default.server.path),
        },
        roku: RokuSettings {
            host: roku
                .and_then(|r| r.host.clone())
                .or_else(|| std::env::var(ROKU_IP_VAR).ok())
                .filter(|h| !h.trim().is_empty()),
            port: roku.and_then(|r| r.port).unwrap_or(default.roku.port),
            timeout_ms: roku
                .and_then(|r| r.timeout_ms)
                .unwrap_or(default.roku.timeout_ms),
            poll_interval_ms: roku
                .and_then(|r| r.poll_interval_ms)
                .unwrap_or(default.roku.poll_interval_ms),
        },
        log: LogSettings {
            level: partial
                .log
                .and_then(|l| l.level)
                .unwrap_or(default.log.level),
        },
    }
}
