use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::RokuSettings;
use crate::utils::DeviceError;

/// Reported when the device cannot be reached or answers with an error.
pub const POWER_OFFLINE: &str = "offline";

/// Reported when the device answers but the power mode cannot be read.
pub const POWER_UNKNOWN: &str = "unknown";

/// HTTP client for one Roku device.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tvhub::device::RokuClient;
///
/// # async fn example() -> Result<(), tvhub::utils::DeviceError> {
/// let roku = RokuClient::new("192.168.1.40", 8060, Duration::from_secs(2))?;
/// println!("{}", roku.query_power_mode().await);
/// roku.power_toggle().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RokuClient {
    base_url: String,
    client: Client,
}

impl RokuClient {
    pub const DEFAULT_PORT: u16 = 8060;

    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, DeviceError> {
        Self::with_base_url(format!("http://{host}:{port}"), timeout)
    }

    /// Build a client against an explicit base URL such as
    /// `http://10.0.0.2:8060`.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeviceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// # Errors
    ///
    /// Returns [`DeviceError::NotConfigured`] when no host is set.
    pub fn from_settings(settings: &RokuSettings) -> Result<Self, DeviceError> {
        let host = settings
            .host
            .as_deref()
            .ok_or(DeviceError::NotConfigured)?;
        Self::new(
            host,
            settings.port,
            Duration::from_millis(settings.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current power mode: `PowerOn`, `DisplayOff`, `PowerStandby`, or one
    /// of the sentinels.
    pub async fn query_power_mode(&self) -> String {
        let url = format!("{}/query/device-info", self.base_url);

        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("device-info request failed: {e}");
                return POWER_OFFLINE.to_string();
            }
        };

        if !resp.status().is_success() {
            debug!("device-info returned {}", resp.status());
            return POWER_OFFLINE.to_string();
        }

        match resp.text().await {
            Ok(body) => parse_power_mode(&body),
            Err(e) => {
                debug!("device-info body could not be read: {e}");
                POWER_OFFLINE.to_string()
            }
        }
    }

    /// Press one remote key, e.g. `Home`, `PowerOn`, `VolumeUp`.
    pub async fn keypress(&self, key: &str) -> Result<(), DeviceError> {
        let url = format!("{}/keypress/{key}", self.base_url);
        let resp = self.client.post(&url).send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DeviceError::Status {
            action: format!("keypress {key}"),
            status: status.as_u16(),
            body,
        })
    }

    pub async fn power_on(&self) -> Result<(), DeviceError> {
        self.keypress("PowerOn").await
    }

    pub async fn power_off(&self) -> Result<(), DeviceError> {
        self.keypress("PowerOff").await
    }

    pub async fn power_toggle(&self) -> Result<(), DeviceError> {
        self.keypress("Power").await
    }

    pub async fn volume_up(&self, steps: u32) -> Result<(), DeviceError> {
        self.repeat("VolumeUp", steps).await
    }

    pub async fn volume_down(&self, steps: u32) -> Result<(), DeviceError> {
        self.repeat("VolumeDown", steps).await
    }

    pub async fn volume_mute(&self) -> Result<(), DeviceError> {
        self.keypress("VolumeMute").await
    }

    async fn repeat(&self, key: &str, times: u32) -> Result<(), DeviceError> {
        for _ in 0..times {
            self.keypress(key).await?;
        }
        Ok(())
    }
}

/// Read `<power-mode>` from a `device-info` document.
///
/// The element must be a direct child of the root. A body that is not
/// well-formed XML, or has no non-empty `<power-mode>`, gives
/// [`POWER_UNKNOWN`].
pub fn parse_power_mode(body: &str) -> String {
    let doc = match roxmltree::Document::parse(body) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("device-info is not valid XML: {e}");
            return POWER_UNKNOWN.to_string();
        }
    };

    doc.root_element()
        .children()
        .find(|node| node.has_tag_name("power-mode"))
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| POWER_UNKNOWN.to_string(), str::to_string)
}
