//! Topic drivers: background sources of events for registered topics.
//!
//! A driver registers its topic with the hub and starts its work lazily,
//! from the topic's first-subscribe hook.

pub mod roku_power;

pub use roku_power::{PowerStateDriver, TOPIC_NAME as ROKU_POWER};

use crate::device::{POWER_OFFLINE, RokuClient};

/// Something a driver can poll for the current state.
///
/// Implementations never fail: errors are reported as sentinel values so
/// that the driver only ever compares strings.
pub trait StateSource: Send + Sync + 'static {
    fn query_state(&self) -> impl Future<Output = String> + Send;
}

impl StateSource for RokuClient {
    async fn query_state(&self) -> String {
        self.query_power_mode().await
    }
}

/// Stands in for a device that was never configured; always offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl StateSource for Unconfigured {
    async fn query_state(&self) -> String {
        POWER_OFFLINE.to_string()
    }
}

#[cfg(test)]
mod tests;
