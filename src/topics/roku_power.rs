//! The `roku_power` topic
//!
//! Polls the TV's power mode at a fixed interval and broadcasts a
//! `power_state` event whenever it changes. New subscribers get the last
//! known value straight away.
//!
//! Two independent single-shot guards apply: the hub fires the
//! first-subscribe hook once, and the driver itself refuses to start a
//! second poll loop. If the first-subscribe hook ran outside a tokio
//! runtime, later subscribes start the loop instead. The loop has no cancellation path; it lives until the
//! process exits or the hub is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::hub::{HookResult, Hub, TopicHooks};
use crate::topics::StateSource;
use crate::transport::message::ServerMessage;
use crate::utils::HubError;

pub const TOPIC_NAME: &str = "roku_power";

#[derive(Debug)]
pub struct PowerStateDriver<S> {
    source: S,
    interval: Duration,
    last_known: RwLock<Option<String>>,
    poller_started: AtomicBool,
    hub: Weak<Hub>,
}

impl<S: StateSource> PowerStateDriver<S> {
    /// Create the driver and register [`TOPIC_NAME`] with `hub`.
    pub fn register(hub: &Arc<Hub>, source: S, interval: Duration) -> Arc<Self> {
        let driver = Arc::new(Self {
            source,
            interval,
            last_known: RwLock::new(None),
            poller_started: AtomicBool::new(false),
            hub: Arc::downgrade(hub),
        });

        let on_first = driver.clone();
        let on_subscribe = driver.clone();
        let hooks = TopicHooks::new()
            .on_first_subscribe(move || on_first.start_poller().map(|_| ()))
            .on_subscribe(move |conn| {
                // first-subscribe fires once; retry if it found no runtime
                if !on_subscribe.poller_started() {
                    on_subscribe.start_poller()?;
                }
                on_subscribe.catch_up(conn)
            });

        hub.register_topic(TOPIC_NAME, hooks);
        driver
    }

    pub fn last_known(&self) -> Option<String> {
        self.last_known.read().clone()
    }

    pub fn poller_started(&self) -> bool {
        self.poller_started.load(Ordering::SeqCst)
    }

    /// Spawn the poll loop on the current tokio runtime. Returns `Ok(false)`
    /// if it is already running.
    pub fn start_poller(self: &Arc<Self>) -> Result<bool, HubError> {
        let handle = Handle::try_current()
            .map_err(|e| HubError::Hook(format!("cannot start {TOPIC_NAME} poller: {e}")))?;

        if self.poller_started.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        handle.spawn(self.clone().poll_loop());
        Ok(true)
    }

    async fn poll_loop(self: Arc<Self>) {
        info!("Polling {TOPIC_NAME} every {:?}", self.interval);

        loop {
            let mode = self.source.query_state().await;

            let Some(hub) = self.hub.upgrade() else {
                debug!("Hub dropped; {TOPIC_NAME} poller exiting");
                return;
            };
            self.observe(&hub, mode);
            drop(hub);

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Record a polled value and broadcast it if it differs from the last
    /// one. Returns whether it changed.
    pub fn observe(&self, hub: &Hub, mode: String) -> bool {
        {
            let mut last = self.last_known.write();
            if last.as_deref() == Some(mode.as_str()) {
                return false;
            }
            *last = Some(mode.clone());
        }

        info!("{TOPIC_NAME} changed to {mode}");
        hub.broadcast(TOPIC_NAME, &ServerMessage::power_state(mode));
        true
    }

    /// Send the last known state to a new subscriber only.
    fn catch_up(&self, conn: &Connection) -> HookResult {
        let Some(mode) = self.last_known() else {
            return Ok(());
        };
        conn.send_json(&ServerMessage::power_state(mode))
    }
}
