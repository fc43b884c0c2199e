//! Subscription hub
//!
//! The hub owns the connection registry and the topic registry behind one
//! lock, so a subscription and the subscriber count it contributes to are
//! always updated together.
//!
//! Concurrency and usage notes:
//! - All methods take `&self`; share the hub as `Arc<Hub>`.
//! - Lifecycle hooks run after the lock is released. A hook may call back
//!   into the hub (subscribe elsewhere, broadcast) without deadlocking, at
//!   the price of seeing state that may already have moved on.
//! - `broadcast` snapshots the subscribers under the lock and sends outside
//!   it. Sends only push into the per-connection channel and never block.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::connection::Connection;
use crate::hub::registry::ConnectionRegistry;
use crate::hub::topic::{ConnectionHook, HookResult, TopicHooks, TopicRegistry};

#[derive(Debug, Default)]
struct HubState {
    connections: ConnectionRegistry,
    topics: TopicRegistry,
}

#[derive(Debug, Default)]
pub struct Hub {
    state: Mutex<HubState>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic and its hooks. Re-registering a name is a no-op
    /// that keeps the original hooks and counters.
    pub fn register_topic(&self, name: &str, hooks: TopicHooks) -> bool {
        let inserted = self.state.lock().topics.register(name, hooks);
        if inserted {
            info!("Registered topic {name}");
        } else {
            debug!("Topic {name} already registered; keeping existing hooks");
        }
        inserted
    }

    /// Start tracking a freshly opened connection.
    pub fn register_connection(&self, conn: Connection) {
        let id = conn.id().to_string();
        if self.state.lock().connections.add(conn) {
            debug!("Registered connection {id}");
        }
    }

    /// Subscribe `conn` to `topic`.
    ///
    /// Unregistered topic names are recorded so that broadcasts can still
    /// target them, but they have no hooks and no subscriber count. A repeat
    /// subscribe does not count twice, but `on_subscribe` runs again.
    pub fn subscribe(&self, conn: &Connection, topic: &str) {
        let mut fire_first = None;
        let on_subscribe;

        {
            let mut state = self.state.lock();
            let newly = match state.connections.insert_subscription(conn.id(), topic) {
                Some(newly) => newly,
                None => {
                    debug!("Ignoring subscribe from unregistered connection {conn}");
                    return;
                }
            };

            let Some(entry) = state.topics.get(topic) else {
                info!("{conn} subscribed to unknown topic {topic}");
                return;
            };
            let hooks = entry.hooks.clone();

            if newly && state.topics.increment(topic) == Some(0) && state.topics.mark_started(topic)
            {
                fire_first = hooks.on_first_subscribe;
            }
            on_subscribe = hooks.on_subscribe;
        }

        info!("{conn} subscribed to {topic}");

        if let Some(hook) = fire_first {
            run_hook(topic, "on_first_subscribe", || hook());
        }
        if let Some(hook) = on_subscribe {
            run_hook(topic, "on_subscribe", || hook(conn));
        }
    }

    /// Remove `conn` from `topic`. No-op if it was not subscribed.
    pub fn unsubscribe(&self, conn: &Connection, topic: &str) {
        let on_unsubscribe = {
            let mut state = self.state.lock();
            if !state.connections.remove_subscription(conn.id(), topic) {
                return;
            }
            state.topics.decrement(topic);
            state
                .topics
                .get(topic)
                .and_then(|t| t.hooks.on_unsubscribe.clone())
        };

        info!("{conn} unsubscribed from {topic}");

        if let Some(hook) = on_unsubscribe {
            run_hook(topic, "on_unsubscribe", || hook(conn));
        }
    }

    /// Send `payload` to every connection subscribed to `topic`.
    ///
    /// Connections whose send fails are removed afterwards, exactly as if
    /// they had disconnected. Returns the number of successful deliveries.
    pub fn broadcast<T: Serialize + ?Sized>(&self, topic: &str, payload: &T) -> usize {
        let text = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize payload for {topic}: {e}");
                return 0;
            }
        };
        let ws_msg = WsMessage::text(text);

        let targets = self.state.lock().connections.snapshot(topic);

        let mut delivered = 0;
        let mut dead = Vec::new();
        for conn in targets {
            match conn.send(ws_msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Dropping connection during broadcast to {topic}: {e}");
                    dead.push(conn);
                }
            }
        }

        for conn in &dead {
            self.on_connection_closed(conn);
        }

        debug!("Broadcast to {topic}: {delivered} delivered, {} dead", dead.len());
        delivered
    }

    /// Forget `conn` and run unsubscribe side effects for everything it was
    /// subscribed to. Safe to call more than once.
    pub fn on_connection_closed(&self, conn: &Connection) {
        let hooks: Vec<(String, ConnectionHook)> = {
            let mut state = self.state.lock();
            let topics = state.connections.remove(conn.id());
            let mut hooks = Vec::new();
            for topic in topics {
                let Some(entry) = state.topics.get(&topic) else {
                    continue;
                };
                let hook = entry.hooks.on_unsubscribe.clone();
                state.topics.decrement(&topic);
                if let Some(hook) = hook {
                    hooks.push((topic, hook));
                }
            }
            hooks
        };

        for (topic, hook) in hooks {
            run_hook(&topic, "on_unsubscribe", || hook(conn));
        }

        debug!("Cleaned up connection {conn}");
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.state.lock().topics.subscriber_count(topic)
    }

    pub fn connection_count(&self) -> usize {
        self.state.lock().connections.len()
    }

    pub fn is_subscribed(&self, conn: &Connection, topic: &str) -> bool {
        self.state.lock().connections.is_subscribed(conn.id(), topic)
    }

    pub fn is_registered(&self, conn: &Connection) -> bool {
        self.state.lock().connections.contains(conn.id())
    }

    /// Whether `topic` has ever had its first-subscribe activation.
    pub fn topic_started(&self, topic: &str) -> bool {
        self.state.lock().topics.get(topic).is_some_and(|t| t.started)
    }
}

/// Run one hook, logging errors and panics instead of propagating them.
fn run_hook(topic: &str, kind: &str, hook: impl FnOnce() -> HookResult) {
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("{kind} error for {topic}: {e}"),
        Err(panic) => error!("{kind} panicked for {topic}: {}", panic_message(&*panic)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
