//! Topic registry
//!
//! A `Topic` is registered once at startup with a `TopicHooks` record and
//! lives for the rest of the process. The registry also keeps the running
//! subscriber count and the `started` flag that guards first-subscribe
//! activation.
//!
//! Concurrency note: the registry itself is not synchronized; the hub keeps
//! it behind the same lock as the connection registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::connection::Connection;
use crate::utils::HubError;

pub type HookResult = Result<(), HubError>;

/// Called once, the first time a topic ever gains a subscriber.
pub type FirstSubscribeHook = Arc<dyn Fn() -> HookResult + Send + Sync>;

/// Called with the connection that subscribed or unsubscribed.
pub type ConnectionHook = Arc<dyn Fn(&Connection) -> HookResult + Send + Sync>;

/// Lifecycle callbacks for one topic. All of them are optional.
#[derive(Clone, Default)]
pub struct TopicHooks {
    pub on_first_subscribe: Option<FirstSubscribeHook>,
    pub on_subscribe: Option<ConnectionHook>,
    pub on_unsubscribe: Option<ConnectionHook>,
}

impl TopicHooks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_first_subscribe<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.on_first_subscribe = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_subscribe<F>(mut self, f: F) -> Self
    where
        F: Fn(&Connection) -> HookResult + Send + Sync + 'static,
    {
        self.on_subscribe = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_unsubscribe<F>(mut self, f: F) -> Self
    where
        F: Fn(&Connection) -> HookResult + Send + Sync + 'static,
    {
        self.on_unsubscribe = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for TopicHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicHooks")
            .field("on_first_subscribe", &self.on_first_subscribe.is_some())
            .field("on_subscribe", &self.on_subscribe.is_some())
            .field("on_unsubscribe", &self.on_unsubscribe.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct Topic {
    pub name: String,
    pub hooks: TopicHooks,
    /// Set the first time the subscriber count leaves zero. Never reset.
    pub started: bool,
    pub subscribers: usize,
}

impl Topic {
    pub fn new(name: &str, hooks: TopicHooks) -> Self {
        Self {
            name: name.to_string(),
            hooks,
            started: false,
            subscribers: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: HashMap<String, Topic>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with `hooks`. Returns `false` and leaves the existing
    /// entry untouched if the name is already taken.
    pub fn register(&mut self, name: &str, hooks: TopicHooks) -> bool {
        if self.topics.contains_key(name) {
            return false;
        }
        self.topics.insert(name.to_string(), Topic::new(name, hooks));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// Current subscriber count; 0 for unregistered names.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.topics.get(name).map_or(0, |t| t.subscribers)
    }

    /// Bump the count and return the value it had before, or `None` if the
    /// topic is not registered.
    pub fn increment(&mut self, name: &str) -> Option<usize> {
        let topic = self.topics.get_mut(name)?;
        let prev = topic.subscribers;
        topic.subscribers += 1;
        Some(prev)
    }

    /// Lower the count, never below zero.
    pub fn decrement(&mut self, name: &str) {
        if let Some(topic) = self.topics.get_mut(name) {
            topic.subscribers = topic.subscribers.saturating_sub(1);
        }
    }

    /// Flip `started` on. Returns `true` only for the call that flipped it.
    pub fn mark_started(&mut self, name: &str) -> bool {
        match self.topics.get_mut(name) {
            Some(topic) if !topic.started => {
                topic.started = true;
                true
            }
            _ => false,
        }
    }
}
