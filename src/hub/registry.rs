//! Connection registry
//!
//! Tracks every live connection together with the set of topic names it is
//! subscribed to. Topic names do not have to be registered topics.

use std::collections::{HashMap, HashSet};

use crate::connection::{Connection, ConnectionId};

#[derive(Debug)]
struct Entry {
    conn: Connection,
    topics: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, Entry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with an empty subscription set. Adding the same
    /// connection twice keeps the existing subscriptions and returns `false`.
    pub fn add(&mut self, conn: Connection) -> bool {
        if self.entries.contains_key(conn.id()) {
            return false;
        }
        self.entries.insert(
            conn.id().to_string(),
            Entry {
                conn,
                topics: HashSet::new(),
            },
        );
        true
    }

    /// Drop the connection and hand back the topics it was subscribed to.
    /// Unknown or already removed connections yield an empty set.
    pub fn remove(&mut self, id: &str) -> HashSet<String> {
        self.entries
            .remove(id)
            .map(|entry| entry.topics)
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a subscription. `None` if the connection is not registered,
    /// otherwise whether the topic was newly added.
    pub fn insert_subscription(&mut self, id: &str, topic: &str) -> Option<bool> {
        let entry = self.entries.get_mut(id)?;
        Some(entry.topics.insert(topic.to_string()))
    }

    /// Forget a subscription. Returns `false` if it was not there.
    pub fn remove_subscription(&mut self, id: &str, topic: &str) -> bool {
        self.entries
            .get_mut(id)
            .is_some_and(|entry| entry.topics.remove(topic))
    }

    pub fn is_subscribed(&self, id: &str, topic: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.topics.contains(topic))
    }

    /// Connections subscribed to `topic` right now.
    pub fn snapshot(&self, topic: &str) -> Vec<Connection> {
        self.entries
            .values()
            .filter(|entry| entry.topics.contains(topic))
            .map(|entry| entry.conn.clone())
            .collect()
    }
}
