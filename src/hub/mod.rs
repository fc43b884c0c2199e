//! The hub: connection registry, topic registry and the subscription
//! engine that keeps the two consistent.
//!
//! Public types:
//! - `Hub`: subscribe/unsubscribe/broadcast and connection cleanup.
//! - `TopicHooks`: lifecycle callbacks supplied when a topic is registered.

pub mod engine;
pub mod registry;
pub mod topic;

pub use engine::Hub;
pub use topic::{HookResult, TopicHooks};
