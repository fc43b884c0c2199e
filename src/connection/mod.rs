//! The `connection` module defines the hub's view of a live client.
//!
//! A [`Connection`] is a cheap, cloneable handle: the transport owns the
//! socket, the hub only holds the sending side of a per-connection channel.

pub mod handle;
pub use handle::{Connection, ConnectionId};
