//! The `transport` module handles network communication with clients over
//! WebSockets.
//!
//! It defines the JSON protocol exchanged with clients, the dispatcher that
//! maps inbound messages onto hub operations, and the server itself.

pub mod dispatcher;
pub mod message;
pub mod websocket;

pub use dispatcher::handle_client_message;
pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};
