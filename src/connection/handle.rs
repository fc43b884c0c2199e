use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::utils::HubError;

pub type ConnectionId = String;

/// Handle to one connected WebSocket client.
///
/// Two handles are equal only if they were cloned from the same
/// [`Connection::new`] call.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<WsMessage>,
}

impl Connection {
    /// Create a handle around the outbound channel of a new client.
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            sender,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True once the write side of the connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue a frame for the write loop.
    pub fn send(&self, msg: WsMessage) -> Result<(), HubError> {
        self.sender
            .send(msg)
            .map_err(|_| HubError::ConnectionClosed(self.id.clone()))
    }

    /// Queue an already serialized text frame.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), HubError> {
        self.send(WsMessage::text(text.into()))
    }

    /// Serialize `payload` and queue it as a text frame.
    pub fn send_json<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), HubError> {
        let text = serde_json::to_string(payload)?;
        self.send_text(text)
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
