//! Client protocol dispatch
//!
//! Turns one inbound text frame into a hub operation. Nothing here can fail
//! the connection: malformed input is logged and dropped, unknown message
//! types are ignored.

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::hub::Hub;
use crate::transport::message::{ClientMessage, ServerMessage};

pub fn handle_client_message(hub: &Hub, conn: &Connection, raw: &str) {
    let msg = match serde_json::from_str::<ClientMessage>(raw) {
        Ok(msg) => msg,
        Err(err) => {
            warn!(
                "Invalid client message from {conn}: {err} | {}",
                raw.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    match msg {
        ClientMessage::Subscribe { topic } => {
            if let Some(topic) = non_empty(topic) {
                hub.subscribe(conn, &topic);
            }
        }
        ClientMessage::Unsubscribe { topic } => {
            if let Some(topic) = non_empty(topic) {
                hub.unsubscribe(conn, &topic);
            }
        }
        ClientMessage::Echo { data } => {
            if let Err(e) = conn.send_json(&ServerMessage::echo(data)) {
                warn!("Echo send error for {conn}: {e}");
            }
        }
        ClientMessage::Unknown => {
            debug!("Ignoring unknown message type from {conn}");
        }
    }
}

fn non_empty(topic: Option<String>) -> Option<String> {
    topic.filter(|t| !t.is_empty())
}
