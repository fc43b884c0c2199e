//! WebSocket transport
//!
//! Accepts TCP connections, upgrades them on the configured path and wires
//! each socket to the hub:
//! - a `Connection` is registered and greeted with a `welcome` message
//! - a write task drains the connection's channel into the socket
//! - the read loop feeds text frames to the dispatcher in receipt order
//!
//! Cleanup runs from a drop guard, so the hub forgets the connection on
//! every exit path of the read loop, including panics.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::Message as WsMessage;

use crate::config::ServerSettings;
use crate::connection::Connection;
use crate::hub::Hub;
use crate::transport::dispatcher::handle_client_message;
use crate::transport::message::ServerMessage;
use crate::utils::Result;

/// Bind the configured address and serve until the listener fails.
pub async fn start_websocket_server(settings: &ServerSettings, hub: Arc<Hub>) -> Result<()> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("WebSocket server listening on ws://{addr}{}", settings.path);

    serve(listener, hub, &settings.path).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, hub: Arc<Hub>, path: &str) {
    let path: Arc<str> = Arc::from(path);

    while let Ok((stream, peer)) = listener.accept().await {
        let hub = hub.clone();
        let path = path.clone();
        debug!("Accepted TCP connection from {peer}");
        spawn(async move {
            handle_connection(stream, hub, &path).await;
        });
    }

    warn!("WebSocket listener stopped accepting connections");
}

struct CloseGuard {
    hub: Arc<Hub>,
    conn: Connection,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.hub.on_connection_closed(&self.conn);
    }
}

async fn handle_connection(stream: TcpStream, hub: Arc<Hub>, path: &str) {
    let check_path = |req: &Request, resp: Response| {
        if req.uri().path() == path {
            Ok(resp)
        } else {
            let mut err = ErrorResponse::new(Some("not found".to_string()));
            *err.status_mut() = StatusCode::NOT_FOUND;
            Err(err)
        }
    };

    let ws_stream = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let conn = Connection::new(tx);
    hub.register_connection(conn.clone());
    let _guard = CloseGuard {
        hub: hub.clone(),
        conn: conn.clone(),
    };
    info!("{conn} connected");

    {
        // The write task ends once every sender clone is gone, i.e. after
        // the guard has removed the connection from the hub.
        let conn_id = conn.id().to_string();
        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!("Failed to send message to {conn_id}: {e}");
                    break;
                }
            }
            let _ = ws_sender.close().await;
            debug!("Send loop closed for {conn_id}");
        });
    }

    if let Err(e) = conn.send_json(&ServerMessage::welcome()) {
        warn!("Failed to greet {conn}: {e}");
    }

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => handle_client_message(&hub, &conn, text.as_str()),
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read error on {conn}: {e}");
                break;
            }
        }
    }

    info!("{conn} disconnected");
}
