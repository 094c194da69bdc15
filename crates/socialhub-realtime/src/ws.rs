//! WebSocket endpoint: `GET /ws?token=…&device_id=…`.
//!
//! The access token is verified before the upgrade. After that the socket
//! is split: a writer task forwards the connection's outbound buffer as
//! JSON text frames while this task reads client frames.

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{error, info, warn};

use socialhub_core::error::AppError;

use crate::connection::authenticator::{AuthenticatedConnection, WsAuthenticator};
use crate::connection::handle::ConnectionHandle;
use crate::message::handler::InboundHandler;
use crate::message::serializer::{deserialize_inbound, serialize_outbound};
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::server::RealtimeEngine;

/// Shared state of the WebSocket endpoint.
#[derive(Clone)]
pub struct WsState {
    /// Realtime engine.
    pub engine: RealtimeEngine,
    /// Access token check.
    pub authenticator: WsAuthenticator,
    /// Handler for state-changing client frames.
    pub inbound: Arc<dyn InboundHandler>,
}

impl std::fmt::Debug for WsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsState").finish_non_exhaustive()
    }
}

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Access token.
    pub token: String,
    /// Device the client connects from; must match the token when given.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Router exposing the WebSocket endpoint.
pub fn router(state: WsState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// GET /ws: authenticate, then upgrade.
pub async fn ws_handler(
    State(state): State<WsState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let auth = state
        .authenticator
        .authenticate(&query.token, query.device_id.as_deref())?;

    Ok(ws.on_upgrade(move |socket| handle_socket(state, auth, socket)))
}

async fn handle_socket(state: WsState, auth: AuthenticatedConnection, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = state.engine.connect(auth.user_id, &auth.device_id);
    let conn_id = handle.id;

    let writer_handle = Arc::clone(&handle);
    let mut writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = outbound_rx.recv() => {
                    let Some(msg) = msg else { break };
                    match serialize_outbound(&msg) {
                        Ok(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(error = %e, "Failed to serialize outbound frame"),
                    }
                }
                _ = writer_handle.closed() => break,
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_inbound(&state, &handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();
    state.engine.disconnect(&conn_id);

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "WebSocket connection closed"
    );
}

async fn handle_inbound(state: &WsState, handle: &ConnectionHandle, raw: &str) {
    let msg = match deserialize_inbound(raw) {
        Ok(msg) => msg,
        Err(e) => {
            let _ = handle.push(OutboundMessage::error(
                "INVALID_MESSAGE",
                format!("Failed to parse message: {e}"),
            ));
            return;
        }
    };

    let result = match msg {
        InboundMessage::MarkRead { notification_id } => {
            state.inbound.mark_read(handle.user_id, notification_id).await
        }
        InboundMessage::MarkAllRead => state.inbound.mark_all_read(handle.user_id).await,
        InboundMessage::Ping { timestamp } => {
            let _ = handle.push(OutboundMessage::Pong { timestamp });
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(conn_id = %handle.id, error = %e, "Inbound frame failed");
        let message = if e.kind.is_server() {
            "Internal server error".to_string()
        } else {
            e.message
        };
        let _ = handle.push(OutboundMessage::error(e.kind.to_string(), message));
    }
}
