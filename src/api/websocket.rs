//! WebSocket handler for live session participants

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::{caller, ApiError, AppState};
use crate::combat::CombatSession;
use crate::commands::{dispatch_key, Command, FocusTarget, KeyEvent, Shortcut};
use crate::sync::SessionFeed;

/// Sent before closing a socket whose user was removed from the session
const ACCESS_REVOKED: &str = "access revoked";

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full session document, on connect and after every committed change
    #[serde(rename = "session")]
    Session { session: CombatSession },
    /// The add-entity shortcut was pressed
    #[serde(rename = "open_add_form")]
    OpenAddForm,
    /// Error message
    #[serde(rename = "error")]
    Error { message: String },
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Run a session command
    #[serde(rename = "command")]
    Command { command: Command },
    /// A key press to resolve through the shortcut table
    #[serde(rename = "key")]
    Key {
        key: String,
        #[serde(default)]
        focus: FocusTarget,
    },
    /// Ping to keep connection alive
    #[serde(rename = "ping")]
    Ping,
}

/// Browsers cannot set headers on a WebSocket handshake
#[derive(Debug, Deserialize)]
pub struct WsParams {
    user: Option<String>,
}

/// Check access, then upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(e) => params
            .user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(e)?,
    };

    let feed = state.gateway.open(&session_id, &user).await?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, user, feed))
        .into_response())
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!("Failed to encode server message: {}", e);
            Ok(())
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    user: String,
    feed: SessionFeed,
) {
    let SessionFeed {
        controller,
        mut updates,
        revision,
    } = feed;
    let session = controller.into_session();
    let connection_id = uuid::Uuid::new_v4().to_string();
    let session_id = session.id.clone();
    let mut last_revision = revision;

    info!("{} connected to {} ({})", user, session_id, connection_id);

    if send(&mut socket, &ServerMessage::Session { session })
        .await
        .is_err()
    {
        drop(updates);
        state.gateway.hub().release(&session_id);
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        if update.revision <= last_revision {
                            continue;
                        }
                        last_revision = update.revision;
                        if !update.session.can_access(&user) {
                            info!("{} lost access to {}", user, session_id);
                            let msg = ServerMessage::Error { message: ACCESS_REVOKED.to_string() };
                            let _ = send(&mut socket, &msg).await;
                            break;
                        }
                        let msg = ServerMessage::Session { session: update.session };
                        if send(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("{} skipped {} updates on {}", connection_id, skipped, session_id);
                    }
                    Err(RecvError::Closed) => {
                        let msg = ServerMessage::Error { message: "session closed".to_string() };
                        let _ = send(&mut socket, &msg).await;
                        break;
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => {
                                handle_client_message(&state, &session_id, &user, &connection_id, msg).await
                            }
                            Err(e) => Some(ServerMessage::Error {
                                message: format!("invalid message: {}", e),
                            }),
                        };
                        if let Some(reply) = reply {
                            if send(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    drop(updates);
    state.gateway.hub().release(&session_id);
    info!("{} disconnected from {} ({})", user, session_id, connection_id);
}

/// Handle a message from the client. Committed changes come back
/// through the subscription, so only direct replies are returned.
async fn handle_client_message(
    state: &AppState,
    session_id: &str,
    user: &str,
    connection_id: &str,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    let command = match msg {
        ClientMessage::Command { command } => command,
        ClientMessage::Key { key, focus } => {
            match dispatch_key(&KeyEvent { key, focus })? {
                Shortcut::OpenAddForm => return Some(ServerMessage::OpenAddForm),
                shortcut => shortcut.command()?,
            }
        }
        ClientMessage::Ping => return None,
    };

    debug!("{} sent {} on {}", user, command.name(), session_id);

    match state
        .gateway
        .execute(session_id, user, command, Some(connection_id))
        .await
    {
        Ok(_) => None,
        Err(e) => Some(ServerMessage::Error {
            message: e.to_string(),
        }),
    }
}
