//! WebSocket gateway handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::{
        CLOSE_UNAUTHORIZED, ClientCommand, ConnectedMessage, ErrorMessage, MSG_UNAUTHORIZED,
        SubscribedMessage, UnsubscribedMessage,
    },
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Authentication happens on the open socket: a rejected client receives an
/// error frame followed by close code 4401.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.token))
}

fn to_json<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize outgoing frame: {}", e);
            None
        }
    }
}

async fn reject_unauthorized(mut socket: WebSocket) {
    if let Some(json) = to_json(&ErrorMessage::new(MSG_UNAUTHORIZED)) {
        let _ = socket.send(Message::Text(json.into())).await;
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_UNAUTHORIZED,
            reason: MSG_UNAUTHORIZED.to_string().into(),
        })))
        .await;
}

/// Forwards queued frames for this connection to its socket until either side closes.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Reads control messages until the client goes away.
///
/// Every text frame gets exactly one reply, queued behind any broadcast
/// frames already waiting for this connection.
async fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    reply_tx: mpsc::Sender<String>,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                tracing::debug!("Client '{}' requested close", connection_id);
                break;
            }
            _ => continue,
        };
        tracing::debug!("Received from '{}': {}", connection_id, text.as_str());

        let reply = handle_command(&state, &connection_id, text.as_str()).await;
        let Some(reply) = reply else { continue };
        if reply_tx.send(reply).await.is_err() {
            break;
        }
    }
}

async fn handle_command(
    state: &AppState,
    connection_id: &ConnectionId,
    text: &str,
) -> Option<String> {
    let command = match ClientCommand::parse(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!("Rejected message from '{}': {:?}", connection_id, e);
            return to_json(&ErrorMessage::new(e.message()));
        }
    };

    let usecase = &state.update_subscription_usecase;
    match command {
        ClientCommand::Subscribe { site_id, requested } => {
            match usecase.subscribe(connection_id, site_id).await {
                Ok(()) => {
                    tracing::info!("Connection '{}' subscribed to site {}", connection_id, site_id);
                    to_json(&SubscribedMessage::new(requested))
                }
                Err(e) => {
                    tracing::warn!("Subscribe failed: {}", e);
                    None
                }
            }
        }
        ClientCommand::Unsubscribe => match usecase.unsubscribe(connection_id).await {
            Ok(previous) => {
                match previous {
                    Some(site_id) => tracing::info!(
                        "Connection '{}' unsubscribed from site {}",
                        connection_id,
                        site_id
                    ),
                    None => tracing::debug!("Connection '{}' was not subscribed", connection_id),
                }
                to_json(&UnsubscribedMessage::default())
            }
            Err(e) => {
                tracing::warn!("Unsubscribe failed: {}", e);
                None
            }
        },
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, token: Option<String>) {
    let (tx, rx) = mpsc::channel(state.client_buffer);
    let reply_tx = tx.clone();

    let client = match state
        .connect_client_usecase
        .execute(token.as_deref(), tx)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            reject_unauthorized(socket).await;
            return;
        }
    };
    let connection_id = client.connection_id;
    tracing::info!(
        "Connection '{}' opened by user '{}'",
        connection_id,
        client.user.user_id
    );

    let (sender, receiver) = socket.split();

    // 購読前なのでキューは空。connected が最初のフレームになる
    let connected = to_json(&ConnectedMessage::new(client.user.user_id.as_str()));
    let sent = match connected {
        Some(json) => state.registry.push_to(&connection_id, &json).await.is_ok(),
        None => false,
    };

    if sent {
        let mut send_task = pusher_loop(rx, sender);
        let mut recv_task = tokio::spawn(receive_loop(
            receiver,
            state.clone(),
            connection_id,
            reply_tx,
        ));

        // If any one of the tasks completes, abort the other
        tokio::select! {
            _ = &mut recv_task => send_task.abort(),
            _ = &mut send_task => recv_task.abort(),
        };
    }

    if state.disconnect_client_usecase.execute(&connection_id).await {
        tracing::info!("Connection '{}' closed and unregistered", connection_id);
    }
}
