//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use sitepulse_server::{
    domain::SiteId,
    infrastructure::dto::websocket::{CLOSE_UNAUTHORIZED, ClientCommand},
};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::error::ClientError;

use super::{
    command::{HELP, InputCommand},
    formatter::{MessageFormatter, ServerFrame},
    ui::redisplay_prompt,
};

/// How a session ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `quit` or closed stdin
    Quit,
}

/// Why the read side stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadOutcome {
    Unauthorized,
    Closed,
}

pub fn connection_url(base: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", base, separator, token)
}

/// Run one connection until the user quits or the connection is lost
///
/// `last_site` is re-subscribed right after connecting and tracks the
/// user's `sub` / `unsub` commands so the next session can restore it.
pub async fn run_client_session(
    url: &str,
    token: &str,
    last_site: &mut Option<SiteId>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(connection_url(url, token))
        .await
        .map_err(|e| match e {
            WsError::Http(response) if response.status().as_u16() == 401 => {
                ClientError::Unauthorized
            }
            other => ClientError::ConnectionError(other.to_string()),
        })?;
    tracing::info!("Connected to {}", url);

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming frames
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let frame = ServerFrame::parse(text.as_str());
                    print!("{}", MessageFormatter::format(&frame));
                    redisplay_prompt();
                    if frame.is_unauthorized() {
                        return ReadOutcome::Unauthorized;
                    }
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt();
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed the connection");
                    let unauthorized =
                        frame.is_some_and(|f| u16::from(f.code) == CLOSE_UNAUTHORIZED);
                    return if unauthorized {
                        ReadOutcome::Unauthorized
                    } else {
                        ReadOutcome::Closed
                    };
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return ReadOutcome::Closed;
                }
                _ => {}
            }
        }
        ReadOutcome::Closed
    });

    if let Some(site_id) = *last_site {
        tracing::info!("Re-subscribing to site {}", site_id);
        let command = ClientCommand::subscribe(site_id);
        if write
            .send(Message::Text(command.to_json().into()))
            .await
            .is_err()
        {
            read_task.abort();
            return Err(ClientError::ConnectionLost);
        }
    }

    loop {
        tokio::select! {
            outcome = &mut read_task => {
                return match outcome {
                    Ok(ReadOutcome::Unauthorized) => Err(ClientError::Unauthorized),
                    _ => Err(ClientError::ConnectionLost),
                };
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    let _ = write.send(Message::Close(None)).await;
                    read_task.abort();
                    return Ok(SessionEnd::Quit);
                };

                let command = match InputCommand::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message);
                        redisplay_prompt();
                        continue;
                    }
                };

                let outgoing = match command {
                    InputCommand::Subscribe(site_id) => {
                        *last_site = Some(site_id);
                        ClientCommand::subscribe(site_id)
                    }
                    InputCommand::Unsubscribe => {
                        *last_site = None;
                        ClientCommand::Unsubscribe
                    }
                    InputCommand::Help => {
                        print!("{}", HELP);
                        redisplay_prompt();
                        continue;
                    }
                    InputCommand::Quit => {
                        let _ = write.send(Message::Close(None)).await;
                        read_task.abort();
                        return Ok(SessionEnd::Quit);
                    }
                };

                if let Err(e) = write.send(Message::Text(outgoing.to_json().into())).await {
                    tracing::warn!("Failed to send command: {}", e);
                    read_task.abort();
                    return Err(ClientError::ConnectionLost);
                }
            }
        }
    }
}
