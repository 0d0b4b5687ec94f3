//! Client execution logic with reconnection support.

use rustyline::{DefaultEditor, error::ReadlineError};
use sitepulse_server::domain::SiteId;
use tokio::sync::mpsc;

use crate::error::ClientError;

use super::{
    domain::{MAX_RECONNECT_ATTEMPTS, reconnect_delay, should_attempt_reconnect},
    session::{SessionEnd, run_client_session},
    ui::PROMPT,
};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub token: String,
    /// Site to follow as soon as the first connection is up
    pub site: Option<SiteId>,
}

/// Reads lines on a dedicated thread; the editor outlives reconnects.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Run the live feed client with reconnection logic
///
/// Returns when the user quits, the token is rejected, or reconnecting
/// has failed `MAX_RECONNECT_ATTEMPTS` times in a row.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let mut input_rx = spawn_line_reader();
    let mut last_site = options.site;
    let mut failed_attempts: u32 = 0;

    loop {
        tracing::info!(
            "Connecting to {} (attempt {}/{})",
            options.url,
            failed_attempts + 1,
            MAX_RECONNECT_ATTEMPTS + 1
        );

        let error = match run_client_session(
            &options.url,
            &options.token,
            &mut last_site,
            &mut input_rx,
        )
        .await
        {
            Ok(SessionEnd::Quit) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => e,
        };

        // A session that got connected resets the backoff
        if error == ClientError::ConnectionLost {
            failed_attempts = 0;
        }

        if !should_attempt_reconnect(&error, failed_attempts, MAX_RECONNECT_ATTEMPTS) {
            if error != ClientError::Unauthorized {
                tracing::error!(
                    "Failed to reconnect after {} attempts. Exiting.",
                    MAX_RECONNECT_ATTEMPTS
                );
            }
            return Err(error);
        }

        let delay = reconnect_delay(failed_attempts);
        failed_attempts += 1;
        tracing::warn!("{}. Reconnecting in {:?}...", error, delay);
        tokio::time::sleep(delay).await;
    }
}
