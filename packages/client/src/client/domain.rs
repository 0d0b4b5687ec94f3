//! Domain logic for client-side operations.
//!
//! Pure functions for the reconnect policy and token selection.

use std::time::Duration;

use sitepulse_server::{domain::UserId, infrastructure::auth::issue_token};

use crate::error::ClientError;

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(500);
/// Lifetime of tokens minted from `--secret`
pub const DEV_TOKEN_TTL_MINUTES: i64 = 60;

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Unauthorized | ClientError::TokenError(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// `current_attempt` counts failed attempts since the last successful connection.
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Delay before reconnect attempt `attempt` (0-indexed): 500ms × 2^attempt
pub fn reconnect_delay(attempt: u32) -> Duration {
    RECONNECT_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt))
}

/// Use `token` as-is, or mint a short-lived one from `secret` and `user_id`
pub fn resolve_token(
    token: Option<String>,
    secret: Option<&str>,
    user_id: Option<&str>,
) -> Result<String, ClientError> {
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        return Ok(token);
    }

    match (secret, user_id) {
        (Some(secret), Some(user_id)) => {
            let user_id = UserId::new(user_id.to_string())
                .map_err(|e| ClientError::TokenError(e.to_string()))?;
            issue_token(
                secret,
                &user_id,
                chrono::Duration::minutes(DEV_TOKEN_TTL_MINUTES),
            )
            .map_err(|e| ClientError::TokenError(e.to_string()))
        }
        _ => Err(ClientError::TokenError(
            "pass --token, or --secret together with --user-id".to_string(),
        )),
    }
}
