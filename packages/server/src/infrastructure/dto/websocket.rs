//! WebSocket message DTOs
//!
//! Server → client frames carry a `type` discriminator; client → server frames
//! carry an `action` discriminator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::SiteId;

pub const MSG_UNAUTHORIZED: &str = "Unauthorized";
pub const MSG_INVALID_JSON: &str = "Invalid JSON payload";
pub const MSG_UNSUPPORTED_ACTION: &str = "Unsupported action";
pub const MSG_INVALID_SITE_ID: &str = "Invalid siteId";
pub const MSG_OVERCROWDING: &str = "Overcrowding detected";
pub const MSG_SURGE: &str = "Sudden visitor surge";

/// Close code sent after a failed token check
pub const CLOSE_UNAUTHORIZED: u16 = 4401;

/// Discriminator of server → client frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Connected,
    Subscribed,
    Unsubscribed,
    ZoneUpdate,
    CriticalAlert,
    SurgeAlert,
    Error,
}

/// Just the discriminator, used to dispatch an incoming frame
#[derive(Debug, Deserialize)]
pub struct MessageEnvelope {
    pub r#type: MessageType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: MessageType,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl ConnectedMessage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Connected,
            user_id: user_id.into(),
        }
    }
}

/// `siteId` is echoed in the form the client sent it (number or string)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribedMessage {
    pub r#type: MessageType,
    #[serde(rename = "siteId")]
    pub site_id: Value,
}

impl SubscribedMessage {
    pub fn new(requested: Value) -> Self {
        Self {
            r#type: MessageType::Subscribed,
            site_id: requested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribedMessage {
    pub r#type: MessageType,
}

impl Default for UnsubscribedMessage {
    fn default() -> Self {
        Self {
            r#type: MessageType::Unsubscribed,
        }
    }
}

/// One zone of a `zone_update` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshotDto {
    pub zone_id: String,
    pub zone_name: String,
    pub current_count: u32,
    pub max_capacity: u32,
    pub density_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpdateMessage {
    pub r#type: MessageType,
    /// ISO 8601 (UTC)
    pub timestamp: String,
    pub data: Vec<ZoneSnapshotDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalAlertMessage {
    pub r#type: MessageType,
    pub zone_id: String,
    pub zone_name: String,
    pub current_count: u32,
    pub max_capacity: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeAlertMessage {
    pub r#type: MessageType,
    pub zone_id: String,
    pub message: String,
}

/// Either alert frame; serialized without an extra wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlertMessage {
    Critical(CriticalAlertMessage),
    Surge(SurgeAlertMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            message: message.into(),
        }
    }
}

/// Client → server control message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `requested` is the raw `siteId` value, kept for the reply
    Subscribe { site_id: SiteId, requested: Value },
    Unsubscribe,
}

/// Why a control message was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandParseError {
    InvalidJson,
    UnsupportedAction,
    InvalidSiteId,
}

impl CommandParseError {
    /// Text of the `error` frame sent back to the client
    pub fn message(&self) -> &'static str {
        match self {
            CommandParseError::InvalidJson => MSG_INVALID_JSON,
            CommandParseError::UnsupportedAction => MSG_UNSUPPORTED_ACTION,
            CommandParseError::InvalidSiteId => MSG_INVALID_SITE_ID,
        }
    }
}

impl ClientCommand {
    pub fn subscribe(site_id: SiteId) -> Self {
        ClientCommand::Subscribe {
            site_id,
            requested: Value::from(site_id.value()),
        }
    }

    /// Parse a text frame into a control message
    pub fn parse(text: &str) -> Result<Self, CommandParseError> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| CommandParseError::InvalidJson)?;

        match value.get("action").and_then(Value::as_str) {
            Some("subscribe") => {
                let requested = value
                    .get("siteId")
                    .cloned()
                    .ok_or(CommandParseError::InvalidSiteId)?;
                let site_id =
                    SiteId::deserialize(&requested).map_err(|_| CommandParseError::InvalidSiteId)?;
                Ok(ClientCommand::Subscribe { site_id, requested })
            }
            Some("unsubscribe") => Ok(ClientCommand::Unsubscribe),
            _ => Err(CommandParseError::UnsupportedAction),
        }
    }

    /// Render as the JSON text frame a client sends
    pub fn to_json(&self) -> String {
        match self {
            ClientCommand::Subscribe { requested, .. } => {
                serde_json::json!({"action": "subscribe", "siteId": requested}).to_string()
            }
            ClientCommand::Unsubscribe => serde_json::json!({"action": "unsubscribe"}).to_string(),
        }
    }
}
