//! Server frame decoding and formatting for terminal display.

use sitepulse_server::infrastructure::dto::websocket::{
    ConnectedMessage, CriticalAlertMessage, ErrorMessage, MSG_UNAUTHORIZED, MessageEnvelope,
    MessageType, SubscribedMessage, SurgeAlertMessage, ZoneUpdateMessage,
};

const RULE: &str = "============================================================";

/// A decoded server → client frame
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Connected(ConnectedMessage),
    Subscribed(SubscribedMessage),
    Unsubscribed,
    ZoneUpdate(ZoneUpdateMessage),
    CriticalAlert(CriticalAlertMessage),
    SurgeAlert(SurgeAlertMessage),
    Error(ErrorMessage),
    /// Anything that does not match a known frame
    Raw(String),
}

impl ServerFrame {
    pub fn parse(text: &str) -> Self {
        let Ok(envelope) = serde_json::from_str::<MessageEnvelope>(text) else {
            return ServerFrame::Raw(text.to_string());
        };

        let parsed = match envelope.r#type {
            MessageType::Connected => serde_json::from_str(text).map(ServerFrame::Connected),
            MessageType::Subscribed => serde_json::from_str(text).map(ServerFrame::Subscribed),
            MessageType::Unsubscribed => Ok(ServerFrame::Unsubscribed),
            MessageType::ZoneUpdate => serde_json::from_str(text).map(ServerFrame::ZoneUpdate),
            MessageType::CriticalAlert => {
                serde_json::from_str(text).map(ServerFrame::CriticalAlert)
            }
            MessageType::SurgeAlert => serde_json::from_str(text).map(ServerFrame::SurgeAlert),
            MessageType::Error => serde_json::from_str(text).map(ServerFrame::Error),
        };
        parsed.unwrap_or_else(|_| ServerFrame::Raw(text.to_string()))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServerFrame::Error(e) if e.message == MSG_UNAUTHORIZED)
    }
}

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    pub fn format(frame: &ServerFrame) -> String {
        match frame {
            ServerFrame::Connected(msg) => Self::format_connected(&msg.user_id),
            ServerFrame::Subscribed(msg) => match msg.site_id.as_str() {
                Some(site_id) => format!("\nFollowing site {}\n", site_id),
                None => format!("\nFollowing site {}\n", msg.site_id),
            },
            ServerFrame::Unsubscribed => "\nNo longer following any site\n".to_string(),
            ServerFrame::ZoneUpdate(msg) => Self::format_zone_update(msg),
            ServerFrame::CriticalAlert(msg) => Self::format_critical_alert(msg),
            ServerFrame::SurgeAlert(msg) => Self::format_surge_alert(msg),
            ServerFrame::Error(msg) => format!("\n[server] error: {}\n", msg.message),
            ServerFrame::Raw(text) => Self::format_raw_message(text),
        }
    }

    pub fn format_connected(user_id: &str) -> String {
        format!(
            "\nConnected as user '{}'. Type 'sub <site-id>' to follow a site, 'help' for commands.\n",
            user_id
        )
    }

    /// Format a zone update as a table, one row per zone
    pub fn format_zone_update(update: &ZoneUpdateMessage) -> String {
        let mut output = String::new();
        output.push_str("\n\n");
        output.push_str(RULE);
        output.push_str(&format!("\nZone update at {}\n", update.timestamp));

        if update.data.is_empty() {
            output.push_str("(No zones)\n");
        } else {
            output.push_str(&format!(
                "{:<10} {:<24} {:>13} {:>8}\n",
                "ZONE", "NAME", "COUNT / CAP", "DENSITY"
            ));
            for zone in &update.data {
                let occupancy = format!("{} / {}", zone.current_count, zone.max_capacity);
                output.push_str(&format!(
                    "{:<10} {:<24} {:>13} {:>7.1}%\n",
                    zone.zone_id, zone.zone_name, occupancy, zone.density_percentage
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    pub fn format_critical_alert(alert: &CriticalAlertMessage) -> String {
        format!(
            "\n!!! CRITICAL [{}] {}: {} ({} / {})\n",
            alert.zone_id, alert.zone_name, alert.message, alert.current_count, alert.max_capacity
        )
    }

    pub fn format_surge_alert(alert: &SurgeAlertMessage) -> String {
        format!("\n!! SURGE [{}]: {}\n", alert.zone_id, alert.message)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
