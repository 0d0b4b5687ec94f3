//! ドメイン型 → DTO の変換

use crate::domain::{Alert, DensityStatus, ZoneSnapshot};
use crate::infrastructure::dto::{http, websocket as ws};

impl From<&ZoneSnapshot> for ws::ZoneSnapshotDto {
    fn from(snapshot: &ZoneSnapshot) -> Self {
        Self {
            zone_id: snapshot.zone_id.to_string(),
            zone_name: snapshot.zone_name.clone(),
            current_count: snapshot.current_count,
            max_capacity: snapshot.max_capacity,
            density_percentage: snapshot.density_percentage,
        }
    }
}

impl From<&ZoneSnapshot> for http::ZoneStatusDto {
    fn from(snapshot: &ZoneSnapshot) -> Self {
        Self {
            zone_id: snapshot.zone_id.to_string(),
            zone_name: snapshot.zone_name.clone(),
            current_count: snapshot.current_count,
            max_capacity: snapshot.max_capacity,
            density_percentage: snapshot.density_percentage,
            status: DensityStatus::from_density(snapshot.density_percentage)
                .as_str()
                .to_string(),
        }
    }
}

impl From<&Alert> for ws::AlertMessage {
    fn from(alert: &Alert) -> Self {
        match alert {
            Alert::Overcrowding {
                zone_id,
                zone_name,
                current_count,
                max_capacity,
                ..
            } => ws::AlertMessage::Critical(ws::CriticalAlertMessage {
                r#type: ws::MessageType::CriticalAlert,
                zone_id: zone_id.to_string(),
                zone_name: zone_name.clone(),
                current_count: *current_count,
                max_capacity: *max_capacity,
                message: ws::MSG_OVERCROWDING.to_string(),
            }),
            Alert::Surge { zone_id, .. } => ws::AlertMessage::Surge(ws::SurgeAlertMessage {
                r#type: ws::MessageType::SurgeAlert,
                zone_id: zone_id.to_string(),
                message: ws::MSG_SURGE.to_string(),
            }),
        }
    }
}

impl ws::ZoneUpdateMessage {
    pub fn new(timestamp: String, snapshots: &[ZoneSnapshot]) -> Self {
        Self {
            r#type: ws::MessageType::ZoneUpdate,
            timestamp,
            data: snapshots.iter().map(ws::ZoneSnapshotDto::from).collect(),
        }
    }
}
