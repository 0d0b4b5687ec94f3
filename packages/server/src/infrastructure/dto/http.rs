//! HTTP API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{SiteId, ZoneId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    /// 購読者のいるサイトごとの購読者数
    pub sites: Vec<SiteSubscribersDto>,
}

impl HealthResponse {
    pub fn ok(connections: usize, sites: Vec<SiteSubscribersDto>) -> Self {
        Self {
            status: "ok".to_string(),
            connections,
            sites,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSubscribersDto {
    #[serde(rename = "siteId")]
    pub site_id: SiteId,
    pub subscribers: usize,
}

/// `GET /api/monitor/zones` の 1 ゾーン分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatusDto {
    pub zone_id: String,
    pub zone_name: String,
    pub current_count: u32,
    pub max_capacity: u32,
    pub density_percentage: f64,
    /// `low` / `medium` / `high`
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// `?siteId=` は後段で検証するため生の文字列で受ける
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZonesQuery {
    #[serde(rename = "siteId")]
    pub site_id: Option<String>,
}

/// `POST /api/crowd-data` のボディ
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordSampleRequest {
    pub site_id: SiteId,
    pub zone_id: ZoneId,
    pub count: u32,
    /// 省略時はサーバーの現在時刻
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSampleResponse {
    pub success: bool,
}
