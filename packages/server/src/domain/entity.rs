//! エンティティ
//!
//! `Zone` と `Sample` は外部データストアが所有する読み取り専用のデータ、
//! `ZoneSnapshot` と `Alert` はブロードキャストのたびに計算される一時的な値です。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::value_object::{SiteId, ZoneId};

/// サイト内の区画
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub site_id: SiteId,
    pub name: String,
    /// 最大収容人数（0 は「不明・上限なし」を表す）
    #[serde(default, deserialize_with = "null_as_zero")]
    pub max_capacity: u32,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

impl Zone {
    pub fn new(id: ZoneId, site_id: SiteId, name: impl Into<String>, max_capacity: u32) -> Self {
        Self {
            id,
            site_id,
            name: name.into(),
            max_capacity,
        }
    }
}

/// センサーによるある時点の在場人数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub zone_id: ZoneId,
    pub site_id: SiteId,
    pub count: u32,
    pub timestamp: DateTime<Utc>,
}

/// ゾーンごとの混雑スナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSnapshot {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub current_count: u32,
    pub max_capacity: u32,
    pub density_percentage: f64,
}

/// スナップショットから導出されるアラート
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// 混雑率がしきい値を超えている
    Overcrowding {
        zone_id: ZoneId,
        zone_name: String,
        current_count: u32,
        max_capacity: u32,
        density_percentage: f64,
    },
    /// 前回のブロードキャストから混雑率が急上昇した
    Surge {
        zone_id: ZoneId,
        zone_name: String,
        previous_density: f64,
        current_density: f64,
    },
}

impl Alert {
    pub fn zone_id(&self) -> &ZoneId {
        match self {
            Alert::Overcrowding { zone_id, .. } | Alert::Surge { zone_id, .. } => zone_id,
        }
    }

    pub fn is_overcrowding(&self) -> bool {
        matches!(self, Alert::Overcrowding { .. })
    }

    pub fn is_surge(&self) -> bool {
        matches!(self, Alert::Surge { .. })
    }
}
