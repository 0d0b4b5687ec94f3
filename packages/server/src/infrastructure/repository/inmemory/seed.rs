//! シードファイルの読み込み
//!
//! 起動時に `--seed <path>` で指定された JSON を読み込み、インメモリストアの初期データにします。
//!
//! ```json
//! {
//!   "zones":   [{"id": "Z1", "site_id": 7, "name": "Main Hall", "max_capacity": 100}],
//!   "samples": [{"zone_id": "Z1", "site_id": 7, "count": 42, "timestamp": "2026-01-01T10:00:00Z"}]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Sample, Zone};

/// シードファイル読み込み時のエラー
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// シードデータ
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl SeedData {
    /// JSON 文字列から読み込む
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// JSON ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| SeedError::Parse {
            path: display,
            source,
        })
    }
}
