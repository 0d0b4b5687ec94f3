//! UseCase 層のエラー

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{AuthError, ConnectionId, RepositoryError, SiteId, ZoneId};

/// 接続時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
}

/// 購読変更時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),
}

/// スナップショット取得時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("failed to read crowd data for site {site_id}: {source}")]
    Repository {
        site_id: SiteId,
        source: RepositoryError,
    },
}

/// センサー取り込み時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordSampleError {
    #[error("zone '{zone_id}' does not exist in site {site_id}")]
    ZoneNotFound { site_id: SiteId, zone_id: ZoneId },
    #[error("timestamp {0} is in the future")]
    FutureTimestamp(DateTime<Utc>),
    #[error("failed to store sample: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for RecordSampleError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::ZoneNotFound { site_id, zone_id } => {
                RecordSampleError::ZoneNotFound { site_id, zone_id }
            }
            other => RecordSampleError::Repository(other),
        }
    }
}
