//! Repository trait 定義
//!
//! ブロードキャストのコアが必要とするデータストアへのインターフェースです。
//! コアは読み取りのみ（`CrowdRepository`）で、書き込み（`SampleRecorder`）は
//! センサー取り込み API のためだけに存在します。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    entity::{Sample, Zone},
    error::RepositoryError,
    value_object::SiteId,
};

/// 混雑データの読み取り用 Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrowdRepository: Send + Sync {
    /// サイトに属する全ゾーン
    async fn list_zones(&self, site_id: SiteId) -> Result<Vec<Zone>, RepositoryError>;

    /// サイトの `since` 以降（境界を含む）のサンプル
    async fn list_recent_samples(
        &self,
        site_id: SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Sample>, RepositoryError>;
}

/// センサーサンプルの書き込み用 Repository
#[async_trait]
pub trait SampleRecorder: Send + Sync {
    async fn record_sample(&self, sample: Sample) -> Result<(), RepositoryError>;
}
