//! InMemory Crowd Repository 実装
//!
//! ドメイン層が定義する `CrowdRepository` / `SampleRecorder` trait の具体的な実装。
//! 本番ではホスト型のリレーショナル DB が担う部分を、開発・テスト用に
//! プロセス内のマップで代替します。
//!
//! サンプルは無制限には保持せず、現在時刻から `retention` より古いものは書き込み時に捨てます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sitepulse_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{CrowdRepository, RepositoryError, Sample, SampleRecorder, SiteId, Zone};

use super::seed::SeedData;

/// サンプルの既定保持期間
const DEFAULT_RETENTION_MINUTES: i64 = 60;

#[derive(Default)]
struct CrowdTables {
    /// サイトごとのゾーン（登録順を保持）
    zones: HashMap<SiteId, Vec<Zone>>,
    /// サイトごとのサンプル
    samples: HashMap<SiteId, Vec<Sample>>,
}

/// インメモリ Crowd Repository 実装
pub struct InMemoryCrowdRepository {
    tables: Mutex<CrowdTables>,
    retention: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCrowdRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCrowdRepository {
    /// 空の InMemoryCrowdRepository を作成
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(CrowdTables::default()),
            retention: Duration::minutes(DEFAULT_RETENTION_MINUTES),
            clock: Arc::new(SystemClock),
        }
    }

    /// シードデータから作成
    pub fn from_seed(seed: SeedData) -> Self {
        let mut tables = CrowdTables::default();
        for zone in seed.zones {
            tables.zones.entry(zone.site_id).or_default().push(zone);
        }
        for sample in seed.samples {
            tables.samples.entry(sample.site_id).or_default().push(sample);
        }
        Self {
            tables: Mutex::new(tables),
            retention: Duration::minutes(DEFAULT_RETENTION_MINUTES),
            clock: Arc::new(SystemClock),
        }
    }

    /// サンプルの保持期間を変更する
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// 保持期間を少なくとも `window` にする（集計窓より短いと窓内のサンプルが消えるため）
    pub fn retain_at_least(mut self, window: Duration) -> Self {
        self.retention = self.retention.max(window);
        self
    }

    /// 掃除の基準にする時計を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// ゾーンを追加する（同じ ID のゾーンがあれば置き換える）
    pub async fn upsert_zone(&self, zone: Zone) {
        let mut tables = self.tables.lock().await;
        let zones = tables.zones.entry(zone.site_id).or_default();
        match zones.iter_mut().find(|z| z.id == zone.id) {
            Some(existing) => *existing = zone,
            None => zones.push(zone),
        }
    }

    pub async fn count_samples(&self, site_id: SiteId) -> usize {
        let tables = self.tables.lock().await;
        tables.samples.get(&site_id).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl CrowdRepository for InMemoryCrowdRepository {
    async fn list_zones(&self, site_id: SiteId) -> Result<Vec<Zone>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.zones.get(&site_id).cloned().unwrap_or_default())
    }

    async fn list_recent_samples(
        &self,
        site_id: SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Sample>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .samples
            .get(&site_id)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl SampleRecorder for InMemoryCrowdRepository {
    async fn record_sample(&self, sample: Sample) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;

        let known_zone = tables
            .zones
            .get(&sample.site_id)
            .is_some_and(|zones| zones.iter().any(|z| z.id == sample.zone_id));
        if !known_zone {
            return Err(RepositoryError::ZoneNotFound {
                site_id: sample.site_id,
                zone_id: sample.zone_id,
            });
        }

        // 基準はサーバーの現在時刻。サンプル側の timestamp は送信元が決めるため使わない
        let cutoff = self.clock.now() - self.retention;
        let samples = tables.samples.entry(sample.site_id).or_default();
        samples.retain(|s| s.timestamp >= cutoff);
        samples.push(sample);
        Ok(())
    }
}
