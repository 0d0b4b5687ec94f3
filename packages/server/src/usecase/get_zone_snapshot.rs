//! UseCase: サイトのゾーン別スナップショット取得
//!
//! 直近 `lookback` の間に記録されたサンプルのみを使い、
//! ゾーンごとの最新値から混雑率を計算します。

use std::sync::Arc;

use chrono::Duration;
use sitepulse_shared::time::Clock;

use crate::domain::{CrowdRepository, SiteId, ZoneSnapshot, build_zone_snapshots};

use super::error::SnapshotError;

pub struct GetZoneSnapshotUseCase {
    repository: Arc<dyn CrowdRepository>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
}

impl GetZoneSnapshotUseCase {
    pub fn new(
        repository: Arc<dyn CrowdRepository>,
        clock: Arc<dyn Clock>,
        lookback: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            lookback,
        }
    }

    /// 存在しないサイトは空のスナップショットになる
    pub async fn execute(&self, site_id: SiteId) -> Result<Vec<ZoneSnapshot>, SnapshotError> {
        let since = self.clock.now() - self.lookback;
        let to_error = |source| SnapshotError::Repository { site_id, source };

        let (zones, samples) = tokio::try_join!(
            self.repository.list_zones(site_id),
            self.repository.list_recent_samples(site_id, since),
        )
        .map_err(to_error)?;

        Ok(build_zone_snapshots(&zones, &samples))
    }
}
