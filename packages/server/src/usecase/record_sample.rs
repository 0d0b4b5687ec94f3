//! UseCase: センサーからの在場人数の取り込み

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sitepulse_shared::time::Clock;

use crate::domain::{Sample, SampleRecorder, SiteId, ZoneId};

use super::error::RecordSampleError;

/// センサー側の時計のずれとして許容する幅
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

pub struct RecordSampleUseCase {
    recorder: Arc<dyn SampleRecorder>,
    clock: Arc<dyn Clock>,
}

impl RecordSampleUseCase {
    pub fn new(recorder: Arc<dyn SampleRecorder>, clock: Arc<dyn Clock>) -> Self {
        Self { recorder, clock }
    }

    /// `timestamp` を省略した場合は現在時刻で記録する
    ///
    /// 現在時刻より `MAX_CLOCK_SKEW_SECS` 秒以上先の timestamp は拒否する。
    pub async fn execute(
        &self,
        site_id: SiteId,
        zone_id: ZoneId,
        count: u32,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Sample, RecordSampleError> {
        let now = self.clock.now();
        let timestamp = timestamp.unwrap_or(now);
        if timestamp > now + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return Err(RecordSampleError::FutureTimestamp(timestamp));
        }

        let sample = Sample {
            zone_id,
            site_id,
            count,
            timestamp,
        };
        self.recorder.record_sample(sample.clone()).await?;
        tracing::debug!(
            "Recorded {} visitors for zone '{}' of site {}",
            sample.count,
            sample.zone_id,
            sample.site_id
        );
        Ok(sample)
    }
}
