//! 定期配信タスク
//!
//! ティックの処理はループ内で直接 await するため、ティックが重なることはない。
//! 処理が周期を超えた場合、遅れたティックはまとめて実行せずに読み飛ばす。

use std::{sync::Arc, time::Duration};

use sitepulse_shared::time::to_rfc3339;
use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    infrastructure::dto::websocket::{AlertMessage, ZoneUpdateMessage},
    usecase::{BroadcastZoneUpdatesUseCase, SiteUpdate},
};

/// 周期の下限（`tokio::time::interval` は 0 を受け付けない）
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct BroadcastScheduler {
    usecase: Arc<BroadcastZoneUpdatesUseCase>,
    period: Duration,
}

impl BroadcastScheduler {
    /// `period` は `MIN_PERIOD` 未満なら切り上げる
    pub fn new(usecase: Arc<BroadcastZoneUpdatesUseCase>, period: Duration) -> Self {
        Self {
            usecase,
            period: period.max(MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// `shutdown` が変化する（または送信側が破棄される）まで周期的に配信する
    ///
    /// 最初のティックは起動から 1 周期後。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Broadcast scheduler started (every {:?})", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("Broadcast scheduler stopped");
    }

    /// 1 ティック分の配信を行い、配信したサイト数を返す
    pub async fn tick(&self) -> usize {
        let updates = self.usecase.collect_updates().await;
        let mut published = 0;

        for update in &updates {
            let messages = match build_messages(update) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::error!(
                        "Failed to serialize update for site {}: {}",
                        update.site_id,
                        e
                    );
                    continue;
                }
            };
            let report = self.usecase.publish(update.site_id, &messages).await;
            if report.dropped > 0 {
                tracing::warn!(
                    "Site {}: {} message(s) dropped for slow clients",
                    update.site_id,
                    report.dropped
                );
            }
            published += 1;
        }

        published
    }
}

/// `zone_update` を先頭に、アラートを判定順に並べる
fn build_messages(update: &SiteUpdate) -> Result<Vec<String>, serde_json::Error> {
    let mut messages = Vec::with_capacity(1 + update.alerts.len());
    messages.push(serde_json::to_string(&ZoneUpdateMessage::new(
        to_rfc3339(update.generated_at),
        &update.snapshots,
    ))?);
    for alert in &update.alerts {
        messages.push(serde_json::to_string(&AlertMessage::from(alert))?);
    }
    Ok(messages)
}
