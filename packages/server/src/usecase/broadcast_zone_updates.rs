//! UseCase: ゾーン情報の定期配信
//!
//! 1 回のティックで行うこと:
//!
//! 1. 購読者のいるサイトを列挙する（購読者がいないサイトは計算しない）
//! 2. サイトごとにスナップショットを 1 回だけ計算し、アラートを判定する
//! 3. そのサイトの購読者全員に `zone_update` → アラートの順で配信する
//!
//! あるサイトのデータ取得に失敗しても、他のサイトの配信は続行します。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sitepulse_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    Alert, AlertPolicy, DeliveryReport, DensityHistory, SiteId, SubscriptionRegistry,
    ZoneSnapshot,
};

use super::get_zone_snapshot::GetZoneSnapshotUseCase;

/// 1 サイト分の配信内容
#[derive(Debug, Clone, PartialEq)]
pub struct SiteUpdate {
    pub site_id: SiteId,
    pub generated_at: DateTime<Utc>,
    pub snapshots: Vec<ZoneSnapshot>,
    pub alerts: Vec<Alert>,
}

pub struct BroadcastZoneUpdatesUseCase {
    snapshot: Arc<GetZoneSnapshotUseCase>,
    registry: Arc<dyn SubscriptionRegistry>,
    clock: Arc<dyn Clock>,
    policy: AlertPolicy,
    history: Mutex<DensityHistory>,
}

impl BroadcastZoneUpdatesUseCase {
    pub fn new(
        snapshot: Arc<GetZoneSnapshotUseCase>,
        registry: Arc<dyn SubscriptionRegistry>,
        clock: Arc<dyn Clock>,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            snapshot,
            registry,
            clock,
            policy,
            history: Mutex::new(DensityHistory::new()),
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// 購読中の各サイトについてスナップショットとアラートを計算する
    ///
    /// 取得に失敗したサイトは結果に含めず、履歴も更新しない。
    pub async fn collect_updates(&self) -> Vec<SiteUpdate> {
        let sites = self.registry.subscribed_sites().await;
        let mut updates = Vec::with_capacity(sites.len());

        for site_id in sites {
            let snapshots = match self.snapshot.execute(site_id).await {
                Ok(snapshots) => snapshots,
                Err(e) => {
                    tracing::warn!("Skipping site {} for this tick: {}", site_id, e);
                    continue;
                }
            };

            let alerts = {
                let mut history = self.history.lock().await;
                history.evaluate(site_id, &snapshots, &self.policy)
            };
            if !alerts.is_empty() {
                tracing::info!("Site {} raised {} alert(s)", site_id, alerts.len());
            }

            updates.push(SiteUpdate {
                site_id,
                generated_at: self.clock.now(),
                snapshots,
                alerts,
            });
        }

        updates
    }

    /// 直列化済みのメッセージをサイトの購読者全員へ順に配信する
    pub async fn publish(&self, site_id: SiteId, messages: &[String]) -> DeliveryReport {
        let report = self.registry.push_to_site(site_id, messages).await;
        tracing::debug!(
            "Published {} message(s) to site {}: {:?}",
            messages.len(),
            site_id,
            report
        );
        report
    }
}
