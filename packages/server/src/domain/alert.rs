//! アラート判定
//!
//! 直前のブロードキャストで記録した混雑率（`DensityHistory`）と今回のスナップショットを比較し、
//! 混雑アラート・急増アラートを導出します。
//!
//! `DensityHistory` 自体は同期を持たない素の構造体です。
//! 複数タスクから共有する場合は呼び出し側でロックに包みます。

use std::{collections::HashMap, fmt, str::FromStr};

use super::{
    entity::{Alert, ZoneSnapshot},
    value_object::{SiteId, ZoneId},
};

/// 混雑アラートの発火方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertTrigger {
    /// しきい値を超えている間、毎ティック発火する
    #[default]
    Level,
    /// しきい値を下から上へ跨いだティックでのみ発火する
    Edge,
}

impl FromStr for AlertTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "level" => Ok(AlertTrigger::Level),
            "edge" => Ok(AlertTrigger::Edge),
            other => Err(format!(
                "unknown alert trigger '{}', expected 'level' or 'edge'",
                other
            )),
        }
    }
}

impl fmt::Display for AlertTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertTrigger::Level => f.write_str("level"),
            AlertTrigger::Edge => f.write_str("edge"),
        }
    }
}

/// アラート判定のしきい値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// この値を「超える」と混雑アラート（%）
    pub overcrowding_threshold: f64,
    /// 前回からの上昇幅がこの値を「超える」と急増アラート（ポイント）
    pub surge_delta: f64,
    pub trigger: AlertTrigger,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            overcrowding_threshold: 90.0,
            surge_delta: 30.0,
            trigger: AlertTrigger::Level,
        }
    }
}

/// (サイト, ゾーン) ごとの前回ブロードキャスト時の混雑率
///
/// プロセス再起動でリセットされるため、起動直後の最初のティックでは急増アラートは出ない。
#[derive(Debug, Default)]
pub struct DensityHistory {
    last: HashMap<(SiteId, ZoneId), f64>,
}

impl DensityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前回記録した混雑率
    pub fn previous(&self, site_id: SiteId, zone_id: &ZoneId) -> Option<f64> {
        self.last.get(&(site_id, zone_id.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// スナップショットを評価してアラートを返し、履歴を今回の値で更新する
    ///
    /// アラートの有無に関わらず、評価した全ゾーンの履歴を上書きする。
    /// 返すアラートはゾーン順で、同一ゾーン内では混雑 → 急増の順。
    pub fn evaluate(
        &mut self,
        site_id: SiteId,
        snapshots: &[ZoneSnapshot],
        policy: &AlertPolicy,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for snapshot in snapshots {
            let key = (site_id, snapshot.zone_id.clone());
            let current = snapshot.density_percentage;
            let previous = self.last.get(&key).copied();

            if is_overcrowded(current, previous, policy) {
                alerts.push(Alert::Overcrowding {
                    zone_id: snapshot.zone_id.clone(),
                    zone_name: snapshot.zone_name.clone(),
                    current_count: snapshot.current_count,
                    max_capacity: snapshot.max_capacity,
                    density_percentage: current,
                });
            }

            // 比較対象となる 0 より大きい前回値がある場合のみ急増を判定する
            let baseline = previous.unwrap_or(0.0);
            if baseline > 0.0 && current - baseline > policy.surge_delta {
                alerts.push(Alert::Surge {
                    zone_id: snapshot.zone_id.clone(),
                    zone_name: snapshot.zone_name.clone(),
                    previous_density: baseline,
                    current_density: current,
                });
            }

            self.last.insert(key, current);
        }

        alerts
    }
}

fn is_overcrowded(current: f64, previous: Option<f64>, policy: &AlertPolicy) -> bool {
    if current <= policy.overcrowding_threshold {
        return false;
    }
    match policy.trigger {
        AlertTrigger::Level => true,
        AlertTrigger::Edge => previous.is_none_or(|p| p <= policy.overcrowding_threshold),
    }
}
