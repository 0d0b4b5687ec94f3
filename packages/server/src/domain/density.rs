//! 混雑率の計算
//!
//! 副作用のない純粋関数のみを置いています。

use std::collections::HashMap;

use super::{
    entity::{Sample, Zone, ZoneSnapshot},
    value_object::ZoneId,
};

/// 在場人数と最大収容人数から混雑率（%）を求める
///
/// 最大収容人数が 0 の場合はゼロ除算を避けて 0 を返す。
pub fn density_percentage(count: u32, max_capacity: u32) -> f64 {
    if max_capacity == 0 {
        return 0.0;
    }
    f64::from(count) * 100.0 / f64::from(max_capacity)
}

/// ゾーンごとに最新（timestamp 最大）のサンプルを選ぶ
pub fn latest_samples_by_zone(samples: &[Sample]) -> HashMap<&ZoneId, &Sample> {
    let mut latest: HashMap<&ZoneId, &Sample> = HashMap::new();
    for sample in samples {
        let is_newer = latest
            .get(&sample.zone_id)
            .is_none_or(|existing| sample.timestamp > existing.timestamp);
        if is_newer {
            latest.insert(&sample.zone_id, sample);
        }
    }
    latest
}

/// サイトの全ゾーンについてスナップショットを構築する
///
/// サンプルのないゾーンも在場人数 0・混雑率 0 として結果に含める。
/// 並び順はゾーン一覧の順序を保つ。
pub fn build_zone_snapshots(zones: &[Zone], samples: &[Sample]) -> Vec<ZoneSnapshot> {
    let latest = latest_samples_by_zone(samples);

    zones
        .iter()
        .map(|zone| {
            let current_count = latest.get(&zone.id).map(|s| s.count).unwrap_or(0);
            ZoneSnapshot {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                current_count,
                max_capacity: zone.max_capacity,
                density_percentage: density_percentage(current_count, zone.max_capacity),
            }
        })
        .collect()
}

/// 監視画面向けの混雑度区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityStatus {
    Low,
    Medium,
    High,
}

impl DensityStatus {
    /// 85% 超で high、60% 以上で medium、それ未満は low
    pub fn from_density(density: f64) -> Self {
        if density > 85.0 {
            DensityStatus::High
        } else if density >= 60.0 {
            DensityStatus::Medium
        } else {
            DensityStatus::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DensityStatus::Low => "low",
            DensityStatus::Medium => "medium",
            DensityStatus::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::SiteId;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()
    }

    fn zone(id: &str, capacity: u32) -> Zone {
        Zone::new(
            ZoneId::new(id.to_string()).unwrap(),
            SiteId::new(7).unwrap(),
            format!("Zone {}", id),
            capacity,
        )
    }

    fn sample(zone_id: &str, count: u32, at: DateTime<Utc>) -> Sample {
        Sample {
            zone_id: ZoneId::new(zone_id.to_string()).unwrap(),
            site_id: SiteId::new(7).unwrap(),
            count,
            timestamp: at,
        }
    }

    #[test]
    fn test_density_percentage_basic() {
        // テスト項目: 在場人数 / 最大収容人数 × 100 が計算される
        // given (前提条件):
        let (count, capacity) = (92, 100);

        // when (操作):
        let result = density_percentage(count, capacity);

        // then (期待する結果):
        assert_eq!(result, 92.0);
    }

    #[test]
    fn test_density_percentage_with_zero_capacity_is_zero() {
        // テスト項目: 最大収容人数 0 の場合、人数に関わらず混雑率は 0
        // given (前提条件):
        let counts = [0, 1, 500, u32::MAX];

        // when (操作):
        let results: Vec<f64> = counts.iter().map(|c| density_percentage(*c, 0)).collect();

        // then (期待する結果):
        assert!(results.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_density_percentage_can_exceed_hundred() {
        // テスト項目: 定員超過時は 100% を超える値がそのまま返される
        // given (前提条件):
        let (count, capacity) = (130, 100);

        // when (操作):
        let result = density_percentage(count, capacity);

        // then (期待する結果):
        assert_eq!(result, 130.0);
    }

    #[test]
    fn test_latest_sample_wins_regardless_of_order() {
        // テスト項目: サンプルの並び順に関わらず timestamp が最大のものが選ばれる
        // given (前提条件):
        let samples = vec![
            sample("Z1", 10, now() - Duration::minutes(3)),
            sample("Z1", 30, now() - Duration::minutes(1)),
            sample("Z1", 20, now() - Duration::minutes(2)),
        ];

        // when (操作):
        let latest = latest_samples_by_zone(&samples);

        // then (期待する結果):
        let z1 = ZoneId::new("Z1".to_string()).unwrap();
        assert_eq!(latest.get(&z1).map(|s| s.count), Some(30));
    }

    #[test]
    fn test_site_snapshot_scenario() {
        // テスト項目: Z1（定員 100、直近 92 人）と Z2（定員 0、サンプルなし）のスナップショット
        // given (前提条件):
        let zones = vec![zone("Z1", 100), zone("Z2", 0)];
        let samples = vec![sample("Z1", 92, now() - Duration::minutes(1))];

        // when (操作):
        let snapshots = build_zone_snapshots(&zones, &samples);

        // then (期待する結果):
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].zone_id.as_str(), "Z1");
        assert_eq!(snapshots[0].current_count, 92);
        assert_eq!(snapshots[0].density_percentage, 92.0);
        assert_eq!(snapshots[1].zone_id.as_str(), "Z2");
        assert_eq!(snapshots[1].current_count, 0);
        assert_eq!(snapshots[1].density_percentage, 0.0);
    }

    #[test]
    fn test_zone_without_sample_is_reported_as_empty() {
        // テスト項目: サンプルのないゾーンも省略されず、人数 0・混雑率 0 で含まれる
        // given (前提条件):
        let zones = vec![zone("Z1", 50)];
        let samples: Vec<Sample> = vec![];

        // when (操作):
        let snapshots = build_zone_snapshots(&zones, &samples);

        // then (期待する結果):
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].current_count, 0);
        assert_eq!(snapshots[0].density_percentage, 0.0);
    }

    #[test]
    fn test_samples_for_unknown_zones_are_ignored() {
        // テスト項目: ゾーン一覧にないゾーンのサンプルは結果に影響しない
        // given (前提条件):
        let zones = vec![zone("Z1", 100)];
        let samples = vec![sample("ZX", 80, now())];

        // when (操作):
        let snapshots = build_zone_snapshots(&zones, &samples);

        // then (期待する結果):
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].current_count, 0);
    }

    #[test]
    fn test_density_status_boundaries() {
        // テスト項目: 混雑度区分の境界値
        // given (前提条件):
        let cases = [
            (0.0, DensityStatus::Low),
            (59.9, DensityStatus::Low),
            (60.0, DensityStatus::Medium),
            (85.0, DensityStatus::Medium),
            (85.1, DensityStatus::High),
        ];

        // when (操作) / then (期待する結果):
        for (density, expected) in cases {
            assert_eq!(DensityStatus::from_density(density), expected, "{}", density);
        }
    }
}
