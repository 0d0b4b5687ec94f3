//! サーバー設定

use std::time::Duration;

use crate::domain::{AlertPolicy, AlertTrigger};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WS_PATHS: [&str; 2] = ["/api/socket", "/api/live/stream"];
pub const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_LOOKBACK_SECS: u64 = 300;
pub const DEFAULT_CLIENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// ゲートウェイを公開するパス（すべて同じレジストリを共有する）
    pub ws_paths: Vec<String>,
    pub broadcast_interval: Duration,
    /// スナップショットに使うサンプルの集計窓
    pub lookback: Duration,
    pub overcrowding_threshold: f64,
    pub surge_delta: f64,
    pub alert_trigger: AlertTrigger,
    /// 接続ごとの送信キューの長さ
    pub client_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let policy = AlertPolicy::default();
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ws_paths: DEFAULT_WS_PATHS.iter().map(|p| p.to_string()).collect(),
            broadcast_interval: Duration::from_millis(DEFAULT_BROADCAST_INTERVAL_MS),
            lookback: Duration::from_secs(DEFAULT_LOOKBACK_SECS),
            overcrowding_threshold: policy.overcrowding_threshold,
            surge_delta: policy.surge_delta,
            alert_trigger: policy.trigger,
            client_buffer: DEFAULT_CLIENT_BUFFER,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy {
            overcrowding_threshold: self.overcrowding_threshold,
            surge_delta: self.surge_delta,
            trigger: self.alert_trigger,
        }
    }

    /// chrono 側の計算で使う集計窓
    pub fn lookback_duration(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lookback).unwrap_or(chrono::Duration::seconds(
            DEFAULT_LOOKBACK_SECS as i64,
        ))
    }
}
