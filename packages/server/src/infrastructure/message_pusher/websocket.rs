//! WebSocket を使った SubscriptionRegistry 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（有界 `mpsc::Sender`）と購読先の管理
//! - サイト単位の配信（push_to_site）と個別送信（push_to）
//!
//! ## 設計ノート
//!
//! WebSocket の生成と writer タスクは UI 層（`ui/handler/websocket.rs`）が持ちます。
//! この実装は受け取った sender にメッセージを積むだけです。
//!
//! ロックはマップの参照・更新の間だけ保持し、配信時は対象の sender を複製してから
//! ロックを外して `try_send` します。満杯のキューではそのメッセージを捨て、
//! 閉じたキューの接続は登録解除します。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::domain::{
    ConnectionId, DeliveryReport, PusherChannel, RegistryError, SiteId, SubscriptionRegistry,
    UserId,
};

/// レジストリに登録された 1 接続
struct ConnectionEntry {
    user_id: UserId,
    sender: PusherChannel,
    subscription: Option<SiteId>,
}

/// WebSocket を使った SubscriptionRegistry 実装
#[derive(Default)]
pub struct WebSocketSubscriptionRegistry {
    /// Key: ConnectionId / Value: 送信キューと購読先
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl WebSocketSubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 閉じたキューを検出した接続をまとめて登録解除する
    async fn remove_closed(&self, closed: &[ConnectionId]) {
        if closed.is_empty() {
            return;
        }
        let mut connections = self.connections.lock().await;
        for connection_id in closed {
            if let Some(entry) = connections.remove(connection_id) {
                tracing::info!(
                    "Connection '{}' (user '{}') was closed; unregistered during delivery",
                    connection_id,
                    entry.user_id
                );
            }
        }
    }
}

#[async_trait]
impl SubscriptionRegistry for WebSocketSubscriptionRegistry {
    async fn register(&self, connection_id: ConnectionId, user_id: UserId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        tracing::debug!(
            "Connection '{}' (user '{}') registered",
            connection_id,
            user_id
        );
        connections.insert(
            connection_id,
            ConnectionEntry {
                user_id,
                sender,
                subscription: None,
            },
        );
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(connection_id).is_some();
        if removed {
            tracing::debug!("Connection '{}' unregistered", connection_id);
        }
        removed
    }

    async fn set_subscription(
        &self,
        connection_id: &ConnectionId,
        site_id: Option<SiteId>,
    ) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        let entry = connections
            .get_mut(connection_id)
            .ok_or(RegistryError::ConnectionNotFound(*connection_id))?;
        entry.subscription = site_id;
        Ok(())
    }

    async fn subscription_of(&self, connection_id: &ConnectionId) -> Option<SiteId> {
        let connections = self.connections.lock().await;
        connections
            .get(connection_id)
            .and_then(|entry| entry.subscription)
    }

    async fn subscribed_sites(&self) -> BTreeSet<SiteId> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .filter_map(|entry| entry.subscription)
            .collect()
    }

    async fn connections_for_site(&self, site_id: SiteId) -> Vec<ConnectionId> {
        let connections = self.connections.lock().await;
        connections
            .iter()
            .filter(|(_, entry)| entry.subscription == Some(site_id))
            .map(|(id, _)| *id)
            .collect()
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), RegistryError> {
        let sender = {
            let connections = self.connections.lock().await;
            connections
                .get(connection_id)
                .map(|entry| entry.sender.clone())
                .ok_or(RegistryError::ConnectionNotFound(*connection_id))?
        };

        match sender.try_send(content.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RegistryError::PushFailed(format!(
                "send buffer of '{}' is full",
                connection_id
            ))),
            Err(TrySendError::Closed(_)) => {
                self.remove_closed(&[*connection_id]).await;
                Err(RegistryError::ConnectionNotFound(*connection_id))
            }
        }
    }

    async fn push_to_site(&self, site_id: SiteId, messages: &[String]) -> DeliveryReport {
        // ロック中は sender の複製だけを取る
        let targets: Vec<(ConnectionId, PusherChannel)> = {
            let connections = self.connections.lock().await;
            connections
                .iter()
                .filter(|(_, entry)| entry.subscription == Some(site_id))
                .map(|(id, entry)| (*id, entry.sender.clone()))
                .collect()
        };

        let mut report = DeliveryReport {
            recipients: targets.len(),
            ..DeliveryReport::default()
        };
        let mut closed = Vec::new();

        for (connection_id, sender) in &targets {
            for message in messages {
                match sender.try_send(message.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        tracing::warn!(
                            "Send buffer of '{}' is full; dropped a message for site {}",
                            connection_id,
                            site_id
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        closed.push(*connection_id);
                        break;
                    }
                }
            }
        }

        report.disconnected = closed.len();
        self.remove_closed(&closed).await;

        report
    }

    async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
