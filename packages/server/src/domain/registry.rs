//! 購読レジストリ trait 定義
//!
//! ## 責務
//!
//! - 生存中の接続と、各接続が購読しているサイト（高々 1 つ）を管理する
//! - サイト単位でのメッセージ配信
//!
//! 接続ごとの送信キューは有界で、配信はブロックしない。
//! 実装は Infrastructure 層（`infrastructure::message_pusher`）が提供します。

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::RegistryError,
    value_object::{ConnectionId, SiteId, UserId},
};

/// 接続ごとの送信キュー（WebSocket の writer タスクへ繋がる）
pub type PusherChannel = mpsc::Sender<String>;

/// サイト単位の配信結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// 配信対象になった接続数
    pub recipients: usize,
    /// キューに積めたメッセージ数
    pub delivered: usize,
    /// キューが満杯で捨てたメッセージ数
    pub dropped: usize,
    /// キューが閉じていたため登録解除した接続数
    pub disconnected: usize,
}

#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// 未購読状態で接続を登録する
    async fn register(&self, connection_id: ConnectionId, user_id: UserId, sender: PusherChannel);

    /// 接続を登録解除する（冪等）。登録されていた場合は `true`
    async fn unregister(&self, connection_id: &ConnectionId) -> bool;

    /// 購読先を設定する。`None` で購読解除。以前の購読は置き換えられる
    async fn set_subscription(
        &self,
        connection_id: &ConnectionId,
        site_id: Option<SiteId>,
    ) -> Result<(), RegistryError>;

    /// 接続の現在の購読先
    async fn subscription_of(&self, connection_id: &ConnectionId) -> Option<SiteId>;

    /// 購読者が 1 人以上いるサイトの集合
    async fn subscribed_sites(&self) -> BTreeSet<SiteId>;

    /// サイトを購読している接続
    async fn connections_for_site(&self, site_id: SiteId) -> Vec<ConnectionId>;

    /// 特定の接続へ送信する
    async fn push_to(&self, connection_id: &ConnectionId, content: &str)
    -> Result<(), RegistryError>;

    /// サイトの購読者全員へメッセージ列を順に送信する
    ///
    /// 全メッセージは同じ購読者集合へ届ける。閉じた接続は登録解除して続行する。
    async fn push_to_site(&self, site_id: SiteId, messages: &[String]) -> DeliveryReport;

    async fn connection_count(&self) -> usize;

    /// 指定サイトの購読者数
    async fn subscriber_count(&self, site_id: SiteId) -> usize {
        self.connections_for_site(site_id).await.len()
    }
}
