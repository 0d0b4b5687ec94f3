//! UseCase: クライアント切断

use std::sync::Arc;

use crate::domain::{ConnectionId, SubscriptionRegistry};

pub struct DisconnectClientUseCase {
    registry: Arc<dyn SubscriptionRegistry>,
}

impl DisconnectClientUseCase {
    pub fn new(registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を登録解除する
    ///
    /// 何度呼んでもよい。実際に削除した場合のみ `true` を返す。
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        self.registry.unregister(connection_id).await
    }
}
