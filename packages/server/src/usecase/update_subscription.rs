//! UseCase: 購読の変更
//!
//! 1 接続が購読できるサイトは高々 1 つ。新しいサイトを購読すると前の購読は置き換わる。

use std::sync::Arc;

use crate::domain::{ConnectionId, RegistryError, SiteId, SubscriptionRegistry};

use super::error::SubscribeError;

pub struct UpdateSubscriptionUseCase {
    registry: Arc<dyn SubscriptionRegistry>,
}

impl UpdateSubscriptionUseCase {
    pub fn new(registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn subscribe(
        &self,
        connection_id: &ConnectionId,
        site_id: SiteId,
    ) -> Result<(), SubscribeError> {
        self.set(connection_id, Some(site_id)).await
    }

    /// 購読を解除し、解除前に購読していたサイトを返す
    pub async fn unsubscribe(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<SiteId>, SubscribeError> {
        let previous = self.registry.subscription_of(connection_id).await;
        self.set(connection_id, None).await?;
        Ok(previous)
    }

    async fn set(
        &self,
        connection_id: &ConnectionId,
        site_id: Option<SiteId>,
    ) -> Result<(), SubscribeError> {
        self.registry
            .set_subscription(connection_id, site_id)
            .await
            .map_err(|e| match e {
                RegistryError::ConnectionNotFound(id) => SubscribeError::ConnectionNotFound(id),
                RegistryError::PushFailed(_) => SubscribeError::ConnectionNotFound(*connection_id),
            })
    }
}
