//! UseCase: クライアント接続
//!
//! トークンを検証し、成功した場合だけ接続をレジストリに登録します。
//! 検証に失敗した接続はどの状態にも残りません。

use std::sync::Arc;

use crate::domain::{
    AuthenticatedUser, ConnectionId, PusherChannel, SubscriptionRegistry, TokenVerifier,
};

use super::error::ConnectError;

/// 登録済みの接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedClient {
    pub connection_id: ConnectionId,
    pub user: AuthenticatedUser,
}

pub struct ConnectClientUseCase {
    verifier: Arc<dyn TokenVerifier>,
    registry: Arc<dyn SubscriptionRegistry>,
}

impl ConnectClientUseCase {
    pub fn new(verifier: Arc<dyn TokenVerifier>, registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self { verifier, registry }
    }

    /// 接続を認証して登録する
    ///
    /// 登録直後の接続はどのサイトも購読していない。
    pub async fn execute(
        &self,
        token: Option<&str>,
        sender: PusherChannel,
    ) -> Result<ConnectedClient, ConnectError> {
        let user = self.verifier.verify(token.unwrap_or_default())?;

        let connection_id = ConnectionId::generate();
        self.registry
            .register(connection_id, user.user_id.clone(), sender)
            .await;

        Ok(ConnectedClient {
            connection_id,
            user,
        })
    }
}
