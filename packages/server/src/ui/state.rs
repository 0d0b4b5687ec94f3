//! ハンドラー間で共有する状態

use std::sync::Arc;

use crate::{
    domain::{SubscriptionRegistry, TokenVerifier},
    usecase::{
        BroadcastZoneUpdatesUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        GetZoneSnapshotUseCase, RecordSampleUseCase, UpdateSubscriptionUseCase,
    },
};

pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub update_subscription_usecase: Arc<UpdateSubscriptionUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub get_zone_snapshot_usecase: Arc<GetZoneSnapshotUseCase>,
    pub broadcast_zone_updates_usecase: Arc<BroadcastZoneUpdatesUseCase>,
    pub record_sample_usecase: Arc<RecordSampleUseCase>,
    /// HTTP API の Bearer 認証にも同じ検証器を使う
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub registry: Arc<dyn SubscriptionRegistry>,
    /// 接続ごとの送信キューの長さ
    pub client_buffer: usize,
}
