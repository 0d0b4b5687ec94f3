//! UseCase 層
//!
//! ゲートウェイ（接続・購読・切断）、スナップショット取得、定期配信、
//! センサー取り込みのアプリケーションロジックを置きます。

pub mod broadcast_zone_updates;
pub mod connect_client;
pub mod disconnect_client;
pub mod error;
pub mod get_zone_snapshot;
pub mod record_sample;
pub mod update_subscription;

pub use broadcast_zone_updates::{BroadcastZoneUpdatesUseCase, SiteUpdate};
pub use connect_client::{ConnectClientUseCase, ConnectedClient};
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, RecordSampleError, SnapshotError, SubscribeError};
pub use get_zone_snapshot::GetZoneSnapshotUseCase;
pub use record_sample::RecordSampleUseCase;
pub use update_subscription::UpdateSubscriptionUseCase;
