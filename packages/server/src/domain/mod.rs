//! ドメイン層
//!
//! 値オブジェクト・エンティティ・純粋なドメインロジック（密度計算、アラート判定）と、
//! 外部協調者（データストア、購読レジストリ、トークン検証）のインターフェースを定義します。

pub mod alert;
pub mod auth;
pub mod density;
pub mod entity;
pub mod error;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use alert::{AlertPolicy, AlertTrigger, DensityHistory};
pub use auth::{AuthenticatedUser, TokenVerifier};
pub use density::{DensityStatus, build_zone_snapshots, density_percentage};
pub use entity::{Alert, Sample, Zone, ZoneSnapshot};
pub use error::{AuthError, RegistryError, RepositoryError, ValueObjectError};
pub use registry::{DeliveryReport, PusherChannel, SubscriptionRegistry};
pub use repository::{CrowdRepository, SampleRecorder};
#[cfg(test)]
pub use repository::MockCrowdRepository;
pub use value_object::{ConnectionId, SiteId, UserId, ZoneId};
