//! トークン検証のインターフェース
//!
//! トークンの発行はこのサービスの範囲外です。接続時に検証だけを行います。

use super::{error::AuthError, value_object::UserId};

/// 検証済みトークンから得られる利用者情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// 所属組織（トークンに含まれていれば）
    pub org_id: Option<String>,
}

/// トークン検証 trait
///
/// 署名と有効期限を検証し、成功時は少なくともユーザー ID を返す。
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
