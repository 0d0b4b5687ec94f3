//! ドメイン層のエラー型

use thiserror::Error;

use super::value_object::{ConnectionId, SiteId, ZoneId};

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    /// サイト ID が正の整数ではない
    #[error("Invalid site id: '{0}'")]
    InvalidSiteId(String),

    /// ゾーン ID が空
    #[error("Zone id must not be empty")]
    EmptyZoneId,

    /// ユーザー ID が空
    #[error("User id must not be empty")]
    EmptyUserId,
}

/// データストアアクセス時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// データストアに到達できない、またはクエリが失敗した
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    /// 指定サイトに該当ゾーンが存在しない
    #[error("Zone '{zone_id}' not found in site {site_id}")]
    ZoneNotFound { site_id: SiteId, zone_id: ZoneId },
}

/// 購読レジストリ操作時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 接続がレジストリに存在しない（切断済み）
    #[error("Connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),

    /// 接続のチャンネルへの送信に失敗した
    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// トークン検証時のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// トークンが指定されていない
    #[error("Missing token")]
    MissingToken,

    /// トークンの有効期限切れ
    #[error("Token expired")]
    Expired,

    /// 署名不正・形式不正など
    #[error("Invalid token: {0}")]
    Invalid(String),
}
