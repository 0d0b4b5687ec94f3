//! HS256 JWT による TokenVerifier 実装
//!
//! 共有シークレットで署名を、`exp` クレームで有効期限を検証します。
//! `issue_token` は開発用クライアントとテストのための発行ヘルパーです。

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, AuthenticatedUser, TokenVerifier, UserId};

/// トークンのクレーム
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    /// 有効期限（Unix 秒）
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// HS256 JWT の検証器
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// 有効期限の許容誤差（秒）を変更する
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            },
        )?;

        let org_id = data.claims.org_id.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(AuthenticatedUser {
            user_id: data.claims.id,
            org_id,
        })
    }
}

/// 共有シークレットで署名したトークンを発行する
pub fn issue_token(secret: &str, user_id: &UserId, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        id: user_id.clone(),
        exp: (Utc::now() + ttl).timestamp(),
        org_id: None,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        // テスト項目: 正しいシークレットで署名された有効なトークンを検証できる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = issue_token(SECRET, &user("42"), Duration::minutes(5)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result.map(|u| u.user_id), Ok(user("42")));
    }

    #[test]
    fn test_verify_numeric_id_and_org_claims() {
        // テスト項目: 数値の id / org_id クレームを文字列として取り出せる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign(
            &serde_json::json!({"id": 42, "org_id": 3, "email": "a@example.com", "exp": exp}),
            SECRET,
        );

        // when (操作):
        let result = verifier.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(result.user_id.as_str(), "42");
        assert_eq!(result.org_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        // テスト項目: 異なるシークレットで署名されたトークンは拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = issue_token("other-secret", &user("42"), Duration::minutes(5)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // テスト項目: 有効期限切れのトークンは Expired として拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET).with_leeway(0);
        let token = issue_token(SECRET, &user("42"), Duration::minutes(-10)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn test_verify_rejects_missing_and_garbage_tokens() {
        // テスト項目: 空文字・不正な形式のトークンは拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);

        // when (操作):
        let empty = verifier.verify("");
        let garbage = verifier.verify("not-a-jwt");

        // then (期待する結果):
        assert_eq!(empty, Err(AuthError::MissingToken));
        assert!(matches!(garbage, Err(AuthError::Invalid(_))));
    }
}
