//! ワイヤ上の表現（DTO）
//!
//! - `websocket`: ライブフィードのフレーム
//! - `http`: REST エンドポイントのリクエスト・レスポンス
//! - `conversion`: ドメイン型からの変換

pub mod conversion;
pub mod http;
pub mod websocket;
