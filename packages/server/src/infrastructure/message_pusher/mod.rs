//! 購読レジストリ（メッセージ配信）の実装
//!
//! - `websocket`: WebSocket 接続の送信キューを使った実装

pub mod websocket;

pub use websocket::WebSocketSubscriptionRegistry;
