//! Request handlers.

mod http;
mod websocket;

pub use http::{get_zone_status, health_check, record_crowd_data};
pub use websocket::websocket_handler;
