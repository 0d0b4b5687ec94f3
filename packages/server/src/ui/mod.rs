//! UI 層（axum のルーター、ハンドラー、定期配信タスク）

mod handler;
pub mod scheduler;
mod server;
pub mod signal;
pub mod state;

pub use scheduler::BroadcastScheduler;
pub use server::{Server, ServerError};
