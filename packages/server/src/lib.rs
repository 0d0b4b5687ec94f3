//! SitePulse live crowd-density server.
//!
//! Clients subscribe to one heritage site over WebSocket and receive a zone
//! snapshot plus overcrowding / surge alerts every broadcast tick.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
