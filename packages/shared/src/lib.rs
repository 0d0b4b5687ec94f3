//! Utilities shared by the SitePulse server and client.

pub mod logger;
pub mod time;
