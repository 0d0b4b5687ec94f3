//! Terminal client for the SitePulse live crowd-density feed.

pub mod client;
pub mod error;
