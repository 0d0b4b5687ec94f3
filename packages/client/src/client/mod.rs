//! Live feed client implementation.

mod command;
mod domain;
mod formatter;
mod runner;
mod session;
mod ui;

pub use domain::resolve_token;
pub use runner::{ClientOptions, run_client};
