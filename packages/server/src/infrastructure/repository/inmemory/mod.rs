//! インメモリ実装

pub mod crowd;
pub mod seed;

pub use crowd::InMemoryCrowdRepository;
pub use seed::{SeedData, SeedError};
