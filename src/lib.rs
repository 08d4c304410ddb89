//! salestrack sales management service library
//!
//! Sale aggregate, its orchestration service, MySQL persistence and the
//! HTTP surface used by the `salestrack` binary.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::catalog;
pub use modules::health;
pub use modules::sales;
