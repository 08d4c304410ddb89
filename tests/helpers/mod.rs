// Test helpers shared by the integration and contract suites
//
// The application service is wired against in-memory implementations of
// its storage, lookup and event-publishing seams, so these suites run
// without a database.
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//   use helpers::*;

#![allow(dead_code)]

pub mod in_memory;
pub mod test_data;

pub use in_memory::*;
pub use test_data::*;
