pub mod catalog_repository;

pub use catalog_repository::{MySqlCustomerLookup, MySqlProductLookup, MySqlSubsidiaryLookup};
