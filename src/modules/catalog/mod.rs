// Catalog module: read-only reference data a sale points at

pub mod models;
pub mod repositories;

pub use models::{Customer, Product, Subsidiary};
pub use repositories::{MySqlCustomerLookup, MySqlProductLookup, MySqlSubsidiaryLookup};
