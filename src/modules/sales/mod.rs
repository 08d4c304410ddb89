// Sales module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Sale, SaleError, SaleItem, SaleStatus};
pub use repositories::{MySqlSaleRepository, SaleRepository};
pub use services::{EventPublisher, LoggingEventPublisher, SaleEvent, SaleService};
