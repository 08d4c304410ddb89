pub mod events;
pub mod sale_service;

pub use events::{EventPublisher, LoggingEventPublisher, SaleEvent};
pub use sale_service::SaleService;
