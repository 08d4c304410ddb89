// Sale lifecycle events
//
// Publication is fire-and-forget: a publisher must never fail the request
// that produced the event.

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::sales::models::Sale;

/// Something that happened to a sale, carrying its post-mutation state
#[derive(Debug, Clone)]
pub enum SaleEvent {
    Created(Sale),
    Modified(Sale),
    Cancelled(Sale),
    Completed(Sale),
    ItemCancelled { sale: Sale, item_id: Uuid },
}

impl SaleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SaleEvent::Created(_) => "sale.created",
            SaleEvent::Modified(_) => "sale.modified",
            SaleEvent::Cancelled(_) => "sale.cancelled",
            SaleEvent::Completed(_) => "sale.completed",
            SaleEvent::ItemCancelled { .. } => "sale.item_cancelled",
        }
    }

    pub fn sale(&self) -> &Sale {
        match self {
            SaleEvent::Created(sale)
            | SaleEvent::Modified(sale)
            | SaleEvent::Cancelled(sale)
            | SaleEvent::Completed(sale)
            | SaleEvent::ItemCancelled { sale, .. } => sale,
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: SaleEvent);
}

/// Publisher that writes one structured log record per event
#[derive(Debug, Default, Clone)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: SaleEvent) {
        let sale = event.sale();
        let item_id = match &event {
            SaleEvent::ItemCancelled { item_id, .. } => Some(item_id.to_string()),
            _ => None,
        };

        tracing::info!(
            event = event.name(),
            sale_id = %sale.id(),
            sale_number = sale.sale_number(),
            status = %sale.status(),
            total_amount = %sale.total_amount(),
            item_id = item_id.as_deref(),
            "Sale event published"
        );
    }
}
