use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, ReferenceLookup, Result};
use crate::modules::catalog::models::{Customer, Product, Subsidiary};
use crate::modules::sales::models::{
    CancelSaleResponse, CreateSaleRequest, ListSalesQuery, ListSalesResponse, Sale, SaleItem,
    SaleResponse, SaleSummary, UpdateSaleRequest,
};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::sales::services::events::{EventPublisher, SaleEvent};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Application service for the sale lifecycle
///
/// Each operation loads a fresh aggregate, applies one mutation and writes
/// it back. Events are published only after the write succeeded.
pub struct SaleService {
    sale_repo: Arc<dyn SaleRepository>,
    customers: Arc<dyn ReferenceLookup<Customer>>,
    subsidiaries: Arc<dyn ReferenceLookup<Subsidiary>>,
    products: Arc<dyn ReferenceLookup<Product>>,
    events: Arc<dyn EventPublisher>,
    default_page_size: u32,
}

impl SaleService {
    pub fn new(
        sale_repo: Arc<dyn SaleRepository>,
        customers: Arc<dyn ReferenceLookup<Customer>>,
        subsidiaries: Arc<dyn ReferenceLookup<Subsidiary>>,
        products: Arc<dyn ReferenceLookup<Product>>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            sale_repo,
            customers,
            subsidiaries,
            products,
            events,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used when a listing request does not name one
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Create a sale from a validated request
    ///
    /// Every reference must resolve before anything is written.
    pub async fn create_sale(&self, request: CreateSaleRequest) -> Result<SaleResponse> {
        request.validate()?;

        self.ensure_customer(request.customer_id).await?;
        self.ensure_subsidiary(request.subsidiary_id).await?;
        for item in &request.items {
            self.ensure_product(item.product_id).await?;
        }

        let items = request
            .items
            .iter()
            .map(|item| SaleItem::new(item.product_id, item.quantity, item.unit_price))
            .collect();

        let sale = Sale::with_items(request.customer_id, request.subsidiary_id, items)?;
        check_entity(&sale)?;

        self.sale_repo.create(&sale).await?;

        info!(
            sale_id = %sale.id(),
            sale_number = sale.sale_number(),
            items = sale.item_count(),
            total_amount = %sale.total_amount(),
            "Sale created"
        );

        let response = SaleResponse::from(&sale);
        self.events.publish(SaleEvent::Created(sale)).await;

        Ok(response)
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleResponse> {
        let sale = self.load(id).await?;
        Ok(SaleResponse::from(&sale))
    }

    pub async fn list_sales(&self, query: ListSalesQuery) -> Result<ListSalesResponse> {
        let filter = query.into_filter(self.default_page_size)?;
        let (sales, total_count) = self.sale_repo.list(&filter).await?;

        let summaries = sales.iter().map(SaleSummary::from).collect();
        Ok(ListSalesResponse::new(summaries, &filter, total_count))
    }

    /// Replace the customer, subsidiary and item set of a pending sale
    ///
    /// Request items with an id matching an existing line update that line's
    /// quantity and price; its product must stay the same. Items without a
    /// matching id are added. Existing lines the request does not mention are
    /// removed.
    pub async fn update_sale(&self, id: Uuid, request: UpdateSaleRequest) -> Result<SaleResponse> {
        request.validate()?;

        let mut sale = self.load(id).await?;

        // an existing line keeps its product; replacing it means dropping the id
        for item in &request.items {
            let existing = item.id.and_then(|item_id| sale.find_item(item_id));
            if let Some(line) = existing {
                if line.product_id() != item.product_id {
                    return Err(AppError::validation(format!(
                        "Item {}: product cannot be changed on an existing line",
                        line.id()
                    )));
                }
            }
        }

        self.ensure_customer(request.customer_id).await?;
        self.ensure_subsidiary(request.subsidiary_id).await?;

        sale.reassign(request.customer_id, request.subsidiary_id)?;

        let existing_ids: HashSet<Uuid> = sale.items().iter().map(SaleItem::id).collect();
        let requested_ids: HashSet<Uuid> = request.items.iter().filter_map(|item| item.id).collect();

        let to_remove: Vec<Uuid> = existing_ids
            .iter()
            .filter(|item_id| !requested_ids.contains(item_id))
            .copied()
            .collect();
        for item_id in to_remove {
            sale.remove_item(item_id)?;
        }

        for item in &request.items {
            self.ensure_product(item.product_id).await?;

            match item.id {
                Some(item_id) if existing_ids.contains(&item_id) => {
                    sale.update_item(item_id, item.quantity, item.unit_price)?;
                }
                _ => {
                    sale.add_item(SaleItem::new(item.product_id, item.quantity, item.unit_price))?;
                }
            }
        }

        check_entity(&sale)?;

        self.sale_repo.update(&sale).await?;

        info!(
            sale_id = %sale.id(),
            items = sale.item_count(),
            total_amount = %sale.total_amount(),
            "Sale updated"
        );

        let response = SaleResponse::from(&sale);
        self.events.publish(SaleEvent::Modified(sale)).await;

        Ok(response)
    }

    /// Cancel a sale; the record is kept with status Cancelled
    pub async fn cancel_sale(&self, id: Uuid) -> Result<CancelSaleResponse> {
        let mut sale = self.load(id).await?;

        sale.cancel();
        self.sale_repo.update(&sale).await?;

        info!(sale_id = %sale.id(), "Sale cancelled");

        let response = CancelSaleResponse {
            id: sale.id(),
            success: true,
            message: "Sale cancelled successfully".to_string(),
        };
        self.events.publish(SaleEvent::Cancelled(sale)).await;

        Ok(response)
    }

    pub async fn complete_sale(&self, id: Uuid) -> Result<SaleResponse> {
        let mut sale = self.load(id).await?;

        sale.complete()?;
        self.sale_repo.update(&sale).await?;

        info!(
            sale_id = %sale.id(),
            total_amount = %sale.total_amount(),
            "Sale completed"
        );

        let response = SaleResponse::from(&sale);
        self.events.publish(SaleEvent::Completed(sale)).await;

        Ok(response)
    }

    pub async fn cancel_item(&self, sale_id: Uuid, item_id: Uuid) -> Result<SaleResponse> {
        if item_id.is_nil() {
            return Err(AppError::validation("Item ID is required"));
        }

        let mut sale = self.load(sale_id).await?;

        sale.cancel_item(item_id)?;
        self.sale_repo.update(&sale).await?;

        info!(
            sale_id = %sale.id(),
            item_id = %item_id,
            total_amount = %sale.total_amount(),
            "Sale item cancelled"
        );

        let response = SaleResponse::from(&sale);
        self.events
            .publish(SaleEvent::ItemCancelled { sale, item_id })
            .await;

        Ok(response)
    }

    async fn load(&self, id: Uuid) -> Result<Sale> {
        if id.is_nil() {
            return Err(AppError::validation("Sale ID is required"));
        }

        self.sale_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with ID {} not found", id)))
    }

    async fn ensure_customer(&self, id: Uuid) -> Result<()> {
        if !self.customers.exists(id).await? {
            warn!(customer_id = %id, "Customer lookup failed");
            return Err(AppError::not_found(format!("Customer with ID {} not found", id)));
        }
        Ok(())
    }

    async fn ensure_subsidiary(&self, id: Uuid) -> Result<()> {
        if !self.subsidiaries.exists(id).await? {
            warn!(subsidiary_id = %id, "Subsidiary lookup failed");
            return Err(AppError::not_found(format!("Subsidiary with ID {} not found", id)));
        }
        Ok(())
    }

    async fn ensure_product(&self, id: Uuid) -> Result<()> {
        if !self.products.exists(id).await? {
            warn!(product_id = %id, "Product lookup failed");
            return Err(AppError::not_found(format!("Product with ID {} not found", id)));
        }
        Ok(())
    }
}

/// Reject an aggregate whose entity-level checks fail
fn check_entity(sale: &Sale) -> Result<()> {
    let errors = sale.validate();
    if errors.is_empty() {
        return Ok(());
    }

    Err(AppError::Validation(errors.join("; ")))
}
