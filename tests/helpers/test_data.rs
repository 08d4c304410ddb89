// Test data factory and service wiring

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use salestrack::catalog::{Customer, Product, Subsidiary};
use salestrack::sales::models::{
    CreateSaleItemRequest, CreateSaleRequest, SaleResponse, UpdateSaleItemRequest,
    UpdateSaleRequest,
};
use salestrack::sales::SaleService;

use super::in_memory::{InMemoryLookup, InMemorySaleRepository, RecordingPublisher};

/// A service wired to in-memory seams, with one customer, one subsidiary
/// and three products already registered
pub struct TestContext {
    pub service: Arc<SaleService>,
    pub repo: Arc<InMemorySaleRepository>,
    pub events: Arc<RecordingPublisher>,
    pub customers: Arc<InMemoryLookup<Customer>>,
    pub subsidiaries: Arc<InMemoryLookup<Subsidiary>>,
    pub products: Arc<InMemoryLookup<Product>>,
    pub customer_id: Uuid,
    pub subsidiary_id: Uuid,
    pub product_ids: Vec<Uuid>,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = Arc::new(InMemorySaleRepository::new());
        let events = Arc::new(RecordingPublisher::new());
        let customers = Arc::new(InMemoryLookup::new());
        let subsidiaries = Arc::new(InMemoryLookup::new());
        let products = Arc::new(InMemoryLookup::new());

        let customer = Customer::new("Ana Souza", "ana@example.com", "123.456.789-00");
        let subsidiary = Subsidiary::new("Downtown", "Rua Central, 100");
        let customer_id = customer.id;
        let subsidiary_id = subsidiary.id;
        customers.insert(customer_id, customer);
        subsidiaries.insert(subsidiary_id, subsidiary);

        let product_ids = (1..=3)
            .map(|n| {
                let product = Product::new(
                    format!("Product {}", n),
                    format!("SKU-{:03}", n),
                    Decimal::new(n * 250, 2),
                );
                let id = product.id;
                products.insert(id, product);
                id
            })
            .collect();

        let service = Arc::new(SaleService::new(
            repo.clone(),
            customers.clone(),
            subsidiaries.clone(),
            products.clone(),
            events.clone(),
        ));

        Self {
            service,
            repo,
            events,
            customers,
            subsidiaries,
            products,
            customer_id,
            subsidiary_id,
            product_ids,
        }
    }

    /// Register another customer and return its id
    pub fn add_customer(&self, name: &str) -> Uuid {
        let customer = Customer::new(name, format!("{}@example.com", name), Uuid::new_v4().to_string());
        let id = customer.id;
        self.customers.insert(id, customer);
        id
    }

    /// Create request for the seeded customer and subsidiary
    ///
    /// Lines cycle through the seeded products.
    pub fn create_request(&self, lines: &[(i32, Decimal)]) -> CreateSaleRequest {
        CreateSaleRequest {
            customer_id: self.customer_id,
            subsidiary_id: self.subsidiary_id,
            items: lines
                .iter()
                .enumerate()
                .map(|(idx, (quantity, unit_price))| CreateSaleItemRequest {
                    product_id: self.product_ids[idx % self.product_ids.len()],
                    quantity: *quantity,
                    unit_price: *unit_price,
                })
                .collect(),
        }
    }

    /// Update request that keeps every line of `sale` as it is
    pub fn update_request_from(&self, sale: &SaleResponse) -> UpdateSaleRequest {
        UpdateSaleRequest {
            customer_id: sale.customer_id,
            subsidiary_id: sale.subsidiary_id,
            items: sale
                .items
                .iter()
                .map(|item| UpdateSaleItemRequest {
                    id: Some(item.id),
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }

    pub async fn create_sale(&self, lines: &[(i32, Decimal)]) -> SaleResponse {
        self.service
            .create_sale(self.create_request(lines))
            .await
            .expect("sale should be created")
    }
}
