// In-memory stand-ins for the service seams

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use salestrack::core::{AppError, ReferenceLookup, Result};
use salestrack::sales::models::{Sale, SaleFilter, SaleSortField, SortDirection};
use salestrack::sales::{EventPublisher, SaleEvent, SaleRepository};

/// Sale store keyed by id, with the same conflict and listing rules as MySQL
#[derive(Default)]
pub struct InMemorySaleRepository {
    sales: Mutex<HashMap<Uuid, Sale>>,
    fail_writes: AtomicBool,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following create/update fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn get(&self, id: Uuid) -> Option<Sale> {
        self.sales.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sales.lock().unwrap().len()
    }

    /// Store a sale directly, bypassing the service
    pub fn seed(&self, sale: Sale) {
        self.sales.lock().unwrap().insert(sale.id(), sale);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AppError::internal("storage unavailable"));
        }
        Ok(())
    }
}

fn matches(sale: &Sale, filter: &SaleFilter) -> bool {
    filter.customer_id.map_or(true, |id| sale.customer_id() == id)
        && filter.subsidiary_id.map_or(true, |id| sale.subsidiary_id() == id)
        && filter.status.map_or(true, |status| sale.status() == status)
        && filter.start_date.map_or(true, |start| sale.sale_date() >= start)
        && filter.end_date.map_or(true, |end| sale.sale_date() <= end)
}

fn compare(a: &Sale, b: &Sale, field: SaleSortField) -> Ordering {
    match field {
        SaleSortField::SaleDate => a.sale_date().cmp(&b.sale_date()),
        SaleSortField::SaleNumber => a.sale_number().cmp(b.sale_number()),
        SaleSortField::TotalAmount => a.total_amount().cmp(&b.total_amount()),
        SaleSortField::Status => a.status().as_str().cmp(b.status().as_str()),
        SaleSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn create(&self, sale: &Sale) -> Result<()> {
        self.check_writable()?;

        let mut sales = self.sales.lock().unwrap();
        if sales.values().any(|s| s.sale_number() == sale.sale_number()) {
            return Err(AppError::conflict(format!(
                "Sale with number '{}' already exists",
                sale.sale_number()
            )));
        }

        sales.insert(sale.id(), sale.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>> {
        Ok(self.get(id))
    }

    async fn find_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>> {
        Ok(self
            .sales
            .lock()
            .unwrap()
            .values()
            .find(|s| s.sale_number() == sale_number)
            .cloned())
    }

    async fn update(&self, sale: &Sale) -> Result<()> {
        self.check_writable()?;

        self.sales.lock().unwrap().insert(sale.id(), sale.clone());
        Ok(())
    }

    async fn list(&self, filter: &SaleFilter) -> Result<(Vec<Sale>, u64)> {
        let mut matching: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .values()
            .filter(|sale| matches(sale, filter))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let primary = compare(a, b, filter.sort_by);
            let primary = match filter.sort_direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then_with(|| a.id().cmp(&b.id()))
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok((page, total))
    }
}

/// Reference store for customers, subsidiaries or products
pub struct InMemoryLookup<T> {
    entries: Mutex<HashMap<Uuid, T>>,
}

impl<T: Clone> InMemoryLookup<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, id: Uuid, entry: T) {
        self.entries.lock().unwrap().insert(id, entry);
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> ReferenceLookup<T> for InMemoryLookup<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>> {
        Ok(self.entries.lock().unwrap().get(&id).cloned())
    }
}

/// Publisher that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<SaleEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SaleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(SaleEvent::name).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: SaleEvent) {
        self.events.lock().unwrap().push(event);
    }
}
