// MySQL lookups for customers, subsidiaries and products
//
// Sales only need to know that a reference exists, so these repositories
// expose nothing beyond `ReferenceLookup`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

use crate::core::{AppError, ReferenceLookup, Result};
use crate::modules::catalog::models::{Customer, Product, Subsidiary};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    document: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct SubsidiaryRow {
    id: String,
    name: String,
    address: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    unit_price: Decimal,
    sku: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid id '{}' in storage: {}", value, e)))
}

impl TryFrom<CustomerRow> for Customer {
    type Error = AppError;

    fn try_from(row: CustomerRow) -> Result<Self> {
        Ok(Customer {
            id: parse_id(&row.id)?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            document: row.document,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<SubsidiaryRow> for Subsidiary {
    type Error = AppError;

    fn try_from(row: SubsidiaryRow) -> Result<Self> {
        Ok(Subsidiary {
            id: parse_id(&row.id)?,
            name: row.name,
            address: row.address,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            id: parse_id(&row.id)?,
            name: row.name,
            description: row.description,
            unit_price: row.unit_price,
            sku: row.sku,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Customer lookup
#[derive(Clone)]
pub struct MySqlCustomerLookup {
    pool: MySqlPool,
}

impl MySqlCustomerLookup {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup<Customer> for MySqlCustomerLookup {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, name, email, phone, document, created_at, updated_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }
}

/// Subsidiary lookup
#[derive(Clone)]
pub struct MySqlSubsidiaryLookup {
    pool: MySqlPool,
}

impl MySqlSubsidiaryLookup {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup<Subsidiary> for MySqlSubsidiaryLookup {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subsidiary>> {
        let row = sqlx::query_as::<_, SubsidiaryRow>(
            r#"
            SELECT id, name, address, phone, created_at, updated_at
            FROM subsidiaries
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subsidiary::try_from).transpose()
    }
}

/// Product lookup
#[derive(Clone)]
pub struct MySqlProductLookup {
    pool: MySqlPool,
}

impl MySqlProductLookup {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup<Product> for MySqlProductLookup {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, unit_price, sku, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}
