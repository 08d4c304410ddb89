// Sale persistence
//
// A sale is stored as one `sales` row plus its `sale_items` rows. Saving an
// updated sale rewrites the header and replaces the full item set inside a
// single transaction, so the stored items always match the aggregate.
// There is no versioning: the last write wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::sales::models::{
    Sale, SaleFilter, SaleItem, SaleItemRecord, SaleRecord, SaleStatus,
};

const SALE_COLUMNS: &str = "id, sale_number, sale_date, customer_id, subsidiary_id, status, \
                            total_amount, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, quantity, unit_price, \
                            discount_percentage, is_cancelled";

/// Storage boundary for the sale aggregate
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Persist a new sale with all of its items
    ///
    /// Fails with `Conflict` when the sale number is already taken.
    async fn create(&self, sale: &Sale) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>>;

    async fn find_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>>;

    /// Replace the stored header and item set of an existing sale
    async fn update(&self, sale: &Sale) -> Result<()>;

    /// One page of sales matching the filter, plus the unpaginated match count
    async fn list(&self, filter: &SaleFilter) -> Result<(Vec<Sale>, u64)>;
}

/// MySQL-backed [`SaleRepository`]
#[derive(Clone)]
pub struct MySqlSaleRepository {
    pool: MySqlPool,
}

impl MySqlSaleRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert_items(tx: &mut Transaction<'_, MySql>, sale: &Sale) -> Result<()> {
        for (position, item) in sale.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, position, quantity, unit_price,
                    discount_percentage, total_amount, is_cancelled
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.id().to_string())
            .bind(sale.id().to_string())
            .bind(item.product_id().to_string())
            .bind(position as i32)
            .bind(item.quantity())
            .bind(item.unit_price())
            .bind(item.discount_percentage())
            .bind(item.total_amount())
            .bind(item.is_cancelled())
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn find_one(&self, column: &str, value: String) -> Result<Option<Sale>> {
        let mut query = QueryBuilder::<MySql>::new("SELECT ");
        query.push(SALE_COLUMNS);
        query.push(" FROM sales WHERE ");
        query.push(column);
        query.push(" = ");
        query.push_bind(value);

        let row = query
            .build_query_as::<SaleRow>()
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(std::slice::from_ref(&row.id)).await?;
        let sale_items = items.remove(&row.id).unwrap_or_default();

        Ok(Some(row.into_sale(sale_items)?))
    }

    /// Items for the given sale ids, grouped by sale id in insertion order
    async fn load_items(&self, sale_ids: &[String]) -> Result<HashMap<String, Vec<SaleItem>>> {
        let mut grouped: HashMap<String, Vec<SaleItem>> = HashMap::new();
        if sale_ids.is_empty() {
            return Ok(grouped);
        }

        let mut query = QueryBuilder::<MySql>::new("SELECT ");
        query.push(ITEM_COLUMNS);
        query.push(" FROM sale_items WHERE sale_id IN (");
        let mut ids = query.separated(", ");
        for id in sale_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(") ORDER BY sale_id, position");

        let rows = query
            .build_query_as::<SaleItemRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let sale_id = row.sale_id.clone();
            grouped.entry(sale_id).or_default().push(row.into_item()?);
        }

        Ok(grouped)
    }
}

/// Append the WHERE clause shared by the page and count queries
fn push_filters(query: &mut QueryBuilder<'_, MySql>, filter: &SaleFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(customer_id) = filter.customer_id {
        query.push(" AND customer_id = ");
        query.push_bind(customer_id.to_string());
    }

    if let Some(subsidiary_id) = filter.subsidiary_id {
        query.push(" AND subsidiary_id = ");
        query.push_bind(subsidiary_id.to_string());
    }

    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }

    if let Some(start) = filter.start_date {
        query.push(" AND sale_date >= ");
        query.push_bind(start);
    }

    if let Some(end) = filter.end_date {
        query.push(" AND sale_date <= ");
        query.push_bind(end);
    }
}

fn map_insert_error(e: sqlx::Error, sale_number: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::conflict(format!(
                "Sale with number '{}' already exists",
                sale_number
            ));
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl SaleRepository for MySqlSaleRepository {
    async fn create(&self, sale: &Sale) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, sale_date, customer_id, subsidiary_id,
                status, total_amount, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.id().to_string())
        .bind(sale.sale_number())
        .bind(sale.sale_date())
        .bind(sale.customer_id().to_string())
        .bind(sale.subsidiary_id().to_string())
        .bind(sale.status().as_str())
        .bind(sale.total_amount())
        .bind(sale.created_at())
        .bind(sale.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, sale.sale_number()))?;

        Self::insert_items(&mut tx, sale).await?;

        tx.commit().await?;

        tracing::debug!(
            sale_id = %sale.id(),
            sale_number = sale.sale_number(),
            items = sale.item_count(),
            "Sale inserted"
        );

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>> {
        self.find_one("id", id.to_string()).await
    }

    async fn find_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>> {
        self.find_one("sale_number", sale_number.to_string()).await
    }

    async fn update(&self, sale: &Sale) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE sales
            SET customer_id = ?, subsidiary_id = ?, status = ?,
                total_amount = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(sale.customer_id().to_string())
        .bind(sale.subsidiary_id().to_string())
        .bind(sale.status().as_str())
        .bind(sale.total_amount())
        .bind(sale.updated_at())
        .bind(sale.id().to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?")
            .bind(sale.id().to_string())
            .execute(&mut *tx)
            .await?;

        Self::insert_items(&mut tx, sale).await?;

        tx.commit().await?;

        tracing::debug!(
            sale_id = %sale.id(),
            status = %sale.status(),
            items = sale.item_count(),
            "Sale updated"
        );

        Ok(())
    }

    async fn list(&self, filter: &SaleFilter) -> Result<(Vec<Sale>, u64)> {
        let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM sales");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<MySql>::new("SELECT ");
        page.push(SALE_COLUMNS);
        page.push(" FROM sales");
        push_filters(&mut page, filter);
        // sort column comes from a closed enum, never from the caller
        page.push(" ORDER BY ");
        page.push(filter.sort_by.column());
        page.push(" ");
        page.push(filter.sort_direction.as_sql());
        page.push(", id ASC LIMIT ");
        page.push_bind(filter.limit());
        page.push(" OFFSET ");
        page.push_bind(filter.offset());

        let rows = page
            .build_query_as::<SaleRow>()
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let mut items = self.load_items(&ids).await?;

        let sales = rows
            .into_iter()
            .map(|row| {
                let sale_items = items.remove(&row.id).unwrap_or_default();
                row.into_sale(sale_items)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((sales, total.max(0) as u64))
    }
}

/// Database row for the `sales` table
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: String,
    subsidiary_id: String,
    status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    /// The stored total is informational; the aggregate recomputes it from the items
    fn into_sale(self, items: Vec<SaleItem>) -> Result<Sale> {
        let status = SaleStatus::from_str(&self.status).map_err(AppError::Internal)?;
        let stored_total = self.total_amount;

        let sale = Sale::restore(
            SaleRecord {
                id: parse_uuid(&self.id, "sale id")?,
                sale_number: self.sale_number,
                sale_date: self.sale_date,
                customer_id: parse_uuid(&self.customer_id, "customer id")?,
                subsidiary_id: parse_uuid(&self.subsidiary_id, "subsidiary id")?,
                status,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            items,
        );

        if sale.total_amount() != stored_total {
            warn!(
                sale_id = %sale.id(),
                stored_total = %stored_total,
                computed_total = %sale.total_amount(),
                "Stored sale total differs from its items"
            );
        }

        Ok(sale)
    }
}

/// Database row for the `sale_items` table
#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: String,
    quantity: i32,
    unit_price: Decimal,
    discount_percentage: Decimal,
    is_cancelled: bool,
}

impl SaleItemRow {
    fn into_item(self) -> Result<SaleItem> {
        Ok(SaleItem::restore(SaleItemRecord {
            id: parse_uuid(&self.id, "item id")?,
            sale_id: parse_uuid(&self.sale_id, "sale id")?,
            product_id: parse_uuid(&self.product_id, "product id")?,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_percentage: self.discount_percentage,
            is_cancelled: self.is_cancelled,
        }))
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid {} '{}' in storage: {}", what, value, e)))
}
