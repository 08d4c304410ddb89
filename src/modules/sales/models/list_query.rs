// Listing: query-string parsing, filter validation and pagination metadata

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dto::SaleSummary;
use super::sale::SaleStatus;
use crate::core::{AppError, Result};

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query parameters for GET /api/sales
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSalesQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub subsidiary_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Columns a listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaleSortField {
    #[default]
    SaleDate,
    SaleNumber,
    TotalAmount,
    Status,
    CreatedAt,
}

impl SaleSortField {
    /// Column name in the `sales` table
    pub fn column(&self) -> &'static str {
        match self {
            SaleSortField::SaleDate => "sale_date",
            SaleSortField::SaleNumber => "sale_number",
            SaleSortField::TotalAmount => "total_amount",
            SaleSortField::Status => "status",
            SaleSortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SaleSortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "saledate" | "sale_date" => Ok(SaleSortField::SaleDate),
            "salenumber" | "sale_number" => Ok(SaleSortField::SaleNumber),
            "totalamount" | "total_amount" => Ok(SaleSortField::TotalAmount),
            "status" => Ok(SaleSortField::Status),
            "createdat" | "created_at" => Ok(SaleSortField::CreatedAt),
            _ => Err(format!(
                "SortBy must be one of: SaleDate, SaleNumber, TotalAmount, Status, CreatedAt; got: {}",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Sort direction must be 'asc' or 'desc', got: {}", s)),
        }
    }
}

/// Validated listing criteria handed to the repository
#[derive(Debug, Clone, PartialEq)]
pub struct SaleFilter {
    pub page: u32,
    pub size: u32,
    pub customer_id: Option<Uuid>,
    pub subsidiary_id: Option<Uuid>,
    pub status: Option<SaleStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: SaleSortField,
    pub sort_direction: SortDirection,
}

impl SaleFilter {
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.size)
    }
}

impl ListSalesQuery {
    /// Validate the raw parameters and turn them into a [`SaleFilter`]
    ///
    /// Empty strings count as absent. Anything else that does not parse is
    /// rejected rather than ignored.
    pub fn into_filter(self, default_size: u32) -> Result<SaleFilter> {
        if self.page <= 0 {
            return Err(AppError::validation("Page must be greater than 0"));
        }

        let size = self.size.unwrap_or(i64::from(default_size));
        if size <= 0 {
            return Err(AppError::validation("Page size must be greater than 0"));
        }
        if size > i64::from(MAX_PAGE_SIZE) {
            return Err(AppError::validation(format!(
                "Page size cannot exceed {}",
                MAX_PAGE_SIZE
            )));
        }

        let page = u32::try_from(self.page)
            .map_err(|_| AppError::validation(format!("Page out of range: {}", self.page)))?;

        let status = non_empty(self.status.as_deref())
            .map(SaleStatus::from_str)
            .transpose()
            .map_err(AppError::Validation)?;

        let sort_by = non_empty(self.sort_by.as_deref())
            .map(SaleSortField::from_str)
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();

        let sort_direction = non_empty(self.sort_direction.as_deref())
            .map(SortDirection::from_str)
            .transpose()
            .map_err(AppError::Validation)?
            .unwrap_or_default();

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::validation(
                    "Start date must be less than or equal to end date",
                ));
            }
        }

        Ok(SaleFilter {
            page,
            // bounded by MAX_PAGE_SIZE above
            size: size as u32,
            customer_id: self.customer_id,
            subsidiary_id: self.subsidiary_id,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
            sort_by,
            sort_direction,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Page of sales plus pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSalesResponse {
    pub sales: Vec<SaleSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl ListSalesResponse {
    pub fn new(sales: Vec<SaleSummary>, filter: &SaleFilter, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(filter.size));
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        Self {
            sales,
            current_page: filter.page,
            total_pages,
            page_size: filter.size,
            total_count,
            has_next: filter.page < total_pages,
            has_previous: filter.page > 1,
        }
    }
}
