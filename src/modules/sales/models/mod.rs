mod dto;
mod error;
mod list_query;
mod sale;
mod sale_item;

pub use dto::{
    CancelSaleResponse, CreateSaleItemRequest, CreateSaleRequest, SaleItemResponse,
    SaleResponse, SaleSummary, UpdateSaleItemRequest, UpdateSaleRequest, MAX_ITEMS_PER_SALE,
    MAX_PRICE_SCALE,
};
pub use error::SaleError;
pub use list_query::{
    ListSalesQuery, ListSalesResponse, SaleFilter, SaleSortField, SortDirection, MAX_PAGE_SIZE,
};
pub use sale::{Sale, SaleRecord, SaleStatus, MAX_SALE_NUMBER_LEN};
pub use sale_item::{SaleItem, SaleItemRecord, MAX_ITEM_QUANTITY};
