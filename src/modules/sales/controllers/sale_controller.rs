use std::sync::Arc;

use actix_web::{error, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::modules::sales::models::{CreateSaleRequest, ListSalesQuery, UpdateSaleRequest};
use crate::modules::sales::services::SaleService;

/// Create a new sale
/// POST /api/sales
pub async fn create_sale(
    service: web::Data<Arc<SaleService>>,
    request: web::Json<CreateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service.create_sale(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(sale))
}

/// List sales with filters, sorting and pagination
/// GET /api/sales
pub async fn list_sales(
    service: web::Data<Arc<SaleService>>,
    query: web::Query<ListSalesQuery>,
) -> Result<HttpResponse, AppError> {
    let sales = service.list_sales(query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(sales))
}

/// Get sale by ID
/// GET /api/sales/{id}
pub async fn get_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let sale = service.get_sale(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// Replace customer, subsidiary and items of a sale
/// PUT /api/sales/{id}
pub async fn update_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<Uuid>,
    request: web::Json<UpdateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .update_sale(path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// Cancel a sale
/// DELETE /api/sales/{id}
pub async fn cancel_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let result = service.cancel_sale(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/sales/{id}/complete
pub async fn complete_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let sale = service.complete_sale(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(sale))
}

/// POST /api/sales/{id}/items/{item_id}/cancel
pub async fn cancel_item(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (sale_id, item_id) = path.into_inner();
    let sale = service.cancel_item(sale_id, item_id).await?;

    Ok(HttpResponse::Ok().json(sale))
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("Invalid query string: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("Invalid path parameter: {}", err)).into()
}

/// Configure sale routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/sales")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .route("", web::post().to(create_sale))
            .route("", web::get().to(list_sales))
            .route("/{id}", web::get().to(get_sale))
            .route("/{id}", web::put().to(update_sale))
            .route("/{id}", web::delete().to(cancel_sale))
            .route("/{id}/complete", web::post().to(complete_sale))
            .route("/{id}/items/{item_id}/cancel", web::post().to(cancel_item)),
    );
}

