// HTTP contract for /api/sales
//
// Status codes, body shapes and error envelopes, exercised through the
// real route configuration with in-memory storage behind the service.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{test, web, App};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use helpers::*;
use salestrack::middleware::{ErrorLogger, RequestId, REQUEST_ID_HEADER};
use salestrack::sales::controllers::configure;
use salestrack::sales::models::{
    CancelSaleResponse, ListSalesResponse, SaleResponse, SaleStatus,
};

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(ErrorLogger)
                .wrap(RequestId)
                .app_data(web::Data::new($ctx.service.clone()))
                .configure(configure),
        )
        .await
    };
}

fn create_body(ctx: &TestContext) -> Value {
    json!({
        "customer_id": ctx.customer_id,
        "subsidiary_id": ctx.subsidiary_id,
        "items": [
            { "product_id": ctx.product_ids[0], "quantity": 5, "unit_price": "10.00" },
            { "product_id": ctx.product_ids[1], "quantity": 1, "unit_price": "3.50" }
        ]
    })
}

fn error_code(body: &Value) -> Option<u64> {
    body["error"]["code"].as_u64()
}

#[actix_web::test]
async fn test_create_sale_returns_201_with_sale() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/sales")
        .set_json(create_body(&ctx))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 201);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.status, SaleStatus::Pending);
    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.items[0].discount_percentage, dec!(10));
    assert_eq!(sale.total_amount, dec!(48.50));
}

#[actix_web::test]
async fn test_create_sale_validation_error_envelope() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let mut body = create_body(&ctx);
    body["items"][0]["quantity"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/api/sales")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_code(&body), Some(400));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("quantity must be greater than 0"));
}

#[actix_web::test]
async fn test_create_sale_malformed_json_is_400() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/sales")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"customer_id\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_code(&body), Some(400));
}

#[actix_web::test]
async fn test_create_sale_unknown_product_is_404() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let mut body = create_body(&ctx);
    body["items"][1]["product_id"] = json!(Uuid::new_v4());

    let req = test::TestRequest::post()
        .uri("/api/sales")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    assert_eq!(ctx.repo.len(), 0);
}

#[actix_web::test]
async fn test_get_sale_and_missing_sale() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(2, dec!(4.00))]).await;
    let app = app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/sales/{}", created.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.id, created.id);
    assert_eq!(sale.sale_number, created.sale_number);

    let req = test::TestRequest::get()
        .uri(&format!("/api/sales/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_code(&body), Some(404));

    let req = test::TestRequest::get().uri("/api/sales/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_list_sales_with_query_string() {
    let ctx = TestContext::new();
    ctx.create_sale(&[(1, dec!(10.00))]).await;
    ctx.create_sale(&[(1, dec!(20.00))]).await;
    ctx.create_sale(&[(1, dec!(30.00))]).await;
    let app = app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/sales?page=1&size=2&sort_by=TotalAmount&sort_direction=desc&status=pending")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page: ListSalesResponse = test::read_body_json(resp).await;
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next);
    assert_eq!(page.sales.len(), 2);
    assert_eq!(page.sales[0].total_amount, dec!(30.00));
    assert_eq!(page.sales[1].total_amount, dec!(20.00));
}

#[actix_web::test]
async fn test_list_sales_rejects_bad_parameters() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    for uri in [
        "/api/sales?status=Shipped",
        "/api/sales?page=0",
        "/api/sales?size=500",
        "/api/sales?sort_direction=up",
        "/api/sales?page=abc",
        "/api/sales?customer_id=not-a-uuid",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "{}", uri);
    }
}

#[actix_web::test]
async fn test_update_sale_replaces_items() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(1, dec!(10.00)), (1, dec!(5.00))]).await;
    let app = app!(ctx);

    let body = json!({
        "customer_id": created.customer_id,
        "subsidiary_id": created.subsidiary_id,
        "items": [
            {
                "id": created.items[0].id,
                "product_id": created.items[0].product_id,
                "quantity": 4,
                "unit_price": "10.00"
            }
        ]
    });

    let req = test::TestRequest::put()
        .uri(&format!("/api/sales/{}", created.id))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].id, created.items[0].id);
    assert_eq!(sale.total_amount, dec!(36.00));
}

#[actix_web::test]
async fn test_update_with_oversized_quantity_is_400() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(1, dec!(10.00))]).await;
    let app = app!(ctx);

    let mut request = ctx.update_request_from(&created);
    request.items[0].quantity = 21;

    let req = test::TestRequest::put()
        .uri(&format!("/api/sales/{}", created.id))
        .set_json(&request)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_delete_cancels_sale() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(5, dec!(10.00))]).await;
    let app = app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/sales/{}", created.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let result: CancelSaleResponse = test::read_body_json(resp).await;
    assert!(result.success);
    assert_eq!(result.id, created.id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/sales/{}", created.id))
        .to_request();
    let sale: SaleResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(sale.status, SaleStatus::Cancelled);
    assert_eq!(sale.total_amount, dec!(0));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/sales/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_complete_and_state_conflicts() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(1, dec!(10.00))]).await;
    let app = app!(ctx);

    let uri = format!("/api/sales/{}/complete", created.id);

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 200);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.status, SaleStatus::Completed);

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_code(&body), Some(409));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already completed"));
}

#[actix_web::test]
async fn test_cancel_item_endpoint() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(2, dec!(50.00)), (1, dec!(50.00))]).await;
    let item_id = created.items[1].id;
    let app = app!(ctx);

    let uri = format!("/api/sales/{}/items/{}/cancel", created.id, item_id);

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 200);
    let sale: SaleResponse = test::read_body_json(resp).await;
    assert_eq!(sale.total_amount, dec!(100.00));
    assert!(sale.items[1].is_cancelled);

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 409);

    let missing = format!("/api/sales/{}/items/{}/cancel", created.id, Uuid::new_v4());
    let resp = test::call_service(&app, test::TestRequest::post().uri(&missing).to_request()).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_update_with_too_many_items_is_400() {
    let ctx = TestContext::new();
    let created = ctx.create_sale(&[(1, dec!(10.00))]).await;
    let app = app!(ctx);

    let items: Vec<Value> = (0..21)
        .map(|idx| {
            json!({
                "product_id": ctx.product_ids[idx % ctx.product_ids.len()],
                "quantity": 1,
                "unit_price": "1.00"
            })
        })
        .collect();
    let body = json!({
        "customer_id": created.customer_id,
        "subsidiary_id": created.subsidiary_id,
        "items": items
    });

    let req = test::TestRequest::put()
        .uri(&format!("/api/sales/{}", created.id))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(ctx.repo.get(created.id).unwrap().item_count(), 1);
}

#[actix_web::test]
async fn test_create_with_sub_cent_price_is_400() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let mut body = create_body(&ctx);
    body["items"][0]["unit_price"] = json!("0.004");

    let req = test::TestRequest::post()
        .uri("/api/sales")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(ctx.repo.len(), 0);
}
