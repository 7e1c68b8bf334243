mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use sales_api::{module_router, AppState};

use common::*;

async fn test_app() -> (axum::Router, std::sync::Arc<sea_orm::DatabaseConnection>) {
    let db = setup_db().await;
    let state = AppState::new(db.clone(), test_config("sqlite::memory:"));
    (module_router(state), db)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let (app, _db) = test_app().await;

    let response = app.oneshot(get("/warehouses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        json!("handler not found for route: GET warehouses")
    );
}

#[tokio::test]
async fn wrong_segment_count_does_not_resolve() {
    let (app, _db) = test_app().await;

    let response = app
        .oneshot(get("/orders/1/items/2/extra"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stubbed_item_mutations_return_501() {
    let (app, _db) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/orders/1/items/2")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Update order item not implemented"));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/orders/1/items/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn create_order_round_trips_through_dispatch() {
    let db = setup_db().await;
    seed_customer(&db, 1).await;
    seed_product(&db, 1, dec!(10.00)).await;
    let app2 = module_router(AppState::new(db.clone(), test_config("sqlite::memory:")));

    let request = post_json(
        "/orders",
        json!({
            "customer_id": 1,
            "order_date": "2025-06-15",
            "items": [
                {"product_id": 1, "quantity": 2, "unit_price": "50.00", "discount_amount": "5.00"}
            ]
        }),
    );

    let response = app2.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let order_id = body["order_id"].as_i64().unwrap();
    assert!(body["order_number"].as_str().unwrap().starts_with("SO-"));

    let response = app2
        .clone()
        .oneshot(get(&format!("/orders/{}", order_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    let subtotal: f64 = detail["subtotal"].as_str().unwrap().parse().unwrap();
    assert_eq!(subtotal, 95.0);
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);

    let response = app2.oneshot(get("/orders?status=pending")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["count"], json!(1));
}

#[tokio::test]
async fn invalid_bodies_and_ids_are_validation_errors() {
    let (app, _db) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Invalid request body"));

    let response = app.oneshot(get("/orders/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Invalid order ID"));
}

#[tokio::test]
async fn report_endpoints_validate_their_parameters() {
    let (app, _db) = test_app().await;

    let response = app.clone().oneshot(get("/reports/sales")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Start date and end date are required"));

    let response = app
        .clone()
        .oneshot(get("/forecast?period=weekly"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/pipeline")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["period"], json!("30_days"));
}

#[tokio::test]
async fn missing_order_is_a_404_with_message() {
    let (app, _db) = test_app().await;

    let response = app.oneshot(get("/orders/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Sales order not found"));
}

#[tokio::test]
async fn health_endpoint_reports_database_status() {
    let (app, _db) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["checks"]["database"], json!("healthy"));
}
