use axum::{extract::Request, response::Response};

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, json_body, success_response};
use crate::routing::PathParams;
use crate::services::LineItemInput;
use crate::AppState;

pub async fn list_order_items(
    state: AppState,
    params: PathParams,
) -> Result<Response, ServiceError> {
    let order_id = params.id("id", "Invalid order ID")?;
    let response = state.services.orders.list_order_items(order_id).await?;
    Ok(success_response(response))
}

pub async fn add_order_item(
    state: AppState,
    params: PathParams,
    req: Request,
) -> Result<Response, ServiceError> {
    let order_id = params.id("id", "Invalid order ID")?;
    let item: LineItemInput = json_body(req).await?;
    let response = state.services.orders.add_order_item(order_id, item).await?;
    Ok(created_response(response))
}

pub async fn update_order_item() -> Result<Response, ServiceError> {
    Err(ServiceError::NotImplemented(
        "Update order item not implemented".to_string(),
    ))
}

pub async fn delete_order_item() -> Result<Response, ServiceError> {
    Err(ServiceError::NotImplemented(
        "Delete order item not implemented".to_string(),
    ))
}
