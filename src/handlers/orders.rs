use axum::{extract::Request, response::Response};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, json_body, query_params, success_response};
use crate::routing::PathParams;
use crate::services::orders::{CreateOrderRequest, OrderListFilter, UpdateOrderRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub customer_id: Option<i64>,
    pub limit: Option<u64>,
}

impl From<OrderListParams> for OrderListFilter {
    fn from(params: OrderListParams) -> Self {
        Self {
            status: params.status,
            customer_id: params.customer_id,
            limit: params.limit,
        }
    }
}

pub async fn list_orders(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: OrderListParams = query_params(&req)?;
    let response = state.services.orders.list_orders(params.into()).await?;
    Ok(success_response(response))
}

pub async fn get_order(state: AppState, params: PathParams) -> Result<Response, ServiceError> {
    let order_id = params.id("id", "Invalid order ID")?;
    let response = state.services.orders.get_order(order_id).await?;
    Ok(success_response(response))
}

pub async fn create_order(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let request: CreateOrderRequest = json_body(req).await?;
    let response = state.services.orders.create_order(request).await?;
    Ok(created_response(response))
}

pub async fn update_order(
    state: AppState,
    params: PathParams,
    req: Request,
) -> Result<Response, ServiceError> {
    let order_id = params.id("id", "Invalid order ID")?;
    let request: UpdateOrderRequest = json_body(req).await?;
    let response = state.services.orders.update_order(order_id, request).await?;
    Ok(success_response(response))
}
