use axum::{extract::Request, response::Response};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, json_body, query_params, success_response};
use crate::routing::PathParams;
use crate::services::quotes::{CreateQuoteRequest, QuoteListFilter};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteListParams {
    pub status: Option<String>,
    pub customer_id: Option<i64>,
    pub limit: Option<u64>,
}

pub async fn list_quotes(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: QuoteListParams = query_params(&req)?;
    let response = state
        .services
        .quotes
        .list_quotes(QuoteListFilter {
            status: params.status,
            customer_id: params.customer_id,
            limit: params.limit,
        })
        .await?;
    Ok(success_response(response))
}

pub async fn create_quote(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let request: CreateQuoteRequest = json_body(req).await?;
    let response = state.services.quotes.create_quote(request).await?;
    Ok(created_response(response))
}

pub async fn convert_quote(state: AppState, params: PathParams) -> Result<Response, ServiceError> {
    let quote_id = params.id("id", "Invalid quote ID")?;
    let response = state.services.quotes.convert_quote(quote_id).await?;
    Ok(created_response(response))
}
