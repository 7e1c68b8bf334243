use axum::{extract::Request, response::Response};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{query_params, success_response, DateRangeParams};
use crate::services::analytics::{
    TrailingWindow, DEFAULT_PRODUCT_ANALYSIS_LIMIT, DEFAULT_TOP_CUSTOMERS_LIMIT,
};
use crate::services::forecasting::ForecastPeriod;
use crate::AppState;

pub async fn sales_pipeline(state: AppState) -> Result<Response, ServiceError> {
    let report = state.services.analytics.sales_pipeline().await?;
    Ok(success_response(report))
}

pub async fn sales_report(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: DateRangeParams = query_params(&req)?;
    let (start_date, end_date) = params.resolve()?;
    let report = state
        .services
        .analytics
        .sales_report(start_date, end_date)
        .await?;
    Ok(success_response(report))
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub period: Option<String>,
}

pub async fn sales_forecast(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: ForecastParams = query_params(&req)?;
    let period = ForecastPeriod::from_param(params.period.as_deref())?;
    let report = state.services.forecasting.sales_forecast(period).await?;
    Ok(success_response(report))
}

#[derive(Debug, Deserialize)]
pub struct TopCustomersParams {
    pub limit: Option<usize>,
    pub period: Option<String>,
}

pub async fn top_customers(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: TopCustomersParams = query_params(&req)?;
    let window = TrailingWindow::from_param(params.period.as_deref());
    let report = state
        .services
        .analytics
        .top_customers(window, params.limit.unwrap_or(DEFAULT_TOP_CUSTOMERS_LIMIT))
        .await?;
    Ok(success_response(report))
}

#[derive(Debug, Deserialize)]
pub struct PerformanceParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sales_rep_id: Option<i64>,
}

pub async fn sales_performance(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: PerformanceParams = query_params(&req)?;
    let range = DateRangeParams {
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let (start_date, end_date) = range.resolve()?;
    let report = state
        .services
        .analytics
        .sales_performance(start_date, end_date, params.sales_rep_id)
        .await?;
    Ok(success_response(report))
}

#[derive(Debug, Deserialize)]
pub struct ProductAnalysisParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

pub async fn product_analysis(state: AppState, req: Request) -> Result<Response, ServiceError> {
    let params: ProductAnalysisParams = query_params(&req)?;
    let range = DateRangeParams {
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let (start_date, end_date) = range.resolve()?;
    let report = state
        .services
        .analytics
        .product_analysis(
            start_date,
            end_date,
            params.limit.unwrap_or(DEFAULT_PRODUCT_ANALYSIS_LIMIT),
        )
        .await?;
    Ok(success_response(report))
}
