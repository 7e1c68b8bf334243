pub mod analytics;
pub mod common;
pub mod order_items;
pub mod orders;
pub mod quotes;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::numbering::NumberSequence;
use crate::routing::{Route, RouteMatch};
use crate::services::analytics::AnalyticsService;
use crate::services::forecasting::ForecastService;
use crate::services::orders::OrderService;
use crate::services::quotes::QuoteService;
use crate::services::{NoTax, TaxPolicy};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub quotes: Arc<QuoteService>,
    pub analytics: Arc<AnalyticsService>,
    pub forecasting: Arc<ForecastService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig) -> Self {
        let tax: Arc<dyn TaxPolicy> = Arc::new(NoTax);
        let order_numbers = Arc::new(NumberSequence::new(config.order_number_prefix.clone()));
        let quote_numbers = Arc::new(NumberSequence::new(config.quote_number_prefix.clone()));

        let orders = Arc::new(OrderService::new(
            db.clone(),
            order_numbers.clone(),
            tax.clone(),
        ));
        let quotes = Arc::new(QuoteService::new(
            db.clone(),
            quote_numbers,
            order_numbers,
            tax,
        ));
        let analytics = Arc::new(AnalyticsService::new(db.clone()));
        let forecasting = Arc::new(ForecastService::new(db));

        Self {
            orders,
            quotes,
            analytics,
            forecasting,
        }
    }
}

/// Entry point for every request the host forwards to the module. Resolves
/// the route, dispatches to the matching handler and turns any error into the
/// uniform error envelope.
pub async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let matched = match state.routes.resolve(method.as_str(), &path) {
        Ok(matched) => matched,
        Err(err) => return err.into_response(),
    };

    match route_request(state, matched, req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn route_request(
    state: AppState,
    matched: RouteMatch,
    req: Request,
) -> Result<Response, ServiceError> {
    let RouteMatch { route, params } = matched;

    match route {
        Route::ListOrders => orders::list_orders(state, req).await,
        Route::CreateOrder => orders::create_order(state, req).await,
        Route::GetOrder => orders::get_order(state, params).await,
        Route::UpdateOrder => orders::update_order(state, params, req).await,
        Route::ListOrderItems => order_items::list_order_items(state, params).await,
        Route::AddOrderItem => order_items::add_order_item(state, params, req).await,
        Route::UpdateOrderItem => order_items::update_order_item().await,
        Route::DeleteOrderItem => order_items::delete_order_item().await,
        Route::ListQuotes => quotes::list_quotes(state, req).await,
        Route::CreateQuote => quotes::create_quote(state, req).await,
        Route::ConvertQuote => quotes::convert_quote(state, params).await,
        Route::SalesReport => analytics::sales_report(state, req).await,
        Route::Pipeline => analytics::sales_pipeline(state).await,
        Route::Forecast => analytics::sales_forecast(state, req).await,
        Route::TopCustomers => analytics::top_customers(state, req).await,
        Route::SalesPerformance => analytics::sales_performance(state, req).await,
        Route::ProductAnalysis => analytics::product_analysis(state, req).await,
    }
}
