//! Sales module backend.
//!
//! Order and quote management plus sales analytics (pipeline, reports,
//! forecasting, performance) over a relational store, packaged so a host ERP
//! runtime can mount the whole surface behind a single dispatch point.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod numbering;
pub mod routing;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::routing::RouteTable;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub routes: Arc<RouteTable>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            routes: Arc::new(RouteTable::sales()),
            services,
        }
    }
}

/// Builds the module router: a health probe plus the module dispatch point,
/// which resolves every other path through the route table. A host nests this
/// router under its module mount prefix; the standalone binary serves it at
/// the root.
pub fn module_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(handlers::dispatch)
        .with_state(state)
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "service": "sales-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
