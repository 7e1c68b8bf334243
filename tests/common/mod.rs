#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Schema, Set,
};

use sales_api::config::AppConfig;
use sales_api::entities::{
    customer, product, sales_order, sales_order_item, sales_quote, sales_quote_item,
    sales_representative,
};
use sales_api::numbering::NumberSequence;
use sales_api::services::orders::OrderService;
use sales_api::services::quotes::QuoteService;
use sales_api::services::{LineItemInput, NoTax, TaxPolicy};

/// One shared in-memory SQLite database with the module schema applied.
/// A single pooled connection keeps every query on the same database.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("sqlite in-memory connection");

    let schema = Schema::new(DbBackend::Sqlite);
    let backend = db.get_database_backend();
    let statements = vec![
        schema.create_table_from_entity(customer::Entity),
        schema.create_table_from_entity(sales_representative::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(sales_order::Entity),
        schema.create_table_from_entity(sales_order_item::Entity),
        schema.create_table_from_entity(sales_quote::Entity),
        schema.create_table_from_entity(sales_quote_item::Entity),
    ];
    for statement in statements {
        db.execute(backend.build(&statement))
            .await
            .expect("create table");
    }

    Arc::new(db)
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
        order_number_prefix: "SO".to_string(),
        quote_number_prefix: "SQ".to_string(),
    }
}

pub fn order_service(db: Arc<DatabaseConnection>) -> OrderService {
    let tax: Arc<dyn TaxPolicy> = Arc::new(NoTax);
    OrderService::new(db, Arc::new(NumberSequence::new("SO")), tax)
}

pub fn quote_service(db: Arc<DatabaseConnection>) -> QuoteService {
    let tax: Arc<dyn TaxPolicy> = Arc::new(NoTax);
    QuoteService::new(
        db,
        Arc::new(NumberSequence::new("SQ")),
        Arc::new(NumberSequence::new("SO")),
        tax,
    )
}

pub async fn seed_customer(db: &DatabaseConnection, id: i64) -> customer::Model {
    customer::ActiveModel {
        id: Set(id),
        customer_number: Set(format!("C-{}", id)),
        company_name: Set(Some(format!("Company {}", id))),
        first_name: Set(Some("Jordan".to_string())),
        last_name: Set(Some("Reyes".to_string())),
        email: Set(Some(format!("customer{}@example.com", id))),
        phone: Set(None),
    }
    .insert(db)
    .await
    .expect("seed customer")
}

pub async fn seed_rep(db: &DatabaseConnection, id: i64, active: bool) -> sales_representative::Model {
    sales_representative::ActiveModel {
        id: Set(id),
        first_name: Set("Ada".to_string()),
        last_name: Set(format!("Moore{}", id)),
        email: Set(None),
        is_active: Set(active),
    }
    .insert(db)
    .await
    .expect("seed sales representative")
}

pub async fn seed_product(db: &DatabaseConnection, id: i64, cost: Decimal) -> product::Model {
    product::ActiveModel {
        id: Set(id),
        name: Set(format!("Product {}", id)),
        sku: Set(format!("SKU-{}", id)),
        description: Set(None),
        cost_price: Set(cost),
        selling_price: Set(cost * dec!(2)),
        is_active: Set(true),
    }
    .insert(db)
    .await
    .expect("seed product")
}

/// Inserts an order row directly, bypassing the service, for analytics tests
/// that need precise dates and totals.
pub async fn seed_order_row(
    db: &DatabaseConnection,
    customer_id: i64,
    sales_rep_id: Option<i64>,
    status: &str,
    order_date: NaiveDate,
    total: Decimal,
) -> sales_order::Model {
    static SEEDED: AtomicU64 = AtomicU64::new(0);
    let seq = SEEDED.fetch_add(1, Ordering::Relaxed);
    sales_order::ActiveModel {
        order_number: Set(format!("SO-SEED-{}-{}", Utc::now().timestamp(), seq)),
        customer_id: Set(customer_id),
        quote_id: Set(None),
        order_date: Set(order_date),
        required_date: Set(None),
        shipped_date: Set(None),
        status: Set(status.to_string()),
        subtotal: Set(total),
        tax_amount: Set(Decimal::ZERO),
        discount_amount: Set(Decimal::ZERO),
        shipping_amount: Set(Decimal::ZERO),
        total_amount: Set(total),
        currency: Set("USD".to_string()),
        payment_terms: Set(None),
        shipping_address: Set(None),
        billing_address: Set(None),
        notes: Set(None),
        sales_rep_id: Set(sales_rep_id),
        created_by: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed order row")
}

pub async fn seed_item_row(
    db: &DatabaseConnection,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
) -> sales_order_item::Model {
    sales_order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        discount_percent: Set(Decimal::ZERO),
        discount_amount: Set(Decimal::ZERO),
        line_total: Set(Decimal::from(quantity) * unit_price),
        shipped_quantity: Set(0),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed order item row")
}

pub fn line_item(product_id: i64, quantity: i32, unit_price: Decimal, discount: Decimal) -> LineItemInput {
    LineItemInput {
        product_id,
        quantity,
        unit_price,
        discount_percent: Decimal::ZERO,
        discount_amount: discount,
        notes: None,
    }
}
