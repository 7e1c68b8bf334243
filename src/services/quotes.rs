use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{ConditionalStatement, Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{
    customer, sales_order, sales_order_item, sales_quote, sales_quote_item, sales_representative,
    OrderStatus, QuoteStatus,
};
use crate::errors::ServiceError;
use crate::numbering::NumberSequence;
use crate::services::orders::OrderCreated;
use crate::services::{
    document_totals, parse_date, CustomerSummary, LineItemInput, SalesRepSummary, TaxPolicy,
    DEFAULT_CURRENCY, DEFAULT_LIST_LIMIT,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    pub customer_id: i64,
    pub quote_date: String,
    pub valid_until: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub sales_rep_id: Option<i64>,
    #[serde(default = "default_created_by")]
    pub created_by: i64,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
}

fn default_created_by() -> i64 {
    1
}

#[derive(Debug, Default)]
pub struct QuoteListFilter {
    pub status: Option<String>,
    pub customer_id: Option<i64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    #[serde(flatten)]
    pub quote: sales_quote::Model,
    pub customer: Option<CustomerSummary>,
    pub sales_rep: Option<SalesRepSummary>,
}

#[derive(Debug, Serialize)]
pub struct QuoteListResponse {
    pub quotes: Vec<QuoteSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct QuoteCreated {
    pub quote_id: i64,
    pub quote_number: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub message: String,
}

/// Sales quote repository: list/create plus the draft-to-order conversion.
#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DbPool>,
    quote_numbers: Arc<NumberSequence>,
    order_numbers: Arc<NumberSequence>,
    tax: Arc<dyn TaxPolicy>,
}

impl QuoteService {
    pub fn new(
        db: Arc<DbPool>,
        quote_numbers: Arc<NumberSequence>,
        order_numbers: Arc<NumberSequence>,
        tax: Arc<dyn TaxPolicy>,
    ) -> Self {
        Self {
            db,
            quote_numbers,
            order_numbers,
            tax,
        }
    }

    /// Lists quotes, newest first, with optional status/customer filters.
    /// Per-row decode failures are skipped, same as the order list.
    #[instrument(skip(self))]
    pub async fn list_quotes(&self, filter: QuoteListFilter) -> Result<QuoteListResponse, ServiceError> {
        let mut query = sales_quote::Entity::find();

        if let Some(status) = &filter.status {
            query = query.filter(sales_quote::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sales_quote::Column::CustomerId.eq(customer_id));
        }

        let stmt = query
            .order_by_desc(sales_quote::Column::QuoteDate)
            .limit(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .build(self.db.get_database_backend());

        let rows = self.db.query_all(stmt).await?;

        let mut quotes = Vec::with_capacity(rows.len());
        for row in &rows {
            match sales_quote::Model::from_query_result(row, "") {
                Ok(quote) => quotes.push(quote),
                Err(err) => {
                    warn!(error = %err, "skipping sales quote row that failed to decode");
                }
            }
        }

        let customer_ids: HashSet<i64> = quotes.iter().map(|q| q.customer_id).collect();
        let customers: HashMap<i64, customer::Model> = if customer_ids.is_empty() {
            HashMap::new()
        } else {
            customer::Entity::find()
                .filter(customer::Column::Id.is_in(customer_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let rep_ids: HashSet<i64> = quotes.iter().filter_map(|q| q.sales_rep_id).collect();
        let reps: HashMap<i64, sales_representative::Model> = if rep_ids.is_empty() {
            HashMap::new()
        } else {
            sales_representative::Entity::find()
                .filter(sales_representative::Column::Id.is_in(rep_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|r| (r.id, r))
                .collect()
        };

        let quotes: Vec<QuoteSummary> = quotes
            .into_iter()
            .map(|quote| {
                let customer = customers.get(&quote.customer_id).map(CustomerSummary::from);
                let sales_rep = quote
                    .sales_rep_id
                    .and_then(|id| reps.get(&id))
                    .map(SalesRepSummary::from);
                QuoteSummary {
                    quote,
                    customer,
                    sales_rep,
                }
            })
            .collect();

        Ok(QuoteListResponse {
            count: quotes.len(),
            quotes,
        })
    }

    /// Creates a quote header and its line items in one transaction.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_quote(&self, request: CreateQuoteRequest) -> Result<QuoteCreated, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &request.items {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let quote_date = parse_date(&request.quote_date, "quote date")?;
        let valid_until = request
            .valid_until
            .as_deref()
            .map(|raw| parse_date(raw, "valid until date"))
            .transpose()?;

        let (subtotal, discount_amount) = document_totals(&request.items);
        let tax_amount = self.tax.tax_amount(subtotal);
        let total_amount = subtotal + tax_amount - discount_amount;
        let quote_number = self.quote_numbers.next();

        let txn = self.db.begin().await?;

        let quote = sales_quote::ActiveModel {
            quote_number: Set(quote_number.clone()),
            customer_id: Set(request.customer_id),
            quote_date: Set(quote_date),
            valid_until: Set(valid_until),
            status: Set(QuoteStatus::Draft.to_string()),
            subtotal: Set(subtotal),
            tax_amount: Set(tax_amount),
            discount_amount: Set(discount_amount),
            total_amount: Set(total_amount),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            notes: Set(request.notes),
            terms: Set(request.terms),
            sales_rep_id: Set(request.sales_rep_id),
            created_by: Set(request.created_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for item in &request.items {
            sales_quote_item::ActiveModel {
                quote_id: Set(quote.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                discount_percent: Set(item.discount_percent),
                discount_amount: Set(item.discount_amount),
                line_total: Set(item.line_total()),
                notes: Set(item.notes.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(quote_id = quote.id, quote_number = %quote_number, "sales quote created");

        Ok(QuoteCreated {
            quote_id: quote.id,
            quote_number,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
            message: "Sales quote created successfully".to_string(),
        })
    }

    /// Converts a draft quote into a new sales order.
    ///
    /// The order header, the set-based item copy and the quote status flip
    /// are one atomic unit; a quote can only ever convert once because the
    /// conversion moves it out of draft.
    #[instrument(skip(self))]
    pub async fn convert_quote(&self, quote_id: i64) -> Result<OrderCreated, ServiceError> {
        let quote = sales_quote::Entity::find_by_id(quote_id)
            .filter(sales_quote::Column::Status.eq(QuoteStatus::Draft.to_string()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Quote not found or not in draft status".to_string())
            })?;

        let order_number = self.order_numbers.next();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let order = sales_order::ActiveModel {
            order_number: Set(order_number.clone()),
            customer_id: Set(quote.customer_id),
            quote_id: Set(Some(quote.id)),
            order_date: Set(quote.quote_date),
            required_date: Set(None),
            shipped_date: Set(None),
            status: Set(OrderStatus::Pending.to_string()),
            subtotal: Set(quote.subtotal),
            tax_amount: Set(quote.tax_amount),
            discount_amount: Set(quote.discount_amount),
            shipping_amount: Set(Decimal::ZERO),
            total_amount: Set(quote.total_amount),
            currency: Set(quote.currency.clone()),
            payment_terms: Set(quote.terms.clone()),
            shipping_address: Set(None),
            billing_address: Set(None),
            notes: Set(quote.notes.clone()),
            sales_rep_id: Set(quote.sales_rep_id),
            created_by: Set(quote.created_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // Item rows are copied set-based inside the store; values the quote
        // already validated are not re-validated row by row.
        let mut select = Query::select();
        select
            .expr(Expr::val(order.id))
            .column(sales_quote_item::Column::ProductId)
            .column(sales_quote_item::Column::Quantity)
            .column(sales_quote_item::Column::UnitPrice)
            .column(sales_quote_item::Column::DiscountPercent)
            .column(sales_quote_item::Column::DiscountAmount)
            .column(sales_quote_item::Column::LineTotal)
            .expr(Expr::val(0_i32))
            .column(sales_quote_item::Column::Notes)
            .expr(Expr::val(now))
            .from(sales_quote_item::Entity)
            .and_where(Expr::col(sales_quote_item::Column::QuoteId).eq(quote.id));

        let mut copy_items = Query::insert();
        copy_items
            .into_table(sales_order_item::Entity)
            .columns([
                sales_order_item::Column::OrderId,
                sales_order_item::Column::ProductId,
                sales_order_item::Column::Quantity,
                sales_order_item::Column::UnitPrice,
                sales_order_item::Column::DiscountPercent,
                sales_order_item::Column::DiscountAmount,
                sales_order_item::Column::LineTotal,
                sales_order_item::Column::ShippedQuantity,
                sales_order_item::Column::Notes,
                sales_order_item::Column::CreatedAt,
            ])
            .select_from(select)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        txn.execute(self.db.get_database_backend().build(&copy_items))
            .await?;

        let mut accepted: sales_quote::ActiveModel = quote.into();
        accepted.status = Set(QuoteStatus::Accepted.to_string());
        accepted.updated_at = Set(now);
        accepted.update(&txn).await?;

        txn.commit().await?;

        info!(quote_id, order_id = order.id, "quote converted to order");

        Ok(OrderCreated {
            order_id: order.id,
            order_number,
            created_at: order.created_at,
            updated_at: order.updated_at,
            message: "Quote converted to order successfully".to_string(),
        })
    }
}
