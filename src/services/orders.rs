use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::db::{DbPool, UpdateBuilder};
use crate::entities::{
    customer, product, sales_order, sales_order_item, sales_representative, OrderStatus,
};
use crate::errors::ServiceError;
use crate::numbering::NumberSequence;
use crate::services::{
    document_totals, parse_date, CustomerSummary, LineItemInput, ProductSummary, SalesRepSummary,
    TaxPolicy, DEFAULT_CURRENCY, DEFAULT_LIST_LIMIT,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub quote_id: Option<i64>,
    pub order_date: String,
    pub required_date: Option<String>,
    pub payment_terms: Option<String>,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub notes: Option<String>,
    pub sales_rep_id: Option<i64>,
    /// Creator id supplied by the host; identity management is external.
    #[serde(default = "default_created_by")]
    pub created_by: i64,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
}

fn default_created_by() -> i64 {
    1
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub required_date: Option<String>,
    pub shipped_date: Option<String>,
    pub payment_terms: Option<String>,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<String>,
    pub customer_id: Option<i64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: sales_order::Model,
    pub customer: Option<CustomerSummary>,
    pub sales_rep: Option<SalesRepSummary>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: sales_order_item::Model,
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: sales_order::Model,
    pub customer: Option<CustomerSummary>,
    pub sales_rep: Option<SalesRepSummary>,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemsResponse {
    pub items: Vec<OrderItemDetail>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub order_id: i64,
    pub order_number: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OrderUpdated {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemCreated {
    pub id: i64,
    pub created_at: chrono::DateTime<Utc>,
    pub message: String,
}

/// Sales order repository: typed reads plus the transactional create path.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    numbers: Arc<NumberSequence>,
    tax: Arc<dyn TaxPolicy>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, numbers: Arc<NumberSequence>, tax: Arc<dyn TaxPolicy>) -> Self {
        Self { db, numbers, tax }
    }

    /// Lists orders, newest first, with optional status/customer filters.
    ///
    /// Rows are decoded individually so one undecodable row degrades the list
    /// instead of failing it; each row is independent, so a skip cannot mask
    /// a systemic failure.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderListFilter) -> Result<OrderListResponse, ServiceError> {
        let mut query = sales_order::Entity::find();

        if let Some(status) = &filter.status {
            query = query.filter(sales_order::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
        }

        let stmt = query
            .order_by_desc(sales_order::Column::OrderDate)
            .limit(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .build(self.db.get_database_backend());

        let rows = self.db.query_all(stmt).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            match sales_order::Model::from_query_result(row, "") {
                Ok(order) => orders.push(order),
                Err(err) => {
                    warn!(error = %err, "skipping sales order row that failed to decode");
                }
            }
        }

        let customers = self
            .load_customers(orders.iter().map(|o| o.customer_id))
            .await?;
        let reps = self
            .load_sales_reps(orders.iter().filter_map(|o| o.sales_rep_id))
            .await?;

        let orders: Vec<OrderSummary> = orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.customer_id).map(CustomerSummary::from);
                let sales_rep = order
                    .sales_rep_id
                    .and_then(|id| reps.get(&id))
                    .map(SalesRepSummary::from);
                OrderSummary {
                    order,
                    customer,
                    sales_rep,
                }
            })
            .collect();

        Ok(OrderListResponse {
            count: orders.len(),
            orders,
        })
    }

    /// Fetches one order with customer, representative and line items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetail, ServiceError> {
        let order = sales_order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;

        let customer = customer::Entity::find_by_id(order.customer_id)
            .one(&*self.db)
            .await?;
        let sales_rep = match order.sales_rep_id {
            Some(rep_id) => {
                sales_representative::Entity::find_by_id(rep_id)
                    .one(&*self.db)
                    .await?
            }
            None => None,
        };

        let items = self.order_items(order_id).await?;

        Ok(OrderDetail {
            order,
            customer: customer.as_ref().map(CustomerSummary::from),
            sales_rep: sales_rep.as_ref().map(SalesRepSummary::from),
            items,
        })
    }

    /// Creates an order header and its line items in one transaction; either
    /// everything is persisted or nothing is.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderCreated, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &request.items {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        }

        let order_date = parse_date(&request.order_date, "order date")?;
        let required_date = request
            .required_date
            .as_deref()
            .map(|raw| parse_date(raw, "required date"))
            .transpose()?;

        let (subtotal, discount_amount) = document_totals(&request.items);
        let tax_amount = self.tax.tax_amount(subtotal);
        let total_amount = subtotal + tax_amount - discount_amount;
        let order_number = self.numbers.next();

        let txn = self.db.begin().await?;

        let order = sales_order::ActiveModel {
            order_number: Set(order_number.clone()),
            customer_id: Set(request.customer_id),
            quote_id: Set(request.quote_id),
            order_date: Set(order_date),
            required_date: Set(required_date),
            shipped_date: Set(None),
            status: Set(OrderStatus::Pending.to_string()),
            subtotal: Set(subtotal),
            tax_amount: Set(tax_amount),
            discount_amount: Set(discount_amount),
            shipping_amount: Set(Decimal::ZERO),
            total_amount: Set(total_amount),
            currency: Set(DEFAULT_CURRENCY.to_string()),
            payment_terms: Set(request.payment_terms),
            shipping_address: Set(request.shipping_address),
            billing_address: Set(request.billing_address),
            notes: Set(request.notes),
            sales_rep_id: Set(request.sales_rep_id),
            created_by: Set(request.created_by),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for item in &request.items {
            sales_order_item::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                discount_percent: Set(item.discount_percent),
                discount_amount: Set(item.discount_amount),
                line_total: Set(item.line_total()),
                shipped_quantity: Set(0),
                notes: Set(item.notes.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(order_id = order.id, order_number = %order_number, "sales order created");

        Ok(OrderCreated {
            order_id: order.id,
            order_number,
            created_at: order.created_at,
            updated_at: order.updated_at,
            message: "Sales order created successfully".to_string(),
        })
    }

    /// Applies a partial update; only supplied fields change.
    #[instrument(skip(self, request))]
    pub async fn update_order(
        &self,
        order_id: i64,
        request: UpdateOrderRequest,
    ) -> Result<OrderUpdated, ServiceError> {
        let mut builder = UpdateBuilder::<sales_order::Entity>::new();

        if let Some(status) = request.status {
            builder = builder.set(sales_order::Column::Status, status);
        }
        if let Some(raw) = request.required_date.as_deref() {
            builder = builder.set(
                sales_order::Column::RequiredDate,
                parse_date(raw, "required date")?,
            );
        }
        if let Some(raw) = request.shipped_date.as_deref() {
            builder = builder.set(
                sales_order::Column::ShippedDate,
                parse_date(raw, "shipped date")?,
            );
        }
        if let Some(payment_terms) = request.payment_terms {
            builder = builder.set(sales_order::Column::PaymentTerms, payment_terms);
        }
        if let Some(shipping_address) = request.shipping_address {
            builder = builder.set(sales_order::Column::ShippingAddress, shipping_address);
        }
        if let Some(billing_address) = request.billing_address {
            builder = builder.set(sales_order::Column::BillingAddress, billing_address);
        }
        if let Some(notes) = request.notes {
            builder = builder.set(sales_order::Column::Notes, notes);
        }

        if builder.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }
        builder = builder.set(sales_order::Column::UpdatedAt, Utc::now());

        let stmt = builder.build(
            self.db.get_database_backend(),
            sales_order::Column::Id,
            order_id,
        )?;
        let result = self.db.execute(stmt).await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Sales order not found".to_string()));
        }

        info!(order_id, "sales order updated");

        Ok(OrderUpdated {
            message: "Sales order updated successfully".to_string(),
        })
    }

    /// Lists the line items of one order with product metadata.
    #[instrument(skip(self))]
    pub async fn list_order_items(&self, order_id: i64) -> Result<OrderItemsResponse, ServiceError> {
        sales_order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;

        let items = self.order_items(order_id).await?;

        Ok(OrderItemsResponse {
            count: items.len(),
            items,
        })
    }

    /// Appends one line item to an existing order.
    #[instrument(skip(self, item))]
    pub async fn add_order_item(
        &self,
        order_id: i64,
        item: LineItemInput,
    ) -> Result<OrderItemCreated, ServiceError> {
        item.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        sales_order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Sales order not found".to_string()))?;

        let model = sales_order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            discount_percent: Set(item.discount_percent),
            discount_amount: Set(item.discount_amount),
            line_total: Set(item.line_total()),
            shipped_quantity: Set(0),
            notes: Set(item.notes),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(order_id, item_id = model.id, "order item created");

        Ok(OrderItemCreated {
            id: model.id,
            created_at: model.created_at,
            message: "Order item created successfully".to_string(),
        })
    }

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, ServiceError> {
        let items = sales_order_item::Entity::find()
            .filter(sales_order_item::Column::OrderId.eq(order_id))
            .order_by_asc(sales_order_item::Column::Id)
            .all(&*self.db)
            .await?;

        let product_ids: HashSet<i64> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<i64, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(items
            .into_iter()
            .map(|item| {
                let product = products.get(&item.product_id).map(ProductSummary::from);
                OrderItemDetail { item, product }
            })
            .collect())
    }

    async fn load_customers(
        &self,
        ids: impl Iterator<Item = i64>,
    ) -> Result<HashMap<i64, customer::Model>, ServiceError> {
        let ids: HashSet<i64> = ids.collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(customer::Entity::find()
            .filter(customer::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect())
    }

    async fn load_sales_reps(
        &self,
        ids: impl Iterator<Item = i64>,
    ) -> Result<HashMap<i64, sales_representative::Model>, ServiceError> {
        let ids: HashSet<i64> = ids.collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(sales_representative::Entity::find()
            .filter(sales_representative::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect())
    }
}
