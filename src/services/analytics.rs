use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::status::pipeline_rank;
use crate::entities::{
    customer, product, sales_order, sales_order_item, sales_representative, OrderStatus,
};
use crate::errors::ServiceError;

/// Trailing window for the top-customer ranking. Unrecognised parameter
/// values fall back to all-time, mirroring the module's established
/// behaviour for this endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingWindow {
    ThirtyDays,
    NinetyDays,
    OneYear,
    AllTime,
}

impl TrailingWindow {
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None => Self::OneYear,
            Some("30_days") => Self::ThirtyDays,
            Some("90_days") => Self::NinetyDays,
            Some("1_year") => Self::OneYear,
            Some(_) => Self::AllTime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThirtyDays => "30_days",
            Self::NinetyDays => "90_days",
            Self::OneYear => "1_year",
            Self::AllTime => "all_time",
        }
    }

    fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::ThirtyDays => Some(today - Duration::days(30)),
            Self::NinetyDays => Some(today - Duration::days(90)),
            Self::OneYear => today.checked_sub_months(Months::new(12)),
            Self::AllTime => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PipelineStage {
    pub status: String,
    pub count: i64,
    pub total_value: Decimal,
    pub average_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub pipeline: Vec<PipelineStage>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub total_orders: i64,
    pub total_sales: Decimal,
    pub average_order_value: Decimal,
    pub completed_orders: i64,
    pub completed_sales: Decimal,
    pub completed_average_order_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopCustomer {
    pub id: i64,
    pub customer_number: String,
    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct TopCustomersReport {
    pub customers: Vec<TopCustomer>,
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RepPerformance {
    pub rep_id: i64,
    pub rep_name: String,
    pub total_orders: i64,
    pub total_sales: Decimal,
    pub average_order_value: Decimal,
    pub unique_customers: i64,
    pub closed_sales: Decimal,
    pub lost_sales: Decimal,
    pub conversion_rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub performance: Vec<RepPerformance>,
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProductSalesAnalysis {
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub total_quantity_sold: i64,
    pub total_revenue: Decimal,
    pub order_count: i64,
    pub average_quantity_per_order: Decimal,
    pub average_selling_price: Decimal,
    pub total_profit: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProductAnalysisReport {
    pub analysis: Vec<ProductSalesAnalysis>,
    pub period: String,
    pub count: usize,
}

pub const DEFAULT_TOP_CUSTOMERS_LIMIT: usize = 10;
pub const DEFAULT_PRODUCT_ANALYSIS_LIMIT: usize = 20;

/// Analytics over the transactional sales tables. Rows are fetched with
/// portable filters and aggregated in process, so every report works the same
/// against Postgres and SQLite.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Orders from the trailing 30 days grouped by status, in the fixed
    /// pipeline priority order.
    #[instrument(skip(self))]
    pub async fn sales_pipeline(&self) -> Result<PipelineReport, ServiceError> {
        let cutoff = Utc::now().date_naive() - Duration::days(30);

        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::OrderDate.gte(cutoff))
            .all(&*self.db)
            .await?;

        Ok(PipelineReport {
            pipeline: build_pipeline(&orders),
            period: "30_days".to_string(),
        })
    }

    /// Period totals over an inclusive date range.
    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SalesReport, ServiceError> {
        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::OrderDate.between(start_date, end_date))
            .all(&*self.db)
            .await?;

        Ok(build_sales_report(&orders))
    }

    /// Customers ranked by spend on shipped/delivered orders inside the
    /// trailing window.
    #[instrument(skip(self))]
    pub async fn top_customers(
        &self,
        window: TrailingWindow,
        limit: usize,
    ) -> Result<TopCustomersReport, ServiceError> {
        let mut query = sales_order::Entity::find().filter(
            sales_order::Column::Status.is_in([
                OrderStatus::Shipped.to_string(),
                OrderStatus::Delivered.to_string(),
            ]),
        );
        if let Some(cutoff) = window.cutoff(Utc::now().date_naive()) {
            query = query.filter(sales_order::Column::OrderDate.gte(cutoff));
        }
        let orders = query.all(&*self.db).await?;

        let customer_ids: HashSet<i64> = orders.iter().map(|o| o.customer_id).collect();
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

        let customers = build_top_customers(&orders, &customers, limit);

        Ok(TopCustomersReport {
            count: customers.len(),
            customers,
            period: window.as_str().to_string(),
        })
    }

    /// Per-representative performance over a required date range. Every
    /// active representative is reported, including those without orders.
    #[instrument(skip(self))]
    pub async fn sales_performance(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sales_rep_id: Option<i64>,
    ) -> Result<PerformanceReport, ServiceError> {
        let mut reps_query = sales_representative::Entity::find()
            .filter(sales_representative::Column::IsActive.eq(true));
        if let Some(rep_id) = sales_rep_id {
            reps_query = reps_query.filter(sales_representative::Column::Id.eq(rep_id));
        }
        let reps = reps_query.all(&*self.db).await?;

        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::OrderDate.between(start_date, end_date))
            .filter(sales_order::Column::SalesRepId.is_not_null())
            .all(&*self.db)
            .await?;

        let performance = build_performance(&reps, &orders);

        Ok(PerformanceReport {
            count: performance.len(),
            performance,
            period: format!("{} to {}", start_date, end_date),
        })
    }

    /// Product profitability over shipped/delivered orders in a required
    /// date range; inactive products are excluded.
    #[instrument(skip(self))]
    pub async fn product_analysis(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        limit: usize,
    ) -> Result<ProductAnalysisReport, ServiceError> {
        let period = format!("{} to {}", start_date, end_date);

        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::OrderDate.between(start_date, end_date))
            .filter(sales_order::Column::Status.is_in([
                OrderStatus::Shipped.to_string(),
                OrderStatus::Delivered.to_string(),
            ]))
            .all(&*self.db)
            .await?;

        if orders.is_empty() {
            return Ok(ProductAnalysisReport {
                analysis: Vec::new(),
                period,
                count: 0,
            });
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = sales_order_item::Entity::find()
            .filter(sales_order_item::Column::OrderId.is_in(order_ids))
            .all(&*self.db)
            .await?;

        let product_ids: HashSet<i64> = items.iter().map(|i| i.product_id).collect();
        let products: Vec<product::Model> = if product_ids.is_empty() {
            Vec::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .filter(product::Column::IsActive.eq(true))
                .all(&*self.db)
                .await?
        };

        let analysis = build_product_analysis(&items, &products, limit);

        Ok(ProductAnalysisReport {
            count: analysis.len(),
            analysis,
            period,
        })
    }
}

fn average(total: Decimal, count: i64) -> Decimal {
    if count > 0 {
        total / Decimal::from(count)
    } else {
        Decimal::ZERO
    }
}

fn build_pipeline(orders: &[sales_order::Model]) -> Vec<PipelineStage> {
    let mut groups: HashMap<&str, (i64, Decimal)> = HashMap::new();
    for order in orders {
        let entry = groups.entry(order.status.as_str()).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += order.total_amount;
    }

    let mut stages: Vec<PipelineStage> = groups
        .into_iter()
        .map(|(status, (count, total_value))| PipelineStage {
            status: status.to_string(),
            count,
            total_value,
            average_value: average(total_value, count),
        })
        .collect();

    stages.sort_by(|a, b| {
        pipeline_rank(&a.status)
            .cmp(&pipeline_rank(&b.status))
            .then_with(|| a.status.cmp(&b.status))
    });
    stages
}

fn build_sales_report(orders: &[sales_order::Model]) -> SalesReport {
    let completed_status = OrderStatus::Completed.to_string();

    let total_orders = orders.len() as i64;
    let total_sales: Decimal = orders.iter().map(|o| o.total_amount).sum();

    let completed: Vec<&sales_order::Model> = orders
        .iter()
        .filter(|o| o.status == completed_status)
        .collect();
    let completed_orders = completed.len() as i64;
    let completed_sales: Decimal = completed.iter().map(|o| o.total_amount).sum();

    SalesReport {
        total_orders,
        total_sales,
        average_order_value: average(total_sales, total_orders),
        completed_orders,
        completed_sales,
        completed_average_order_value: average(completed_sales, completed_orders),
    }
}

fn build_top_customers(
    orders: &[sales_order::Model],
    customers: &HashMap<i64, customer::Model>,
    limit: usize,
) -> Vec<TopCustomer> {
    struct Accum {
        orders: i64,
        spent: Decimal,
        first: NaiveDate,
        last: NaiveDate,
    }

    let mut groups: HashMap<i64, Accum> = HashMap::new();
    for order in orders {
        let entry = groups.entry(order.customer_id).or_insert(Accum {
            orders: 0,
            spent: Decimal::ZERO,
            first: order.order_date,
            last: order.order_date,
        });
        entry.orders += 1;
        entry.spent += order.total_amount;
        entry.first = entry.first.min(order.order_date);
        entry.last = entry.last.max(order.order_date);
    }

    let mut ranked: Vec<TopCustomer> = groups
        .into_iter()
        .filter_map(|(customer_id, accum)| {
            // A missing customer row means the reference data is owned
            // elsewhere and already gone; the ranking skips it.
            let customer = customers.get(&customer_id)?;
            Some(TopCustomer {
                id: customer.id,
                customer_number: customer.customer_number.clone(),
                company_name: customer.company_name.clone(),
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                email: customer.email.clone(),
                total_orders: accum.orders,
                total_spent: accum.spent,
                average_order_value: average(accum.spent, accum.orders),
                first_order_date: accum.first,
                last_order_date: accum.last,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.total_spent.cmp(&a.total_spent).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(limit);
    ranked
}

fn build_performance(
    reps: &[sales_representative::Model],
    orders: &[sales_order::Model],
) -> Vec<RepPerformance> {
    struct Accum {
        orders: i64,
        total: Decimal,
        customers: HashSet<i64>,
        closed: Decimal,
        lost: Decimal,
    }

    let delivered = OrderStatus::Delivered.to_string();
    let cancelled = OrderStatus::Cancelled.to_string();

    let mut groups: HashMap<i64, Accum> = HashMap::new();
    for order in orders {
        let Some(rep_id) = order.sales_rep_id else {
            continue;
        };
        let entry = groups.entry(rep_id).or_insert(Accum {
            orders: 0,
            total: Decimal::ZERO,
            customers: HashSet::new(),
            closed: Decimal::ZERO,
            lost: Decimal::ZERO,
        });
        entry.orders += 1;
        entry.total += order.total_amount;
        entry.customers.insert(order.customer_id);
        if order.status == delivered {
            entry.closed += order.total_amount;
        } else if order.status == cancelled {
            entry.lost += order.total_amount;
        }
    }

    let mut performance: Vec<RepPerformance> = reps
        .iter()
        .map(|rep| {
            let accum = groups.get(&rep.id);
            let (orders, total, customers, closed, lost) = match accum {
                Some(a) => (a.orders, a.total, a.customers.len() as i64, a.closed, a.lost),
                None => (0, Decimal::ZERO, 0, Decimal::ZERO, Decimal::ZERO),
            };
            let conversion_rate = if total > Decimal::ZERO {
                closed / total * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            RepPerformance {
                rep_id: rep.id,
                rep_name: rep.full_name(),
                total_orders: orders,
                total_sales: total,
                average_order_value: average(total, orders),
                unique_customers: customers,
                closed_sales: closed,
                lost_sales: lost,
                conversion_rate,
            }
        })
        .collect();

    performance.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.rep_id.cmp(&b.rep_id))
    });
    performance
}

fn build_product_analysis(
    items: &[sales_order_item::Model],
    products: &[product::Model],
    limit: usize,
) -> Vec<ProductSalesAnalysis> {
    struct Accum {
        quantity: i64,
        revenue: Decimal,
        orders: HashSet<i64>,
        rows: i64,
        price_sum: Decimal,
    }

    let mut groups: HashMap<i64, Accum> = HashMap::new();
    for item in items {
        let entry = groups.entry(item.product_id).or_insert(Accum {
            quantity: 0,
            revenue: Decimal::ZERO,
            orders: HashSet::new(),
            rows: 0,
            price_sum: Decimal::ZERO,
        });
        entry.quantity += i64::from(item.quantity);
        entry.revenue += item.line_total;
        entry.orders.insert(item.order_id);
        entry.rows += 1;
        entry.price_sum += item.unit_price;
    }

    let mut analysis: Vec<ProductSalesAnalysis> = products
        .iter()
        .filter_map(|product| {
            let accum = groups.get(&product.id)?;
            let total_profit = accum.revenue - Decimal::from(accum.quantity) * product.cost_price;
            let profit_margin = if accum.revenue > Decimal::ZERO {
                total_profit / accum.revenue * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            Some(ProductSalesAnalysis {
                product_id: product.id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                cost_price: product.cost_price,
                selling_price: product.selling_price,
                total_quantity_sold: accum.quantity,
                total_revenue: accum.revenue,
                order_count: accum.orders.len() as i64,
                average_quantity_per_order: average(Decimal::from(accum.quantity), accum.rows),
                average_selling_price: average(accum.price_sum, accum.rows),
                total_profit,
                profit_margin,
            })
        })
        .collect();

    analysis.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    analysis.truncate(limit);
    analysis
}
