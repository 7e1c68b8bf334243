use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{sales_order, OrderStatus};
use crate::errors::ServiceError;

/// Bucket width for the sales forecast, with its trailing lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastPeriod {
    Monthly,
    Quarterly,
    Yearly,
}

impl ForecastPeriod {
    /// Missing parameter defaults to monthly; anything else unknown is a
    /// validation error.
    pub fn from_param(param: Option<&str>) -> Result<Self, ServiceError> {
        match param {
            None | Some("monthly") => Ok(Self::Monthly),
            Some("quarterly") => Ok(Self::Quarterly),
            Some("yearly") => Ok(Self::Yearly),
            Some(other) => Err(ServiceError::ValidationError(format!(
                "Invalid forecast period '{}': expected monthly, quarterly or yearly",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// 12 months of monthly buckets, 4 quarters, or 3 years of history.
    fn lookback_months(&self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 12,
            Self::Yearly => 36,
        }
    }

    fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Self::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Self::Quarterly => format!("{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
            Self::Yearly => format!("{:04}", date.year()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalesDataPoint {
    pub period: String,
    pub actual_sales: Decimal,
    pub order_count: i64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ForecastPoint {
    pub period: String,
    pub predicted: f64,
}

#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub historical_data: Vec<SalesDataPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub period: String,
    pub generated_at: DateTime<Utc>,
}

/// Time-bucketed sales forecasting over shipped/delivered orders, projected
/// with an ordinary-least-squares line. Deliberately simple: no seasonality
/// and no confidence interval.
#[derive(Clone)]
pub struct ForecastService {
    db: Arc<DbPool>,
}

impl ForecastService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn sales_forecast(&self, period: ForecastPeriod) -> Result<ForecastReport, ServiceError> {
        let today = Utc::now().date_naive();
        let cutoff = today
            .checked_sub_months(Months::new(period.lookback_months()))
            .unwrap_or(today);

        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::OrderDate.gte(cutoff))
            .filter(sales_order::Column::Status.is_in([
                OrderStatus::Shipped.to_string(),
                OrderStatus::Delivered.to_string(),
            ]))
            .all(&*self.db)
            .await?;

        let historical_data = bucket_sales(&orders, period);
        let forecast = project(&historical_data);

        Ok(ForecastReport {
            historical_data,
            forecast,
            period: period.as_str().to_string(),
            generated_at: Utc::now(),
        })
    }
}

fn bucket_sales(orders: &[sales_order::Model], period: ForecastPeriod) -> Vec<SalesDataPoint> {
    let mut buckets: BTreeMap<String, (Decimal, i64)> = BTreeMap::new();
    for order in orders {
        let entry = buckets
            .entry(period.bucket_key(order.order_date))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += order.total_amount;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(key, (total, count))| SalesDataPoint {
            period: key,
            actual_sales: total,
            order_count: count,
            average_order_value: if count > 0 {
                total / Decimal::from(count)
            } else {
                Decimal::ZERO
            },
        })
        .collect()
}

/// Ordinary least squares over `(i, values[i])`; returns `(slope, intercept)`
/// or `None` when fewer than two points exist.
fn linear_regression(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n_f * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;
    Some((slope, intercept))
}

/// Projects the next three buckets by evaluating the fitted line at
/// indices n, n+1 and n+2.
fn project(historical: &[SalesDataPoint]) -> Vec<ForecastPoint> {
    let values: Vec<f64> = historical
        .iter()
        .map(|p| p.actual_sales.to_f64().unwrap_or(0.0))
        .collect();

    let Some((slope, intercept)) = linear_regression(&values) else {
        return Vec::new();
    };

    let n = values.len() as f64;
    (0..3)
        .map(|i| ForecastPoint {
            period: format!("Forecast {}", i + 1),
            predicted: slope * (n + i as f64) + intercept,
        })
        .collect()
}
