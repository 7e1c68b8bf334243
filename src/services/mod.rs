pub mod analytics;
pub mod forecasting;
pub mod orders;
pub mod quotes;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::{customer, product, sales_representative};
use crate::errors::ServiceError;

/// Currency applied to documents created through this module. Multi-currency
/// pricing is owned by the invoicing module.
pub const DEFAULT_CURRENCY: &str = "USD";

pub const DEFAULT_LIST_LIMIT: u64 = 50;

/// Tax computation seam. Order and quote creation derive the header tax from
/// this policy; rate sourcing (jurisdictions, exemptions) belongs to the
/// accounting module, so the default policy charges nothing rather than
/// guessing a rate.
pub trait TaxPolicy: Send + Sync {
    fn tax_amount(&self, subtotal: Decimal) -> Decimal;
}

/// Default policy: no tax at document creation time.
pub struct NoTax;

impl TaxPolicy for NoTax {
    fn tax_amount(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// One line of a create-order or create-quote request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Item quantity must be positive"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub notes: Option<String>,
}

impl LineItemInput {
    /// Revenue for this line after quantity and discount are applied.
    pub fn line_total(&self) -> Decimal {
        let mut line = Decimal::from(self.quantity) * self.unit_price;
        if self.discount_amount > Decimal::ZERO {
            line -= self.discount_amount;
        }
        line
    }
}

/// Header subtotal and discount derived from the line items:
/// subtotal = Σ(quantity × unit price − discount), discount = Σ discounts.
pub(crate) fn document_totals(items: &[LineItemInput]) -> (Decimal, Decimal) {
    let mut subtotal = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    for item in items {
        subtotal += item.line_total();
        discount += item.discount_amount;
    }
    (subtotal, discount)
}

/// Strict calendar-date parsing for request fields; the field label keeps the
/// surfaced message specific ("Invalid order date format").
pub(crate) fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServiceError::ValidationError(format!("Invalid {} format", field)))
}

/// Customer identity embedded into list/detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&customer::Model> for CustomerSummary {
    fn from(model: &customer::Model) -> Self {
        Self {
            id: model.id,
            company_name: model.company_name.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesRepSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<&sales_representative::Model> for SalesRepSummary {
    fn from(model: &sales_representative::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
}

impl From<&product::Model> for ProductSummary {
    fn from(model: &product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            sku: model.sku.clone(),
            description: model.description.clone(),
        }
    }
}
