use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Known sales order lifecycle states. The status column itself is a plain
/// string so rows written by other modules never fail to decode; this enum
/// covers the values this module reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

/// Quote lifecycle: only draft quotes may be converted to orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Accepted,
    Rejected,
}

/// Display priority of a status within the sales pipeline report. Unknown
/// statuses sort last.
pub fn pipeline_rank(status: &str) -> u8 {
    match status {
        "pending" => 1,
        "confirmed" => 2,
        "shipped" => 3,
        "delivered" => 4,
        "cancelled" => 5,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_status_round_trips_as_snake_case() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(OrderStatus::from_str("delivered").unwrap(), OrderStatus::Delivered);
        assert!(OrderStatus::from_str("mislaid").is_err());
    }

    #[test]
    fn quote_status_round_trips_as_snake_case() {
        assert_eq!(QuoteStatus::Draft.to_string(), "draft");
        assert_eq!(QuoteStatus::from_str("accepted").unwrap(), QuoteStatus::Accepted);
    }

    #[test]
    fn pipeline_rank_orders_known_statuses_before_unknown() {
        assert!(pipeline_rank("pending") < pipeline_rank("confirmed"));
        assert!(pipeline_rank("cancelled") < pipeline_rank("on_hold"));
        assert_eq!(pipeline_rank("on_hold"), pipeline_rank("returned"));
    }
}
