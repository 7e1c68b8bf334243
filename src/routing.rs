//! Route resolution for the sales module.
//!
//! The host runtime forwards every request under the module mount point as a
//! bare (method, path) pair; resolution happens here rather than in the host's
//! router so the module owns its own surface. Exact routes are looked up in a
//! hash table first; parameterised routes are scanned in registration order,
//! matching segment-by-segment with `{param}` segments acting as wildcards.

use std::collections::HashMap;

use crate::errors::ServiceError;

/// Every operation the module exposes. Dispatch is a `match` over this enum,
/// so an unhandled route is a compile error rather than a runtime lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ListOrders,
    CreateOrder,
    GetOrder,
    UpdateOrder,
    ListOrderItems,
    AddOrderItem,
    UpdateOrderItem,
    DeleteOrderItem,
    ListQuotes,
    CreateQuote,
    ConvertQuote,
    SalesReport,
    Pipeline,
    Forecast,
    TopCustomers,
    SalesPerformance,
    ProductAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug)]
struct Registration {
    method: String,
    segments: Vec<Segment>,
    route: Route,
}

/// Path parameters captured while matching a parameterised route.
#[derive(Debug, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parses a captured segment as an integer id; the caller supplies the
    /// error message so "Invalid order ID" vs "Invalid quote ID" match the
    /// resource being addressed.
    pub fn id(&self, name: &str, message: &str) -> Result<i64, ServiceError> {
        self.get(name)
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ServiceError::ValidationError(message.to_string()))
    }
}

/// A resolved route plus its captured path parameters.
#[derive(Debug)]
pub struct RouteMatch {
    pub route: Route,
    pub params: PathParams,
}

pub struct RouteTable {
    exact: HashMap<String, Route>,
    patterns: Vec<Registration>,
}

impl RouteTable {
    fn new() -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// The full sales module surface. Registration order matters for
    /// parameterised routes: the first matching pattern wins.
    pub fn sales() -> Self {
        let mut table = Self::new();
        table.register("GET", "/orders", Route::ListOrders);
        table.register("POST", "/orders", Route::CreateOrder);
        table.register("GET", "/orders/{id}", Route::GetOrder);
        table.register("PUT", "/orders/{id}", Route::UpdateOrder);
        table.register("GET", "/orders/{id}/items", Route::ListOrderItems);
        table.register("POST", "/orders/{id}/items", Route::AddOrderItem);
        table.register("PUT", "/orders/{id}/items/{item_id}", Route::UpdateOrderItem);
        table.register("DELETE", "/orders/{id}/items/{item_id}", Route::DeleteOrderItem);
        table.register("GET", "/quotes", Route::ListQuotes);
        table.register("POST", "/quotes", Route::CreateQuote);
        table.register("POST", "/quotes/{id}/convert", Route::ConvertQuote);
        table.register("GET", "/reports/sales", Route::SalesReport);
        table.register("GET", "/pipeline", Route::Pipeline);
        table.register("GET", "/forecast", Route::Forecast);
        table.register("GET", "/top-customers", Route::TopCustomers);
        table.register("GET", "/performance", Route::SalesPerformance);
        table.register("GET", "/product-analysis", Route::ProductAnalysis);
        table
    }

    fn register(&mut self, method: &str, path: &str, route: Route) {
        let method = method.to_ascii_uppercase();
        let path = normalize(path);

        let segments: Vec<Segment> = path
            .split('/')
            .map(|seg| {
                if seg.starts_with('{') && seg.ends_with('}') {
                    Segment::Param(seg[1..seg.len() - 1].to_string())
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();

        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            self.exact.insert(format!("{} {}", method, path), route);
        } else {
            self.patterns.push(Registration {
                method,
                segments,
                route,
            });
        }
    }

    /// Resolves a request to a handler. Exact matches are tried before any
    /// pattern scan; pattern matching requires an equal segment count and
    /// literal equality everywhere a `{param}` does not stand in.
    pub fn resolve(&self, method: &str, path: &str) -> Result<RouteMatch, ServiceError> {
        let method = method.to_ascii_uppercase();
        let path = normalize(path);

        if let Some(route) = self.exact.get(&format!("{} {}", method, path)) {
            return Ok(RouteMatch {
                route: *route,
                params: PathParams::default(),
            });
        }

        let request_segments: Vec<&str> = path.split('/').collect();

        for registration in &self.patterns {
            if registration.method != method
                || registration.segments.len() != request_segments.len()
            {
                continue;
            }

            let mut params = HashMap::new();
            let matched = registration
                .segments
                .iter()
                .zip(&request_segments)
                .all(|(pattern, actual)| match pattern {
                    Segment::Literal(lit) => lit == actual,
                    Segment::Param(name) => {
                        params.insert(name.clone(), (*actual).to_string());
                        true
                    }
                });

            if matched {
                return Ok(RouteMatch {
                    route: registration.route,
                    params: PathParams(params),
                });
            }
        }

        Err(ServiceError::NotFound(format!(
            "handler not found for route: {} {}",
            method, path
        )))
    }
}

fn normalize(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn exact_routes_resolve_without_a_pattern_scan() {
        let table = RouteTable::sales();
        let m = table.resolve("GET", "/orders").unwrap();
        assert_eq!(m.route, Route::ListOrders);
        assert!(m.params.get("id").is_none());
    }

    #[test]
    fn method_is_case_insensitive_and_leading_slash_optional() {
        let table = RouteTable::sales();
        assert_eq!(table.resolve("get", "orders").unwrap().route, Route::ListOrders);
        assert_eq!(
            table.resolve("post", "/quotes").unwrap().route,
            Route::CreateQuote
        );
    }

    #[test]
    fn parameterised_routes_capture_their_segments() {
        let table = RouteTable::sales();
        let m = table.resolve("GET", "/orders/42").unwrap();
        assert_eq!(m.route, Route::GetOrder);
        assert_eq!(m.params.get("id"), Some("42"));

        let m = table.resolve("POST", "/quotes/7/convert").unwrap();
        assert_eq!(m.route, Route::ConvertQuote);
        assert_eq!(m.params.get("id"), Some("7"));

        let m = table.resolve("DELETE", "/orders/42/items/3").unwrap();
        assert_eq!(m.route, Route::DeleteOrderItem);
        assert_eq!(m.params.get("item_id"), Some("3"));
    }

    #[test]
    fn segment_count_must_match_exactly() {
        let table = RouteTable::sales();
        assert_matches!(
            table.resolve("GET", "/orders/42/items/3/extra"),
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(table.resolve("GET", "/"), Err(ServiceError::NotFound(_)));
    }

    #[test]
    fn method_mismatch_does_not_resolve() {
        let table = RouteTable::sales();
        assert_matches!(
            table.resolve("DELETE", "/orders/42"),
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            table.resolve("PUT", "/pipeline"),
            Err(ServiceError::NotFound(_))
        );
    }

    #[test]
    fn first_registered_pattern_wins() {
        let mut table = RouteTable::new();
        table.register("GET", "/orders/{id}", Route::GetOrder);
        table.register("GET", "/orders/{other}", Route::ListOrders);
        let m = table.resolve("GET", "/orders/9").unwrap();
        assert_eq!(m.route, Route::GetOrder);
    }

    #[test]
    fn exact_match_shadows_patterns_registered_earlier() {
        let mut table = RouteTable::new();
        table.register("GET", "/reports/{name}", Route::GetOrder);
        table.register("GET", "/reports/sales", Route::SalesReport);
        let m = table.resolve("GET", "/reports/sales").unwrap();
        assert_eq!(m.route, Route::SalesReport);
    }

    #[test]
    fn id_parsing_rejects_non_numeric_segments() {
        let table = RouteTable::sales();
        let m = table.resolve("GET", "/orders/abc").unwrap();
        assert_matches!(
            m.params.id("id", "Invalid order ID"),
            Err(ServiceError::ValidationError(msg)) if msg == "Invalid order ID"
        );
    }
}
