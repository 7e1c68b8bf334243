use axum::{
    extract::{Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::services::parse_date;

/// Request bodies beyond this size are rejected outright.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Standard success response: the payload itself, no wrapper object.
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response.
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Decodes the request body as JSON.
pub async fn json_body<T: DeserializeOwned>(req: Request) -> Result<T, ServiceError> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| ServiceError::ValidationError("Invalid request body".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| ServiceError::ValidationError("Invalid request body".to_string()))
}

/// Decodes the query string into a typed parameter struct.
pub fn query_params<T: DeserializeOwned>(req: &Request) -> Result<T, ServiceError> {
    let Query(params) = Query::<T>::try_from_uri(req.uri())
        .map_err(|e| ServiceError::ValidationError(format!("Invalid query parameters: {}", e)))?;
    Ok(params)
}

/// Required start/end date pair shared by the report endpoints.
#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeParams {
    /// Both bounds are required; each must be a strict `YYYY-MM-DD` date.
    pub fn resolve(&self) -> Result<(NaiveDate, NaiveDate), ServiceError> {
        let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref())
        else {
            return Err(ServiceError::ValidationError(
                "Start date and end date are required".to_string(),
            ));
        };
        Ok((parse_date(start, "start date")?, parse_date(end, "end date")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn date_range_requires_both_bounds() {
        let params = DateRangeParams {
            start_date: Some("2025-01-01".to_string()),
            end_date: None,
        };
        assert_matches!(
            params.resolve(),
            Err(ServiceError::ValidationError(msg)) if msg == "Start date and end date are required"
        );
    }

    #[test]
    fn date_range_parses_strict_calendar_dates() {
        let params = DateRangeParams {
            start_date: Some("2025-01-01".to_string()),
            end_date: Some("2025-03-31".to_string()),
        };
        let (start, end) = params.resolve().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }
}
