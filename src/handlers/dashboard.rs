use crate::errors::{ApiError, ServiceError};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.dashboard.summary().await?))
}

/// `GET /dashboard?from=YYYY-MM-DD&to=YYYY-MM-DD` — inclusive range.
pub async fn range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let from = parse_bound("from", query.from.as_deref())?;
    let to = parse_bound("to", query.to.as_deref())?;
    Ok(Json(state.services.dashboard.range(from, to).await?))
}

pub async fn all_time(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.dashboard.all_time().await?))
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<NaiveDate, ApiError> {
    let raw = value.ok_or_else(|| {
        ApiError::ServiceError(ServiceError::BadRequest(format!(
            "Query parameter '{}' is required",
            name
        )))
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::ServiceError(ServiceError::BadRequest(format!(
            "Query parameter '{}' must be a YYYY-MM-DD date",
            name
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bound_accepts_iso_dates() {
        let date = parse_bound("from", Some("2024-03-15")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn parse_bound_rejects_missing_and_malformed() {
        assert!(parse_bound("from", None).is_err());
        assert!(parse_bound("to", Some("15/03/2024")).is_err());
        assert!(parse_bound("to", Some("2024-13-40")).is_err());
    }
}
