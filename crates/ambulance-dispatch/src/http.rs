//! Response envelope, tenant extraction and list helpers shared by the workflow routers.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::config::DispatchConfig;
use crate::workflows::dispatch::domain::HospitalId;

/// Header carrying the tenant resolved by the upstream auth gateway.
pub const HOSPITAL_HEADER: &str = "x-hospital-id";

/// `{ success, data | message, pagination? }` body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn paged(page: Page<T>) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(page.items),
            pagination: Some(page.pagination),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }
}

/// Error body: `{ success: false, message, error }`.
pub fn error_response(status: StatusCode, message: &str, error: &str) -> Response {
    let payload = json!({
        "success": false,
        "message": message,
        "error": error,
    });
    (status, Json(payload)).into_response()
}

/// Tenant scope for a request, read from [`HOSPITAL_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalContext(pub HospitalId);

#[async_trait]
impl<S> FromRequestParts<S> for HospitalContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(HOSPITAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match value {
            Some(hospital) => Ok(Self(HospitalId(hospital.to_string()))),
            None => Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Hospital context required",
                "missing x-hospital-id header",
            )),
        }
    }
}

/// JSON body whose rejections keep the error envelope instead of axum's plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_request(&rejection.body_text())),
        }
    }
}

/// Query string counterpart of [`ApiJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_request(&rejection.body_text())),
        }
    }
}

fn invalid_request(error: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, "Invalid request", error)
}

/// Raw `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Slices an already ordered list into the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest, config: &DispatchConfig) -> Page<T> {
    let page = request.page.unwrap_or(1).max(1);
    let limit = request
        .limit
        .unwrap_or(config.page_limit)
        .clamp(1, config.max_page_limit.max(1));

    let total = items.len();
    let pages = total.div_ceil(limit as usize);
    let skip = (page as usize - 1).saturating_mul(limit as usize);

    let items = items
        .into_iter()
        .skip(skip)
        .take(limit as usize)
        .collect();

    Page {
        items,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    }
}

/// Inclusive `startDate`/`endDate` window applied to creation timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| at >= start)
            && self.end_date.map_or(true, |end| at <= end)
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD"))
}

pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_datetime(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Interprets an optional query filter where absent, blank and `all` mean "no filter".
pub fn parse_filter<T: DeserializeOwned>(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<T>, String> {
    let Some(value) = raw.map(str::trim) else {
        return Ok(None);
    };
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map(Some)
        .map_err(|_| format!("Invalid {field} filter '{value}'"))
}

/// Rounds to one decimal place, as used for minute and percentage figures.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn paginate_reports_total_and_pages() {
        let config = DispatchConfig::default();
        let page = paginate(
            (1..=45).collect::<Vec<_>>(),
            PageRequest {
                page: Some(3),
                limit: Some(20),
            },
            &config,
        );
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(
            page.pagination,
            Pagination {
                page: 3,
                limit: 20,
                total: 45,
                pages: 3
            }
        );
    }

    #[test]
    fn paginate_clamps_limit_and_page() {
        let config = DispatchConfig::default();
        let page = paginate(
            vec![1, 2, 3],
            PageRequest {
                page: Some(0),
                limit: Some(10_000),
            },
            &config,
        );
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, config.max_page_limit);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn parse_datetime_accepts_dates_and_timestamps() {
        let date = parse_datetime("2025-03-01").expect("date parses");
        assert_eq!(date.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        let stamp = parse_datetime("2025-03-01T10:30:00+02:00").expect("timestamp parses");
        assert_eq!(stamp.to_rfc3339(), "2025-03-01T08:30:00+00:00");
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn parse_filter_treats_all_as_absent() {
        #[derive(Debug, PartialEq, Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Level {
            Low,
            High,
        }

        assert_eq!(parse_filter::<Level>("level", Some("all")), Ok(None));
        assert_eq!(parse_filter::<Level>("level", None), Ok(None));
        assert_eq!(parse_filter::<Level>("level", Some("high")), Ok(Some(Level::High)));
        assert!(parse_filter::<Level>("level", Some("extreme")).is_err());
    }

    #[tokio::test]
    async fn hospital_context_requires_header() {
        let (mut parts, _) = Request::builder()
            .uri("/")
            .body(())
            .expect("request builds")
            .into_parts();
        let rejection = HospitalContext::from_request_parts(&mut parts, &())
            .await
            .expect_err("missing header rejected");
        assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);

        let (mut parts, _) = Request::builder()
            .uri("/")
            .header(HOSPITAL_HEADER, "hosp-1")
            .body(())
            .expect("request builds")
            .into_parts();
        let HospitalContext(hospital) = HospitalContext::from_request_parts(&mut parts, &())
            .await
            .expect("header accepted");
        assert_eq!(hospital, HospitalId("hosp-1".to_string()));
    }
}
