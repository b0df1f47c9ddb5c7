//! API request handlers
//!
//! Normalization runs on the blocking pool; failures answer 422 with the
//! error message in the envelope.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::core::indicators::{adverse_events, all_indicators, monthly_indicators, top_activities};
use crate::core::MonthlyIndicators;
use crate::error::{StatError, StatResult};
use crate::report;
use crate::types::{Month, NormalizedRecord, NormalizedTable};

use super::server::AppState;

const TOP_ACTIVITIES: usize = 10;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

fn failure(message: String) -> Response {
    warn!("Request failed: {}", message);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::<()>::err(message)),
    )
        .into_response()
}

/// Run a synchronous pipeline step on the blocking pool
async fn run_blocking<T, F>(job: F) -> Result<T, String>
where
    F: FnOnce() -> StatResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("Worker failed: {}", e)),
    }
}

fn parse_month(raw: &str) -> Result<Month, String> {
    raw.parse::<Month>()
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(method: &str, path: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "oncostat API Server".to_string(),
        version: state.version.clone(),
        description: "Chemotherapy unit statistics normalizer".to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/health", "Health check endpoint"),
            EndpointInfo::new("GET", "/version", "Get server version"),
            EndpointInfo::new("POST", "/api/v1/normalize", "Normalize a statistics sheet"),
            EndpointInfo::new("POST", "/api/v1/indicators", "Monthly management indicators"),
            EndpointInfo::new("POST", "/api/v1/report", "Narrative report for one month"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "normalize".to_string(),
            "indicators".to_string(),
            "report".to_string(),
        ],
    }))
}

/// Normalize request
#[derive(Deserialize)]
pub struct NormalizeRequest {
    pub file_path: String,
}

/// Normalize response
#[derive(Serialize)]
pub struct NormalizeResponse {
    pub file_path: String,
    pub records: usize,
    pub months: Vec<Month>,
    pub table: NormalizedTable,
}

/// POST /api/v1/normalize - Normalize a sheet into the flat table
pub async fn normalize(Json(req): Json<NormalizeRequest>) -> Response {
    let path = PathBuf::from(&req.file_path);

    match run_blocking(move || crate::normalize_file(path)).await {
        Ok(table) => Json(ApiResponse::ok(NormalizeResponse {
            file_path: req.file_path,
            records: table.len(),
            months: table.months(),
            table,
        }))
        .into_response(),
        Err(message) => failure(message),
    }
}

/// Indicators request
#[derive(Deserialize)]
pub struct IndicatorsRequest {
    pub file_path: String,
    #[serde(default)]
    pub month: Option<String>,
}

/// Indicators response; the listings are only filled for a single month
#[derive(Serialize)]
pub struct IndicatorsResponse {
    pub file_path: String,
    pub indicators: Vec<MonthlyIndicators>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_activities: Vec<NormalizedRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adverse_events: Vec<NormalizedRecord>,
}

/// POST /api/v1/indicators - Monthly indicators
pub async fn indicators(Json(req): Json<IndicatorsRequest>) -> Response {
    let month = match req.month.as_deref().map(parse_month).transpose() {
        Ok(month) => month,
        Err(message) => return failure(message),
    };
    let path = PathBuf::from(&req.file_path);

    let result = run_blocking(move || {
        let table = crate::normalize_file(path)?;
        match month {
            Some(month) => {
                let ind = monthly_indicators(&table, month).ok_or_else(|| {
                    StatError::Validation(format!("No records for month {}", month))
                })?;
                Ok((
                    vec![ind],
                    top_activities(&table, month, TOP_ACTIVITIES)
                        .into_iter()
                        .cloned()
                        .collect(),
                    adverse_events(&table, month).into_iter().cloned().collect(),
                ))
            }
            None => Ok((all_indicators(&table), Vec::new(), Vec::new())),
        }
    })
    .await;

    match result {
        Ok((indicators, top_activities, adverse_events)) => {
            Json(ApiResponse::ok(IndicatorsResponse {
                file_path: req.file_path,
                indicators,
                top_activities,
                adverse_events,
            }))
            .into_response()
        }
        Err(message) => failure(message),
    }
}

/// Report request
#[derive(Deserialize)]
pub struct ReportRequest {
    pub file_path: String,
    pub month: String,
}

/// Report response
#[derive(Serialize)]
pub struct ReportResponse {
    pub file_path: String,
    pub month: Month,
    pub text: String,
}

/// POST /api/v1/report - Narrative report for one month
pub async fn report(Json(req): Json<ReportRequest>) -> Response {
    let month = match parse_month(&req.month) {
        Ok(month) => month,
        Err(message) => return failure(message),
    };
    let path = PathBuf::from(&req.file_path);

    let result = run_blocking(move || {
        let table = crate::normalize_file(path)?;
        report::render(&table, month)
    })
    .await;

    match result {
        Ok(text) => Json(ApiResponse::ok(ReportResponse {
            file_path: req.file_path,
            month,
            text,
        }))
        .into_response(),
        Err(message) => failure(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ApiResponse Tests ====================

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());

        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // UUID format (8-4-4-4-12)
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_err_creates_error_response() {
        let response: ApiResponse<NormalizedTable> = ApiResponse::err("Something went wrong");

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_api_response_request_id_is_unique() {
        let response1: ApiResponse<String> = ApiResponse::ok("test1".to_string());
        let response2: ApiResponse<String> = ApiResponse::ok("test2".to_string());

        assert_ne!(response1.request_id, response2.request_id);
    }

    #[test]
    fn test_api_response_serializes_without_none_fields() {
        let response: ApiResponse<String> = ApiResponse::ok("data".to_string());
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":\"data\""));
    }

    // ==================== Request Deserialization Tests ====================

    #[test]
    fn test_indicators_request_month_optional() {
        let req: IndicatorsRequest =
            serde_json::from_str(r#"{"file_path": "quimio.xlsx"}"#).unwrap();
        assert_eq!(req.file_path, "quimio.xlsx");
        assert!(req.month.is_none());
    }

    #[test]
    fn test_report_request_deserialize() {
        let req: ReportRequest =
            serde_json::from_str(r#"{"file_path": "quimio.xlsx", "month": "fev"}"#).unwrap();
        assert_eq!(parse_month(&req.month).unwrap(), Month::Fev);
    }

    #[test]
    fn test_parse_month_rejects_unknown() {
        assert!(parse_month("FEB").is_err());
    }

    // ==================== Response Serialization Tests ====================

    #[test]
    fn test_report_response_serialize() {
        let response = ReportResponse {
            file_path: "quimio.xlsx".to_string(),
            month: Month::Mar,
            text: "PARECER".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"month\":\"MAR.\""));
    }

    #[test]
    fn test_indicators_response_skips_empty_listings() {
        let response = IndicatorsResponse {
            file_path: "quimio.xlsx".to_string(),
            indicators: Vec::new(),
            top_activities: Vec::new(),
            adverse_events: Vec::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("top_activities"));
        assert!(!json.contains("adverse_events"));
    }

    #[tokio::test]
    async fn test_run_blocking_maps_errors() {
        let result: Result<(), String> =
            run_blocking(|| Err(StatError::Validation("bad sheet".to_string()))).await;
        assert_eq!(result.unwrap_err(), "Validation error: bad sheet");
    }
}
