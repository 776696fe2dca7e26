// Log ingestion and query HTTP routes

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pulse_core::{Attributes, LogEvent};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::common::ErrorResponse;
use super::validation::{
    parse_create_log_body, validate_create_log, validate_logs_query,
};
use crate::services::LogService;

/// Request to ingest a log event.
/// The server stamps the event time on receipt; clients cannot supply it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLogRequest {
    /// Name of the emitting service. Trimmed; must not be empty.
    #[schema(example = "auth")]
    pub service: Option<String>,
    /// One of `debug`, `info`, `warn`, `error` (case-insensitive).
    #[schema(example = "error")]
    pub level: Option<String>,
    /// Log message. Trimmed; must not be empty.
    #[schema(example = "login failed")]
    pub message: Option<String>,
    /// Distributed trace identifier. Blank is treated as absent.
    #[schema(example = "t1")]
    pub trace_id: Option<String>,
    /// Span identifier. Blank is treated as absent.
    pub span_id: Option<String>,
    /// Arbitrary structured metadata.
    #[schema(value_type = Option<Object>, example = json!({"user_id": 42}))]
    pub attributes: Option<Attributes>,
}

/// Query parameters for log listing.
/// Every parameter is optional; an absent parameter imposes no constraint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// Exact service name.
    pub service: Option<String>,
    /// Severity level (case-insensitive).
    pub level: Option<String>,
    /// Inclusive lower bound on event time (RFC 3339).
    #[param(example = "2024-05-01T00:00:00Z")]
    pub since: Option<String>,
    /// Inclusive upper bound on event time (RFC 3339).
    pub until: Option<String>,
    /// Maximum number of events. Defaults to 50, clamped to 1..=200.
    #[param(example = 50)]
    pub limit: Option<String>,
}

impl LogsQuery {
    /// Collect recognized parameters from raw query pairs.
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "service" => &mut query.service,
                "level" => &mut query.level,
                "since" => &mut query.since,
                "until" => &mut query.until,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// App state for log routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LogService>,
}

impl AppState {
    pub fn new(service: Arc<LogService>) -> Self {
        Self { service }
    }
}

/// Create log routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/logs",
            get(list_logs)
                .post(create_log)
                .fallback(logs_method_not_allowed),
        )
        .with_state(state)
}

/// POST /logs - Ingest a log event
#[utoipa::path(
    post,
    path = "/logs",
    request_body = CreateLogRequest,
    responses(
        (status = 201, description = "Event stored", body = LogEvent),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<LogEvent>), (StatusCode, Json<ErrorResponse>)> {
    let req = parse_create_log_body(&body)?;
    let log = validate_create_log(req).map_err(|e| {
        tracing::debug!("Rejected log event: {}", e);
        e
    })?;

    let event = state.service.ingest(log).await.map_err(|e| {
        tracing::error!("Failed to persist log event: {}", e);
        ErrorResponse::new("failed to persist log event")
            .into_response(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /logs - List log events, newest first
#[utoipa::path(
    get,
    path = "/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Matching events, newest first", body = Vec<LogEvent>),
        (status = 400, description = "Malformed filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<LogEvent>>, (StatusCode, Json<ErrorResponse>)> {
    let query = LogsQuery::from_pairs(pairs);
    let filter = validate_logs_query(&query)?;

    let events = state.service.query(filter).await.map_err(|e| {
        tracing::error!("Failed to query logs: {}", e);
        ErrorResponse::new("failed to query logs").into_response(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    Ok(Json(events))
}

async fn logs_method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, POST")])
}
