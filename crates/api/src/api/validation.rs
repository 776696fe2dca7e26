// Input validation for log APIs
//
// All rules run before any storage call, so a rejected request never
// persists anything. Rules are checked in a fixed order and the first
// violation is reported.

use super::common::ErrorResponse;
use super::logs::{CreateLogRequest, LogsQuery};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use pulse_core::{Attributes, LogLevel};
use pulse_storage::{EventFilter, DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT};

/// Returned for any body that is not exactly one recognized JSON object.
pub const INVALID_JSON_BODY: &str = "invalid JSON body";
pub const SERVICE_REQUIRED: &str = "service is required";
pub const MESSAGE_REQUIRED: &str = "message is required";

/// Client-caused rejection carrying the message returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<ValidationError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: ValidationError) -> Self {
        ErrorResponse::new(err.0).into_response(StatusCode::BAD_REQUEST)
    }
}

/// A normalized event that passed every ingestion rule.
#[derive(Debug, Clone)]
pub struct ValidatedLog {
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub attributes: Option<Attributes>,
}

/// Decode a request body that must hold exactly one `CreateLogRequest`.
///
/// Unknown fields, wrong types and any non-whitespace content after the
/// object are rejected.
pub fn parse_create_log_body(body: &[u8]) -> Result<CreateLogRequest, ValidationError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected log body: {}", e);
        ValidationError::new(INVALID_JSON_BODY)
    })
}

/// Normalize and validate an ingestion request.
pub fn validate_create_log(req: CreateLogRequest) -> Result<ValidatedLog, ValidationError> {
    let service = req.service.unwrap_or_default().trim().to_string();
    let message = req.message.unwrap_or_default().trim().to_string();
    let level = req.level.unwrap_or_default();

    if service.is_empty() {
        return Err(ValidationError::new(SERVICE_REQUIRED));
    }
    if message.is_empty() {
        return Err(ValidationError::new(MESSAGE_REQUIRED));
    }
    let level = LogLevel::parse_normalized(&level).map_err(|e| ValidationError(e.to_string()))?;

    Ok(ValidatedLog {
        service,
        level,
        message,
        trace_id: blank_to_none(req.trace_id),
        span_id: blank_to_none(req.span_id),
        attributes: req.attributes,
    })
}

/// Translate query parameters into a store filter.
///
/// `since`, `until` and `level` are rejected when malformed; `limit` is
/// clamped instead.
pub fn validate_logs_query(query: &LogsQuery) -> Result<EventFilter, ValidationError> {
    let since = parse_timestamp("since", query.since.as_deref())?;
    let until = parse_timestamp("until", query.until.as_deref())?;

    let level = match query.level.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            Some(LogLevel::parse_normalized(raw).map_err(|e| ValidationError(e.to_string()))?)
        }
    };

    let service = query
        .service
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(EventFilter {
        service,
        level,
        since,
        until,
        limit: clamp_limit(query.limit.as_deref()),
    })
}

/// Default when absent or not an integer, otherwise clamped to 1..=MAX.
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => match value.parse::<i64>() {
            Ok(n) => n.clamp(1, MAX_QUERY_LIMIT),
            Err(_) => DEFAULT_QUERY_LIMIT,
        },
        None => DEFAULT_QUERY_LIMIT,
    }
}

/// Parse an optional RFC 3339 timestamp into UTC. Blank means absent.
fn parse_timestamp(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| ValidationError::new(format!("{} must be RFC3339", field))),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL_ERROR: &str = "level must be one of: debug, info, warn, error";

    fn request(service: &str, level: &str, message: &str) -> CreateLogRequest {
        CreateLogRequest {
            service: Some(service.to_string()),
            level: Some(level.to_string()),
            message: Some(message.to_string()),
            trace_id: None,
            span_id: None,
            attributes: None,
        }
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let mut req = request("  auth ", " ERROR ", "  login failed\n");
        req.trace_id = Some(" t1 ".to_string());
        req.span_id = Some("   ".to_string());

        let log = validate_create_log(req).unwrap();
        assert_eq!(log.service, "auth");
        assert_eq!(log.level, LogLevel::Error);
        assert_eq!(log.message, "login failed");
        assert_eq!(log.trace_id.as_deref(), Some("t1"));
        assert_eq!(log.span_id, None);
    }

    #[test]
    fn test_rules_apply_in_order() {
        // Everything wrong: service is reported first
        let err = validate_create_log(request("", "critical", "")).unwrap_err();
        assert_eq!(err.message(), SERVICE_REQUIRED);

        let err = validate_create_log(request("a", "critical", " ")).unwrap_err();
        assert_eq!(err.message(), MESSAGE_REQUIRED);

        let err = validate_create_log(request("a", "critical", "x")).unwrap_err();
        assert_eq!(err.message(), LEVEL_ERROR);
    }

    #[test]
    fn test_missing_fields_count_as_empty() {
        let req = parse_create_log_body(br#"{"level":"info","message":"x"}"#).unwrap();
        let err = validate_create_log(req).unwrap_err();
        assert_eq!(err.message(), SERVICE_REQUIRED);

        let req = parse_create_log_body(br#"{"service":null,"level":"info","message":"x"}"#)
            .unwrap();
        assert!(validate_create_log(req).is_err());
    }

    #[test]
    fn test_body_rejects_unknown_fields() {
        let err = parse_create_log_body(
            br#"{"service":"a","level":"info","message":"x","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap_err();
        assert_eq!(err.message(), INVALID_JSON_BODY);
    }

    #[test]
    fn test_body_field_names_are_case_sensitive() {
        let err = parse_create_log_body(br#"{"Service":"a","level":"info","message":"x"}"#)
            .unwrap_err();
        assert_eq!(err.message(), INVALID_JSON_BODY);
    }

    #[test]
    fn test_body_rejects_trailing_content() {
        let body = br#"{"service":"a","level":"info","message":"x"} {"service":"b"}"#;
        assert!(parse_create_log_body(body).is_err());
        let body = br#"{"service":"a","level":"info","message":"x"}garbage"#;
        assert!(parse_create_log_body(body).is_err());
    }

    #[test]
    fn test_body_allows_trailing_whitespace() {
        let body = b"{\"service\":\"a\",\"level\":\"info\",\"message\":\"x\"}\n  ";
        assert!(parse_create_log_body(body).is_ok());
    }

    #[test]
    fn test_body_rejects_non_object_attributes() {
        let body = br#"{"service":"a","level":"info","message":"x","attributes":[1,2]}"#;
        assert!(parse_create_log_body(body).is_err());
    }

    #[test]
    fn test_body_rejects_empty_and_non_object() {
        assert!(parse_create_log_body(b"").is_err());
        assert!(parse_create_log_body(b"[]").is_err());
        assert!(parse_create_log_body(br#"{"service":1}"#).is_err());
    }

    #[test]
    fn test_null_attributes_are_absent() {
        let req = parse_create_log_body(
            br#"{"service":"a","level":"info","message":"x","attributes":null}"#,
        )
        .unwrap();
        assert!(req.attributes.is_none());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some("")), 50);
        assert_eq!(clamp_limit(Some("abc")), 50);
        assert_eq!(clamp_limit(Some("0")), 1);
        assert_eq!(clamp_limit(Some("-5")), 1);
        assert_eq!(clamp_limit(Some("10000")), 200);
        assert_eq!(clamp_limit(Some(" 25 ")), 25);
        assert_eq!(clamp_limit(Some("99999999999999999999")), 50);
    }

    #[test]
    fn test_query_defaults() {
        let filter = validate_logs_query(&LogsQuery::default()).unwrap();
        assert!(filter.service.is_none());
        assert!(filter.level.is_none());
        assert!(filter.since.is_none());
        assert!(filter.until.is_none());
        assert_eq!(filter.limit, 50);
    }

    #[test]
    fn test_query_normalizes_values() {
        let query = LogsQuery {
            service: Some(" auth ".to_string()),
            level: Some(" WARN".to_string()),
            since: Some("2024-05-01T12:00:00+02:00".to_string()),
            until: None,
            limit: Some("10".to_string()),
        };
        let filter = validate_logs_query(&query).unwrap();
        assert_eq!(filter.service.as_deref(), Some("auth"));
        assert_eq!(filter.level, Some(LogLevel::Warn));
        assert_eq!(
            filter.since.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
        assert_eq!(filter.limit, 10);
    }

    #[test]
    fn test_query_rejects_malformed_timestamps() {
        let query = LogsQuery {
            since: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_logs_query(&query).unwrap_err().message(),
            "since must be RFC3339"
        );

        let query = LogsQuery {
            until: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_logs_query(&query).unwrap_err().message(),
            "until must be RFC3339"
        );
    }

    #[test]
    fn test_query_rejects_unknown_level() {
        let query = LogsQuery {
            level: Some("fatal".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_logs_query(&query).unwrap_err().message(), LEVEL_ERROR);

        let query = LogsQuery {
            level: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_logs_query(&query).unwrap().level.is_none());
    }
}
