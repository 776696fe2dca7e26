// Log event domain types
//
// `LogEvent` is the canonical stored form returned by both ingestion and query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::level::LogLevel;

/// Free-form structured metadata attached to an event.
/// Any JSON value is allowed under each key, nested arbitrarily.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Interpret a stored JSON value as attributes.
/// Anything other than an object (null, arrays, scalars) yields an empty map.
pub fn attributes_from_value(value: serde_json::Value) -> Attributes {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// A persisted log event, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LogEvent {
    /// Unique event ID, assigned by the store.
    pub id: Uuid,
    /// Name of the service that emitted the event.
    #[cfg_attr(feature = "openapi", schema(example = "auth"))]
    pub service: String,
    /// Severity level.
    pub level: LogLevel,
    /// Log message.
    #[cfg_attr(feature = "openapi", schema(example = "login failed"))]
    pub message: String,
    /// Distributed trace identifier, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Span identifier within the trace, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// When the event occurred (server receipt time, UTC).
    pub timestamp: DateTime<Utc>,
    /// Structured attributes. Always present, `{}` when none were given.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub attributes: Attributes,
}
