// Database models (rows and inputs)

use chrono::{DateTime, Utc};
use pulse_core::{Attributes, LogEvent, LogLevel};
use uuid::Uuid;

/// Default number of rows returned by a scan.
pub const DEFAULT_QUERY_LIMIT: i64 = 50;
/// Upper bound on rows returned by a scan.
pub const MAX_QUERY_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct ServiceRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A validated event ready for insertion.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub level: LogLevel,
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// `None` is stored as `{}`.
    pub attributes: Option<Attributes>,
}

/// Store-assigned values returned from an insert.
#[derive(Debug, Clone)]
pub struct InsertedEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub attributes: Attributes,
}

/// Event joined with its service name, as read back by a scan.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: Uuid,
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub attributes: Attributes,
}

impl From<EventRow> for LogEvent {
    fn from(row: EventRow) -> Self {
        LogEvent {
            id: row.id,
            service: row.service,
            level: row.level,
            message: row.message,
            trace_id: row.trace_id,
            span_id: row.span_id,
            timestamp: row.occurred_at,
            attributes: row.attributes,
        }
    }
}

/// Filters for an event scan. `None` fields impose no constraint.
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Exact service name.
    pub service: Option<String>,
    pub level: Option<LogLevel>,
    /// Inclusive lower bound on `occurred_at`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at`.
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            service: None,
            level: None,
            since: None,
            until: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl EventFilter {
    /// True when `row` satisfies every present filter (limit excluded).
    pub fn matches(&self, row: &EventRow) -> bool {
        self.service.as_deref().map_or(true, |s| row.service == s)
            && self.level.map_or(true, |l| row.level == l)
            && self.since.map_or(true, |t| row.occurred_at >= t)
            && self.until.map_or(true, |t| row.occurred_at <= t)
    }
}

/// Blank strings become `None`; everything else is trimmed.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
