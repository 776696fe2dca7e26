// Pulse core types
//
// DB-agnostic domain types shared by the storage layer and the HTTP API:
// - LogLevel: the fixed severity set
// - LogEvent: canonical stored form of an event
// - Attributes: free-form JSON object attached to events

pub mod level;
pub mod log_event;

pub use level::{LogLevel, LogLevelParseError, ALLOWED_LEVELS};
pub use log_event::{attributes_from_value, Attributes, LogEvent};
