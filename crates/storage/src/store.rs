//! ServiceRegistry and EventStore trait definitions

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{EventFilter, EventRow, InsertedEvent, NewEvent};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A store constraint rejected the write (unique, foreign key, check)
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Database error (connectivity, statement failure)
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Maps service names to stable identifiers.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Return the id for `name`, creating the service on first use.
    ///
    /// `name` must already be trimmed and non-empty. Concurrent calls with the
    /// same name all observe the same id; exactly one row is ever created.
    async fn resolve_or_create(&self, name: &str) -> Result<Uuid, StoreError>;
}

/// Persists events and serves filtered, newest-first scans.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist one event for `service_id`.
    ///
    /// Returns what the store accepted: the assigned id, the stored
    /// `occurred_at` and the attributes after a round trip through the
    /// store's JSON encoding.
    async fn insert(&self, event: NewEvent, service_id: Uuid) -> Result<InsertedEvent, StoreError>;

    /// Scan events matching `filter`, ordered by `occurred_at` descending.
    async fn query(&self, filter: &EventFilter) -> Result<Vec<EventRow>, StoreError>;
}
