//! In-memory implementation of ServiceRegistry and EventStore
//!
//! Used for dev mode and tests. Provides the same semantics as the PostgreSQL
//! implementation: one service row per name, microsecond timestamps,
//! inclusive time bounds and newest-first ordering.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::RwLock;
use pulse_core::{Attributes, LogLevel};
use uuid::Uuid;

use crate::models::{non_blank, EventFilter, EventRow, InsertedEvent, NewEvent, ServiceRow};
use crate::store::{EventStore, ServiceRegistry, StoreError};

/// Internal event state, keyed to its service by id like the events table
struct StoredEvent {
    id: Uuid,
    service_id: Uuid,
    level: LogLevel,
    message: String,
    trace_id: Option<String>,
    span_id: Option<String>,
    occurred_at: DateTime<Utc>,
    attributes: Attributes,
}

/// In-memory log store
///
/// # Example
///
/// ```
/// use pulse_storage::InMemoryLogStore;
///
/// let store = InMemoryLogStore::new();
/// assert_eq!(store.event_count(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryLogStore {
    services: RwLock<HashMap<String, ServiceRow>>,
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of services
    pub fn service_count(&self) -> usize {
        self.services.read().len()
    }

    /// Get the number of events
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    // TIMESTAMPTZ keeps microseconds
    fn store_time(t: DateTime<Utc>) -> DateTime<Utc> {
        t.trunc_subsecs(6)
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryLogStore {
    async fn resolve_or_create(&self, name: &str) -> Result<Uuid, StoreError> {
        // Check and insert under one write lock so racing callers agree.
        let mut services = self.services.write();
        let row = services
            .entry(name.to_string())
            .or_insert_with(|| ServiceRow {
                id: Uuid::now_v7(),
                name: name.to_string(),
                created_at: Self::store_time(Utc::now()),
            });
        Ok(row.id)
    }
}

#[async_trait]
impl EventStore for InMemoryLogStore {
    async fn insert(&self, event: NewEvent, service_id: Uuid) -> Result<InsertedEvent, StoreError> {
        let known = self.services.read().values().any(|s| s.id == service_id);
        if !known {
            return Err(StoreError::Constraint(format!(
                "service {} does not exist",
                service_id
            )));
        }

        // Round-trip through the JSON encoding, as JSONB would.
        let encoded = serde_json::to_vec(&event.attributes.unwrap_or_default())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let attributes: Attributes = serde_json::from_slice(&encoded)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let stored = StoredEvent {
            id: Uuid::now_v7(),
            service_id,
            level: event.level,
            message: event.message,
            trace_id: non_blank(event.trace_id),
            span_id: non_blank(event.span_id),
            occurred_at: Self::store_time(event.occurred_at),
            attributes,
        };

        let inserted = InsertedEvent {
            id: stored.id,
            occurred_at: stored.occurred_at,
            attributes: stored.attributes.clone(),
        };
        self.events.write().push(stored);
        Ok(inserted)
    }

    async fn query(&self, filter: &EventFilter) -> Result<Vec<EventRow>, StoreError> {
        let names: HashMap<Uuid, String> = self
            .services
            .read()
            .values()
            .map(|s| (s.id, s.name.clone()))
            .collect();

        let mut rows: Vec<EventRow> = self
            .events
            .read()
            .iter()
            .filter_map(|e| {
                let service = names.get(&e.service_id)?.clone();
                Some(EventRow {
                    id: e.id,
                    service,
                    level: e.level,
                    message: e.message.clone(),
                    trace_id: e.trace_id.clone(),
                    span_id: e.span_id.clone(),
                    occurred_at: e.occurred_at,
                    attributes: e.attributes.clone(),
                })
            })
            .filter(|row| filter.matches(row))
            .collect();

        rows.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(filter.limit.max(0) as usize);
        Ok(rows)
    }
}
