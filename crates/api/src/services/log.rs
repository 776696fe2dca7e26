// Log service: coordinates the service registry and event store

use chrono::Utc;
use pulse_core::LogEvent;
use pulse_storage::{EventFilter, EventStore, NewEvent, ServiceRegistry, StoreError};
use std::sync::Arc;
use tracing::Instrument;

use crate::api::validation::ValidatedLog;

pub struct LogService {
    registry: Arc<dyn ServiceRegistry>,
    events: Arc<dyn EventStore>,
}

impl LogService {
    pub fn new(registry: Arc<dyn ServiceRegistry>, events: Arc<dyn EventStore>) -> Self {
        Self { registry, events }
    }

    /// Use one backend for both the registry and the event store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ServiceRegistry + EventStore + 'static,
    {
        Self {
            registry: store.clone(),
            events: store,
        }
    }

    /// Stamp, resolve the service, and persist one event.
    ///
    /// A failed insert leaves the service row in place; resolving it again
    /// on retry returns the same id.
    pub async fn ingest(&self, log: ValidatedLog) -> Result<LogEvent, StoreError> {
        let span = tracing::info_span!(
            "log.ingest",
            service = %log.service,
            level = %log.level,
            event.id = tracing::field::Empty,
        );

        self.ingest_inner(log).instrument(span).await
    }

    async fn ingest_inner(&self, log: ValidatedLog) -> Result<LogEvent, StoreError> {
        let occurred_at = Utc::now();

        let service_id = self.registry.resolve_or_create(&log.service).await?;

        let input = NewEvent {
            level: log.level,
            message: log.message.clone(),
            trace_id: log.trace_id.clone(),
            span_id: log.span_id.clone(),
            occurred_at,
            attributes: log.attributes,
        };
        let inserted = self.events.insert(input, service_id).await?;

        tracing::Span::current().record("event.id", inserted.id.to_string().as_str());

        Ok(LogEvent {
            id: inserted.id,
            service: log.service,
            level: log.level,
            message: log.message,
            trace_id: log.trace_id,
            span_id: log.span_id,
            timestamp: inserted.occurred_at,
            attributes: inserted.attributes,
        })
    }

    pub async fn query(&self, filter: EventFilter) -> Result<Vec<LogEvent>, StoreError> {
        let rows = self.events.query(&filter).await?;
        Ok(rows.into_iter().map(LogEvent::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::LogLevel;
    use pulse_storage::InMemoryLogStore;
    use serde_json::json;

    fn validated(service: &str, level: LogLevel) -> ValidatedLog {
        ValidatedLog {
            service: service.to_string(),
            level,
            message: "login failed".to_string(),
            trace_id: Some("t1".to_string()),
            span_id: None,
            attributes: None,
        }
    }

    #[tokio::test]
    async fn test_ingest_returns_canonical_event() {
        let store = Arc::new(InMemoryLogStore::new());
        let service = LogService::from_store(store.clone());

        let before = Utc::now();
        let event = service
            .ingest(validated("auth", LogLevel::Error))
            .await
            .unwrap();

        assert_eq!(event.service, "auth");
        assert_eq!(event.level, LogLevel::Error);
        assert_eq!(event.trace_id.as_deref(), Some("t1"));
        assert!(event.attributes.is_empty());
        assert!(event.timestamp <= Utc::now());
        assert!(event.timestamp >= before - chrono::Duration::milliseconds(1));
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn test_ingest_reuses_service() {
        let store = Arc::new(InMemoryLogStore::new());
        let service = LogService::from_store(store.clone());

        service.ingest(validated("auth", LogLevel::Info)).await.unwrap();
        service.ingest(validated("auth", LogLevel::Warn)).await.unwrap();

        assert_eq!(store.service_count(), 1);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_query_maps_rows_to_events() {
        let store = Arc::new(InMemoryLogStore::new());
        let service = LogService::from_store(store);

        let mut log = validated("billing", LogLevel::Debug);
        log.attributes = json!({"invoice": 12}).as_object().cloned();
        let created = service.ingest(log).await.unwrap();

        let events = service.query(EventFilter::default()).await.unwrap();
        assert_eq!(events, vec![created]);
    }
}
