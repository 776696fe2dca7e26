//! PostgreSQL implementation of ServiceRegistry and EventStore
//!
//! - Service deduplication via `INSERT ... ON CONFLICT (name) DO UPDATE ... RETURNING id`
//! - Attributes stored as JSONB and read back from `RETURNING`
//! - Descending-time scans backed by `idx_events_service_time` / `idx_events_time`

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{attributes_from_value, LogLevel};
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::models::{non_blank, EventFilter, EventRow, InsertedEvent, NewEvent};
use crate::store::{EventStore, ServiceRegistry, StoreError};

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Bound on waiting for a connection, including the startup readiness check.
    pub acquire_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(3),
            max_lifetime: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(FromRow)]
struct InsertedRecord {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    attributes: serde_json::Value,
}

#[derive(FromRow)]
struct EventRecord {
    id: Uuid,
    service: String,
    level: String,
    message: String,
    trace_id: Option<String>,
    span_id: Option<String>,
    occurred_at: DateTime<Utc>,
    attributes: serde_json::Value,
}

impl TryFrom<EventRecord> for EventRow {
    type Error = StoreError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let level: LogLevel = record.level.parse().map_err(|_| {
            StoreError::Serialization(format!("unknown level in events table: {}", record.level))
        })?;

        Ok(EventRow {
            id: record.id,
            service: record.service,
            level,
            message: record.message,
            trace_id: record.trace_id,
            span_id: record.span_id,
            occurred_at: record.occurred_at,
            attributes: attributes_from_value(record.attributes),
        })
    }
}

/// Classify a sqlx error, logging it with `context`.
fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    error!("{}: {}", context, e);
    match &e {
        sqlx::Error::Database(db) if !matches!(db.kind(), ErrorKind::Other) => {
            StoreError::Constraint(db.message().to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

/// PostgreSQL log store
///
/// # Example
///
/// ```ignore
/// use pulse_storage::{PoolConfig, PostgresLogStore};
///
/// let store = PostgresLogStore::connect("postgres://localhost/pulse", &PoolConfig::default()).await?;
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct PostgresLogStore {
    pool: PgPool,
}

impl PostgresLogStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and verify the database is reachable within `acquire_timeout`.
    pub async fn connect(database_url: &str, config: &PoolConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to run migrations: {}", e);
                StoreError::Database(e.to_string())
            })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ServiceRegistry for PostgresLogStore {
    #[instrument(skip(self))]
    async fn resolve_or_create(&self, name: &str) -> Result<Uuid, StoreError> {
        // The no-op update makes RETURNING yield the existing id on conflict.
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO services (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert service", e))?;

        debug!(%id, %name, "resolved service");
        Ok(id)
    }
}

#[async_trait]
impl EventStore for PostgresLogStore {
    #[instrument(skip(self, event), fields(level = %event.level))]
    async fn insert(&self, event: NewEvent, service_id: Uuid) -> Result<InsertedEvent, StoreError> {
        let attributes = serde_json::Value::Object(event.attributes.unwrap_or_default());

        let record = sqlx::query_as::<_, InsertedRecord>(
            r#"
            INSERT INTO events (id, service_id, level, message, trace_id, span_id, occurred_at, attributes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, occurred_at, attributes
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(service_id)
        .bind(event.level.as_str())
        .bind(&event.message)
        .bind(non_blank(event.trace_id))
        .bind(non_blank(event.span_id))
        .bind(event.occurred_at)
        .bind(&attributes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert event", e))?;

        debug!(id = %record.id, %service_id, "inserted event");
        Ok(InsertedEvent {
            id: record.id,
            occurred_at: record.occurred_at,
            attributes: attributes_from_value(record.attributes),
        })
    }

    #[instrument(skip(self))]
    async fn query(&self, filter: &EventFilter) -> Result<Vec<EventRow>, StoreError> {
        let records = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT e.id, s.name AS service, e.level, e.message, e.trace_id, e.span_id,
                   e.occurred_at, e.attributes
            FROM events e
            JOIN services s ON s.id = e.service_id
            WHERE ($1::text IS NULL OR s.name = $1)
              AND ($2::text IS NULL OR e.level = $2)
              AND ($3::timestamptz IS NULL OR e.occurred_at >= $3)
              AND ($4::timestamptz IS NULL OR e.occurred_at <= $4)
            ORDER BY e.occurred_at DESC, e.id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.service.as_deref())
        .bind(filter.level.map(|l| l.as_str()))
        .bind(filter.since)
        .bind(filter.until)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query events", e))?;

        records.into_iter().map(EventRow::try_from).collect()
    }
}
