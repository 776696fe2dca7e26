//! # Pulse Storage
//!
//! Persistence for log events and the services that emit them.
//!
//! - [`ServiceRegistry`]: name → id resolution with upsert semantics
//! - [`EventStore`]: event inserts and filtered, newest-first scans
//! - [`PostgresLogStore`]: production implementation (sqlx, JSONB attributes)
//! - [`InMemoryLogStore`]: dev mode and tests

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::InMemoryLogStore;
pub use models::{
    EventFilter, EventRow, InsertedEvent, NewEvent, ServiceRow, DEFAULT_QUERY_LIMIT,
    MAX_QUERY_LIMIT,
};
pub use postgres::{PoolConfig, PostgresLogStore};
pub use store::{EventStore, ServiceRegistry, StoreError};
