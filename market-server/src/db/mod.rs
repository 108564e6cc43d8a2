//! Storage layer
//!
//! - [`MarketStore`] - storage trait shared by every service
//! - [`MemoryStore`] - in-process backend (tests, development)
//! - [`PgStore`] - PostgreSQL backend (sqlx)
//! - [`AggregateLocks`] - per-aggregate async locks

pub mod locks;
pub mod memory;
pub mod postgres;
pub mod store;

pub use locks::AggregateLocks;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    MarketStore, OrderFilter, OrderItemFilter, StatusChange, StoreError, StoreResult,
};
