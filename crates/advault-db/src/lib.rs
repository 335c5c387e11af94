//! Advault database layer
//!
//! The record store for ingested ads: the `AdStore` trait, its Postgres
//! implementation and transaction helpers.

pub mod db;
pub mod error;
pub mod store;

pub use db::{AdRepository, TransactionGuard};
pub use error::StoreError;
#[cfg(any(test, feature = "test-helpers"))]
pub use store::MemoryAdStore;
pub use store::AdStore;

/// Embedded migrations from the workspace `migrations/` directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
