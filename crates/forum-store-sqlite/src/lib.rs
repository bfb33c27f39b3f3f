//! SQLite backend for the forum store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Rank merges are single `INSERT ... ON
//! CONFLICT` statements, which is what makes the ledger safe under concurrent
//! writers.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
