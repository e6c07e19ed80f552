//! SQL storage for the booking backend
//!
//! This crate provides a database client built on SQLx's `Any` driver and a store that
//! implements the booking store traits on top of it. SQLite is the only backend: its
//! conditional appointment insert relies on SQLite running one writer at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use booking_db::SqlBookingStore;
//!
//! async fn setup() -> Result<SqlBookingStore, booking_db::DbError> {
//!     SqlBookingStore::connect("sqlite::memory:").await
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::SqlBookingStore;
