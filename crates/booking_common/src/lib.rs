// --- File: crates/booking_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP error rendering
pub mod logging; // Logging utilities
pub mod models; // Domain records
pub mod services; // Store abstractions

#[cfg(test)]
mod models_test;

// Re-export error types and utilities for easier access
pub use error::{conflict, internal_error, not_found, validation_error, AppError, HttpStatusCode};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_result, parse_level};

// This crate holds what every other booking crate needs: the records the
// stores persist, the store traits themselves, and the shared error type.
