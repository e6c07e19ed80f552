// --- File: crates/booking_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The HTTP-facing error type shared by all booking crates.
///
/// Domain crates keep their own error enums and implement `From<TheirError> for AppError`
/// so handlers can return a single type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input that could not be parsed
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Input that parsed but violates a business rule
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A storage collaborator failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The request collides with existing state
    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for AppError {
    fn status_code(&self) -> u16 {
        match self {
            AppError::ParseError(_) => 400,
            AppError::ValidationError(_) => 400,
            AppError::StorageError(_) => 500,
            AppError::ConflictError(_) => 409,
            AppError::NotFoundError(_) => 404,
            AppError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, AppError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, AppError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, AppError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| AppError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, AppError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| AppError::InternalError(format!("{}: {}", f(), error)))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<crate::services::StoreError> for AppError {
    fn from(err: crate::services::StoreError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> AppError {
    AppError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> AppError {
    AppError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> AppError {
    AppError::ConflictError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> AppError {
    AppError::InternalError(message.to_string())
}
