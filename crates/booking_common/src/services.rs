// --- File: crates/booking_common/src/services.rs ---
//! Store abstractions for the booking core.
//!
//! The slot engine never talks to a database directly. It reads schedules, services and
//! appointments through these traits, and writes appointments through
//! [`AppointmentStore::insert_if_vacant`], which every backend must implement as an atomic
//! conditional write.

use chrono::{DateTime, FixedOffset};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::models::{Appointment, ScheduleType, Service, WeeklySchedule};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Errors reported by store backends. The core propagates them unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Stored record could not be decoded: {0}")]
    Corrupt(String),
}

/// Result of a conditional appointment insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The appointment was written; carries the stored record with its id.
    Inserted(Appointment),
    /// An active appointment of the same provider overlaps; nothing was written.
    Occupied,
}

/// Read/write access to provider schedules.
pub trait ScheduleStore: Send + Sync {
    /// Fetch the provider's schedule of the given type, if any.
    fn get_schedule(
        &self,
        provider_id: &str,
        schedule_type: ScheduleType,
    ) -> BoxFuture<'_, Option<WeeklySchedule>, StoreError>;

    /// Create or replace the provider's schedule of that type.
    ///
    /// At most one schedule exists per (provider, type); an upsert keeps the existing id and
    /// `created_at`.
    fn upsert_schedule(&self, schedule: WeeklySchedule)
        -> BoxFuture<'_, WeeklySchedule, StoreError>;
}

/// Read access to the services providers offer.
pub trait ServiceCatalog: Send + Sync {
    fn get_service(&self, service_id: &str) -> BoxFuture<'_, Option<Service>, StoreError>;

    fn list_services(&self, provider_id: &str) -> BoxFuture<'_, Vec<Service>, StoreError>;

    /// Persist a new service and return it with its assigned id.
    fn create_service(&self, service: Service) -> BoxFuture<'_, Service, StoreError>;
}

/// Appointment persistence.
pub trait AppointmentStore: Send + Sync {
    /// Active appointments of the provider starting in `[day_start, day_start + 24h)`.
    ///
    /// Cancelled and soft-deleted records are excluded.
    fn list_for_day(
        &self,
        provider_id: &str,
        day_start: DateTime<FixedOffset>,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError>;

    fn get_appointment(&self, id: &str) -> BoxFuture<'_, Option<Appointment>, StoreError>;

    /// Insert the appointment unless an active appointment of the same provider overlaps
    /// `[scheduled_at, busy_until)`. The check and the write are atomic with respect to other
    /// writers of the same store, including writers in other processes sharing its database.
    fn insert_if_vacant(&self, appointment: Appointment)
        -> BoxFuture<'_, InsertOutcome, StoreError>;

    /// Replace a stored appointment. Fails with `StoreError::NotFound` for unknown ids.
    fn update_appointment(&self, appointment: Appointment)
        -> BoxFuture<'_, Appointment, StoreError>;
}

/// Everything the booking service needs from one backend.
pub trait BookingStore: ScheduleStore + ServiceCatalog + AppointmentStore {}

impl<T> BookingStore for T where T: ScheduleStore + ServiceCatalog + AppointmentStore {}
