// --- File: crates/booking_slots/src/logic.rs ---
use booking_common::error::{conflict, not_found, validation_error, AppError};
use booking_common::models::{TimeRange, FALLBACK_BUSY_MINUTES, MAX_DURATION_MINUTES};
use booking_common::services::StoreError;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::schedule::ResolvedDate;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Candidate slots start every 30 minutes, whatever the service length.
pub const SLOT_STEP_MINUTES: i64 = 30;
/// How far in the past a booking may still start.
pub const PAST_GRACE_MINUTES: i64 = 5;

// --- Error Handling ---
use thiserror::Error;
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Service not found: {0}")]
    ServiceNotFound(String),
    #[error("Service {service_id} does not belong to provider {provider_id}")]
    ServiceProviderMismatch {
        service_id: String,
        provider_id: String,
    },
    #[error("Duration must be between 1 and {max} minutes, got {0}", max = MAX_DURATION_MINUTES)]
    InvalidDuration(i64),
    #[error("Cannot book in the past: {0}")]
    PastSchedule(DateTime<Utc>),
    #[error("The requested slot is already booked")]
    SlotConflict,
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidDate(_)
            | BookingError::ServiceProviderMismatch { .. }
            | BookingError::InvalidDuration(_)
            | BookingError::PastSchedule(_) => validation_error(err),
            BookingError::ServiceNotFound(_) | BookingError::AppointmentNotFound(_) => {
                not_found(err)
            }
            BookingError::SlotConflict => conflict(err),
            BookingError::Storage(store_err) => AppError::from(store_err),
        }
    }
}

// --- Data Structures ---
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SlotQuery {
    /// Calendar date, `YYYY-MM-DD` or RFC 3339
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07"))]
    #[serde(default)]
    pub date: String,

    /// Service id
    #[serde(default)]
    pub service: String,

    /// Caller's offset from UTC in minutes, e.g. `-180`
    #[cfg_attr(feature = "openapi", schema(example = "-180"))]
    pub timezone_offset: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SlotsResponse {
    #[cfg_attr(feature = "openapi", schema(example = json!(["09:00", "09:30"])))]
    pub slots: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookAppointmentRequest {
    pub service_id: String,
    /// RFC 3339 start, e.g. `2030-01-07T09:00:00-03:00`
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime))]
    pub scheduled_at: DateTime<FixedOffset>,
    pub duration_minutes: Option<i64>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub notes: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ScheduleQuery {
    /// `global` (default) or `custom`
    #[serde(rename = "type")]
    pub schedule_type: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HealthResponse {
    pub status: String,
}

// --- Busy Intervals ---

/// A half-open interval `[start, end)` during which the provider is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The end saturates at the latest representable instant instead of overflowing.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Self {
        let end = start
            .checked_add_signed(length)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(start, end)
    }

    /// Touching intervals do not overlap.
    pub fn overlaps(&self, other: &BusyInterval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A client-requested duration: `None` or non-positive defers to the service, anything
/// longer than a day is rejected.
pub fn requested_duration(minutes: Option<i64>) -> Result<Option<Duration>, BookingError> {
    match minutes {
        Some(m) if m > MAX_DURATION_MINUTES => Err(BookingError::InvalidDuration(m)),
        Some(m) if m > 0 => Ok(Duration::try_minutes(m)),
        _ => Ok(None),
    }
}

/// Minutes an appointment blocks: its own duration, else the service's, else 60.
pub fn effective_busy_minutes(own_minutes: i64, service_minutes: Option<i64>) -> i64 {
    if own_minutes > 0 {
        return own_minutes;
    }
    match service_minutes {
        Some(minutes) if minutes > 0 => minutes,
        _ => FALLBACK_BUSY_MINUTES,
    }
}

/// Returns the first busy interval the candidate overlaps, if any.
pub fn find_conflict<'a>(
    candidate: &BusyInterval,
    busy: &'a [BusyInterval],
) -> Option<&'a BusyInterval> {
    busy.iter().find(|interval| candidate.overlaps(interval))
}

// --- Availability Logic ---

/// Offset from midnight of an `HH:MM` string.
///
/// Never fails: each component is parsed on its own and anything unreadable counts as zero,
/// so `"09:00584"` is nine hours and `"garbage"` is midnight. `"24:00"` is the next midnight.
pub fn clock_offset(value: &str) -> Duration {
    let mut parts = value.trim().splitn(2, ':');
    let hours = parts
        .next()
        .and_then(|h| h.trim().parse::<i64>().ok())
        .filter(|h| (0..=24).contains(h))
        .unwrap_or(0);
    let minutes = parts
        .next()
        .and_then(|m| m.trim().parse::<i64>().ok())
        .filter(|m| (0..60).contains(m))
        .unwrap_or(0);
    Duration::minutes(hours * 60 + minutes)
}

/// Walks each open range in 30-minute steps and keeps every candidate of `slot_length`
/// that fits inside the range and overlaps no busy interval.
///
/// Ranges are taken in the order given; slots are not deduplicated or sorted across ranges.
pub fn calculate_free_slots(
    day: &ResolvedDate,
    ranges: &[TimeRange],
    slot_length: Duration,
    busy: &[BusyInterval],
) -> Vec<String> {
    let step = Duration::minutes(SLOT_STEP_MINUTES);
    let mut slots = Vec::new();

    for range in ranges {
        let range_start = day.at(clock_offset(&range.start));
        let range_end = day.at(clock_offset(&range.end));
        debug!(
            "Walking range {}-{} ({} - {})",
            range.start, range.end, range_start, range_end
        );

        let mut current = range_start;
        while current < range_end {
            let candidate = BusyInterval::starting_at(current, slot_length);
            if candidate.end > range_end {
                break;
            }
            if find_conflict(&candidate, busy).is_none() {
                slots.push(day.wall_clock(current));
            }
            current += step;
        }
    }
    slots
}
