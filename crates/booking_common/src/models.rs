// --- File: crates/booking_common/src/models.rs ---

// Records shared by the booking crates. The stores persist them, the slot engine
// reads them, and the HTTP layer serializes them as-is.

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Status given to every appointment created through the booking flow.
pub const STATUS_CONFIRMED: &str = "confirmed";
/// Status marking an appointment as soft-deleted; it no longer blocks slots.
pub const STATUS_CANCELLED: &str = "cancelled";

/// Slot width used when a service has no positive duration.
pub const DEFAULT_SERVICE_MINUTES: i64 = 30;
/// Busy width used when neither the appointment nor its service carries a duration.
pub const FALLBACK_BUSY_MINUTES: i64 = 60;

/// Longest duration a service or appointment may carry.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// `minutes` as a duration, clamped to `[0, MAX_DURATION_MINUTES]`.
pub fn capped_minutes(minutes: i64) -> Duration {
    Duration::minutes(minutes.clamp(0, MAX_DURATION_MINUTES))
}

/// Day keys indexed by `Weekday::num_days_from_sunday()`.
pub const DAY_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Returns the schedule key (`sun`..`sat`) for a weekday.
pub fn day_key(weekday: Weekday) -> &'static str {
    DAY_KEYS[weekday.num_days_from_sunday() as usize]
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// The recurring baseline; the only type availability reads.
    #[default]
    Global,
    Custom,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Global => "global",
            ScheduleType::Custom => "custom",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(ScheduleType::Global),
            "custom" => Ok(ScheduleType::Custom),
            other => Err(format!("unknown schedule type: {other}")),
        }
    }
}

/// A wall-clock window such as `09:00`-`12:00`.
///
/// Stored verbatim; nothing guarantees `start < end` or a well-formed value.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

impl DaySchedule {
    pub fn open(ranges: Vec<TimeRange>) -> Self {
        Self {
            enabled: true,
            ranges,
        }
    }
}

/// A provider's recurring week.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default, rename = "type")]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub days: BTreeMap<String, DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WeeklySchedule {
    /// An empty schedule of the given type; what a provider without one "has".
    pub fn empty(provider_id: &str, schedule_type: ScheduleType) -> Self {
        Self {
            id: None,
            provider_id: provider_id.to_string(),
            schedule_type,
            days: BTreeMap::new(),
            valid_from: None,
            valid_to: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style helper to set one day.
    pub fn with_day(mut self, weekday: Weekday, day: DaySchedule) -> Self {
        self.days.insert(day_key(weekday).to_string(), day);
        self
    }

    /// Whether `date` falls inside the optional validity window (bounds inclusive, UTC dates).
    pub fn covers(&self, date: NaiveDate) -> bool {
        let after_start = self
            .valid_from
            .map_or(true, |from| from.date_naive() <= date);
        let before_end = self.valid_to.map_or(true, |to| date <= to.date_naive());
        after_start && before_end
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration_minutes: i64,
    /// Opaque, passed through untouched.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl Service {
    pub fn new(provider_id: &str, title: &str, duration_minutes: i64) -> Self {
        Self {
            id: None,
            provider_id: provider_id.to_string(),
            title: title.to_string(),
            duration_minutes,
            description: None,
            icon_url: None,
        }
    }

    /// The slot width for this service: its own duration, or 30 minutes.
    pub fn slot_duration(&self) -> Duration {
        if self.duration_minutes > 0 {
            capped_minutes(self.duration_minutes)
        } else {
            Duration::minutes(DEFAULT_SERVICE_MINUTES)
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub service_id: String,
    /// Opaque caller identity handed over by the auth layer.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    /// Zero means "ask the service".
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub status: String,
    /// Opaque, passed through untouched.
    #[serde(default)]
    pub notes: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn new(provider_id: &str, service_id: &str, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            provider_id: provider_id.to_string(),
            service_id: service_id.to_string(),
            user_id: None,
            service_name: None,
            scheduled_at,
            duration_minutes: 0,
            status: STATUS_CONFIRMED.to_string(),
            notes: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Active appointments are the ones that block slots.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && self.status != STATUS_CANCELLED
    }

    /// End of the busy interval when only the record itself is known.
    pub fn busy_until(&self) -> DateTime<Utc> {
        let minutes = if self.duration_minutes > 0 {
            self.duration_minutes
        } else {
            FALLBACK_BUSY_MINUTES
        };
        self.scheduled_at
            .checked_add_signed(capped_minutes(minutes))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Marks the appointment cancelled and soft-deleted at `now`.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = STATUS_CANCELLED.to_string();
        self.deleted_at = Some(now);
        self.updated_at = Some(now);
    }
}
