// --- File: crates/booking_slots/src/schedule.rs ---
//! Schedule resolution: which wall-clock ranges a provider works on a given calendar day.
//!
//! Schedules carry no timezone. A day is always resolved in the caller's fixed UTC offset,
//! so the weekday and the day boundaries follow the caller's calendar, not UTC's.

use booking_common::models::{day_key, TimeRange, WeeklySchedule};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday,
};
use tracing::debug;

use crate::logic::BookingError;

/// A calendar date pinned to the UTC offset it was requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub offset: FixedOffset,
}

impl ResolvedDate {
    pub fn new(date: NaiveDate, offset: FixedOffset) -> Self {
        Self { date, offset }
    }

    pub fn utc(date: NaiveDate) -> Self {
        Self::new(date, Utc.fix())
    }

    /// The calendar day an instant falls on, in the offset it carries.
    pub fn of_instant(instant: &DateTime<FixedOffset>) -> Self {
        Self::new(instant.date_naive(), *instant.offset())
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// The instant `since_midnight` after local midnight of this day.
    pub fn at(&self, since_midnight: Duration) -> DateTime<Utc> {
        let local_midnight = self.date.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::<Utc>::from_naive_utc_and_offset(utc_midnight, Utc) + since_midnight
    }

    /// Local midnight starting this day.
    pub fn start_of_day(&self) -> DateTime<FixedOffset> {
        self.at(Duration::zero()).with_timezone(&self.offset)
    }

    /// Formats an instant as `HH:MM` on this day's wall clock.
    pub fn wall_clock(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.offset).format("%H:%M").to_string()
    }
}

/// Outcome of resolving one day of a weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayAvailability {
    /// No work that day. Not an error: callers answer with an empty slot list.
    Closed,
    /// The day's ranges exactly as stored, in stored order.
    Open(Vec<TimeRange>),
}

impl DayAvailability {
    pub fn is_closed(&self) -> bool {
        matches!(self, DayAvailability::Closed)
    }

    pub fn ranges(&self) -> &[TimeRange] {
        match self {
            DayAvailability::Closed => &[],
            DayAvailability::Open(ranges) => ranges,
        }
    }
}

/// Resolves the open ranges of `day` from a provider's weekly schedule.
///
/// Closed when there is no schedule, no day entries, no entry for the weekday, the entry is
/// disabled, or the date lies outside the schedule's validity window.
pub fn resolve_day(schedule: Option<&WeeklySchedule>, day: &ResolvedDate) -> DayAvailability {
    let Some(schedule) = schedule else {
        debug!("No schedule; {} is closed", day.date);
        return DayAvailability::Closed;
    };
    if schedule.days.is_empty() || !schedule.covers(day.date) {
        debug!("Schedule empty or not valid on {}", day.date);
        return DayAvailability::Closed;
    }

    let key = day_key(day.weekday());
    match schedule.days.get(key) {
        Some(day_schedule) if day_schedule.enabled => {
            DayAvailability::Open(day_schedule.ranges.clone())
        }
        _ => {
            debug!("Day {} ({}) disabled or missing", day.date, key);
            DayAvailability::Closed
        }
    }
}

/// Parses a client offset in minutes east of UTC. Garbage and out-of-range values mean UTC.
pub fn parse_offset_minutes(raw: Option<&str>) -> FixedOffset {
    let utc = Utc.fix();
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return utc;
    };
    raw.parse::<i32>()
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(FixedOffset::east_opt)
        .unwrap_or(utc)
}

/// Resolves the query date of a slot request.
///
/// `YYYY-MM-DD` is read in the offset given by `timezone_offset` (minutes, default UTC).
/// An RFC 3339 timestamp is accepted too; its own offset then wins and its local date is used.
pub fn resolve_query_date(
    date: &str,
    timezone_offset: Option<&str>,
) -> Result<ResolvedDate, BookingError> {
    let trimmed = date.trim();
    let offset = parse_offset_minutes(timezone_offset);

    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(ResolvedDate::new(day, offset));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| ResolvedDate::of_instant(&instant))
        .map_err(|_| BookingError::InvalidDate(date.to_string()))
}
