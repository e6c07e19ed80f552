// --- File: crates/booking_slots/src/service.rs ---
//! The booking service: free-slot listing, conflict-free booking and cancellation.
//!
//! Bookings for one provider are serialized through [`ProviderLocks`] and written through the
//! store's conditional insert, so two requests racing for the same slot produce exactly one
//! appointment.

use booking_common::logging::log_result;
use booking_common::models::{
    capped_minutes, Appointment, ScheduleType, Service, WeeklySchedule, MAX_DURATION_MINUTES,
    STATUS_CONFIRMED,
};
use booking_common::services::{BookingStore, InsertOutcome, ServiceCatalog, StoreError};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::logic::{
    calculate_free_slots, effective_busy_minutes, find_conflict, requested_duration,
    BookingError, BusyInterval, PAST_GRACE_MINUTES,
};
use crate::schedule::{resolve_day, ResolvedDate};

/// Source of "now". Injected so the past-booking rule can be tested.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One async mutex per provider id, created on first use.
#[derive(Debug, Default)]
pub struct ProviderLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProviderLocks {
    pub fn for_provider(&self, provider_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(provider_id.to_string()).or_default().clone()
    }
}

/// Service durations of one provider, fetched at most once and only when an appointment
/// without its own duration shows up.
struct DurationCache<'a, S: ServiceCatalog + ?Sized> {
    catalog: &'a S,
    provider_id: &'a str,
    minutes: Option<HashMap<String, i64>>,
}

impl<'a, S: ServiceCatalog + ?Sized> DurationCache<'a, S> {
    fn new(catalog: &'a S, provider_id: &'a str) -> Self {
        Self {
            catalog,
            provider_id,
            minutes: None,
        }
    }

    async fn service_minutes(&mut self, service_id: &str) -> Result<Option<i64>, StoreError> {
        if self.minutes.is_none() {
            debug!("Loading service durations for provider {}", self.provider_id);
            let services = self.catalog.list_services(self.provider_id).await?;
            self.minutes = Some(
                services
                    .into_iter()
                    .filter_map(|s| s.id.map(|id| (id, s.duration_minutes)))
                    .collect(),
            );
        }
        Ok(self
            .minutes
            .as_ref()
            .and_then(|minutes| minutes.get(service_id).copied()))
    }
}

/// A booking attempt as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub provider_id: String,
    pub service_id: String,
    /// Start, in the offset the client submitted it with; that offset picks the day to check.
    pub scheduled_at: DateTime<FixedOffset>,
    pub duration_minutes: Option<i64>,
    pub user_id: Option<String>,
    pub notes: Option<Value>,
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    locks: ProviderLocks,
    operating_tz: Tz,
}

impl BookingService {
    /// Create a service over `store` with the system clock and UTC as operating time zone.
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            locks: ProviderLocks::default(),
            operating_tz: Tz::UTC,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Time zone used to render local wall times in the booking logs.
    pub fn with_operating_time_zone(mut self, tz: Tz) -> Self {
        self.operating_tz = tz;
        self
    }

    pub fn store(&self) -> Arc<dyn BookingStore> {
        self.store.clone()
    }

    async fn service_of_provider(
        &self,
        provider_id: &str,
        service_id: &str,
    ) -> Result<Service, BookingError> {
        let service = self
            .store
            .get_service(service_id)
            .await?
            .ok_or_else(|| BookingError::ServiceNotFound(service_id.to_string()))?;
        if service.provider_id != provider_id {
            return Err(BookingError::ServiceProviderMismatch {
                service_id: service_id.to_string(),
                provider_id: provider_id.to_string(),
            });
        }
        Ok(service)
    }

    /// Busy intervals of the provider's active appointments reaching into `day`.
    ///
    /// Durations are capped at one day, so only the previous day's appointments can run past
    /// midnight; both days are read.
    async fn busy_intervals(
        &self,
        provider_id: &str,
        day: &ResolvedDate,
    ) -> Result<Vec<BusyInterval>, BookingError> {
        let day_start = day.start_of_day();
        let mut appointments = Vec::new();
        if let Some(previous) =
            day_start.checked_sub_signed(Duration::minutes(MAX_DURATION_MINUTES))
        {
            appointments.extend(self.store.list_for_day(provider_id, previous).await?);
        }
        appointments.extend(self.store.list_for_day(provider_id, day_start).await?);

        let day_start = day_start.with_timezone(&Utc);
        let mut durations = DurationCache::new(self.store.as_ref(), provider_id);
        let mut busy = Vec::with_capacity(appointments.len());
        for appointment in &appointments {
            let minutes = if appointment.duration_minutes > 0 {
                appointment.duration_minutes
            } else {
                let service_minutes = durations.service_minutes(&appointment.service_id).await?;
                effective_busy_minutes(appointment.duration_minutes, service_minutes)
            };
            let interval =
                BusyInterval::starting_at(appointment.scheduled_at, capped_minutes(minutes));
            if interval.end > day_start {
                busy.push(interval);
            }
        }
        debug!(
            "Provider {} has {} busy intervals on {}",
            provider_id,
            busy.len(),
            day.date
        );
        Ok(busy)
    }

    /// Free `HH:MM` start times for `service_id` on `day`. A closed day yields an empty list.
    pub async fn list_free_slots(
        &self,
        provider_id: &str,
        service_id: &str,
        day: &ResolvedDate,
    ) -> Result<Vec<String>, BookingError> {
        let service = self.service_of_provider(provider_id, service_id).await?;

        let schedule = self
            .store
            .get_schedule(provider_id, ScheduleType::Global)
            .await?;
        let availability = resolve_day(schedule.as_ref(), day);
        if availability.is_closed() {
            return Ok(Vec::new());
        }

        let busy = self.busy_intervals(provider_id, day).await?;
        Ok(calculate_free_slots(
            day,
            availability.ranges(),
            service.slot_duration(),
            &busy,
        ))
    }

    /// Validates a booking against the provider's current appointments and stores it.
    pub async fn validate_and_book(
        &self,
        request: BookingRequest,
    ) -> Result<Appointment, BookingError> {
        let service = self
            .service_of_provider(&request.provider_id, &request.service_id)
            .await?;
        let length = requested_duration(request.duration_minutes)?
            .unwrap_or_else(|| service.slot_duration());

        let now = self.clock.now();
        let start = request.scheduled_at.with_timezone(&Utc);
        if start < now - Duration::minutes(PAST_GRACE_MINUTES) {
            warn!(
                "Rejecting booking for provider {} in the past: {}",
                request.provider_id, start
            );
            return Err(BookingError::PastSchedule(start));
        }

        let provider_lock = self.locks.for_provider(&request.provider_id);
        let _guard = provider_lock.lock().await;

        let day = ResolvedDate::of_instant(&request.scheduled_at);
        let busy = self.busy_intervals(&request.provider_id, &day).await?;
        let candidate = BusyInterval::starting_at(start, length);
        if let Some(taken) = find_conflict(&candidate, &busy) {
            warn!(
                "Slot {} - {} for provider {} collides with {} - {}",
                candidate.start, candidate.end, request.provider_id, taken.start, taken.end
            );
            return Err(BookingError::SlotConflict);
        }

        let mut appointment = Appointment::new(&request.provider_id, &request.service_id, start);
        appointment.duration_minutes = length.num_minutes();
        appointment.status = STATUS_CONFIRMED.to_string();
        appointment.service_name = Some(service.title.clone());
        appointment.user_id = request.user_id;
        appointment.notes = request.notes;
        appointment.created_at = Some(now);
        appointment.updated_at = Some(now);

        match self.store.insert_if_vacant(appointment).await? {
            InsertOutcome::Inserted(stored) => {
                info!(
                    "Booked appointment {} for provider {} at {} (local {})",
                    stored.id.as_deref().unwrap_or("?"),
                    stored.provider_id,
                    stored.scheduled_at,
                    stored.scheduled_at.with_timezone(&self.operating_tz)
                );
                Ok(stored)
            }
            InsertOutcome::Occupied => {
                warn!(
                    "Store refused overlapping booking for provider {} at {}",
                    request.provider_id, start
                );
                Err(BookingError::SlotConflict)
            }
        }
    }

    /// Cancels and soft-deletes an appointment; its slot frees up immediately.
    pub async fn cancel_appointment(&self, id: &str) -> Result<Appointment, BookingError> {
        log_result(
            self.cancel_stored(id).await,
            &format!("Cancelled appointment {id}"),
            &format!("Failed to cancel appointment {id}"),
        )
    }

    async fn cancel_stored(&self, id: &str) -> Result<Appointment, BookingError> {
        let mut appointment = self.get_appointment(id).await?;
        appointment.cancel(self.clock.now());
        Ok(self.store.update_appointment(appointment).await?)
    }

    pub async fn list_services(&self, provider_id: &str) -> Result<Vec<Service>, BookingError> {
        Ok(self.store.list_services(provider_id).await?)
    }

    /// Adds a service to the provider's catalog. A zero duration means the 30 minute default.
    pub async fn create_service(
        &self,
        provider_id: &str,
        mut service: Service,
    ) -> Result<Service, BookingError> {
        if !(0..=MAX_DURATION_MINUTES).contains(&service.duration_minutes) {
            return Err(BookingError::InvalidDuration(service.duration_minutes));
        }
        service.id = None;
        service.provider_id = provider_id.to_string();
        let stored = self.store.create_service(service).await?;
        info!(
            "Created service {} ({}) for provider {}",
            stored.id.as_deref().unwrap_or("?"),
            stored.title,
            provider_id
        );
        Ok(stored)
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, BookingError> {
        self.store
            .get_appointment(id)
            .await?
            .ok_or_else(|| BookingError::AppointmentNotFound(id.to_string()))
    }

    /// The provider's schedule of that type, or an empty one.
    pub async fn get_schedule(
        &self,
        provider_id: &str,
        schedule_type: ScheduleType,
    ) -> Result<WeeklySchedule, BookingError> {
        let schedule = self.store.get_schedule(provider_id, schedule_type).await?;
        Ok(schedule.unwrap_or_else(|| WeeklySchedule::empty(provider_id, schedule_type)))
    }

    /// Creates or replaces the provider's schedule of the type carried by `schedule`.
    pub async fn upsert_schedule(
        &self,
        provider_id: &str,
        mut schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, BookingError> {
        let now = self.clock.now();
        schedule.provider_id = provider_id.to_string();
        schedule.created_at.get_or_insert(now);
        schedule.updated_at = Some(now);
        let stored = self.store.upsert_schedule(schedule).await?;
        info!(
            "Stored {} schedule for provider {}",
            stored.schedule_type, provider_id
        );
        Ok(stored)
    }
}
