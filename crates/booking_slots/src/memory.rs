// --- File: crates/booking_slots/src/memory.rs ---
//! Process-local store used by default and by the tests.

use booking_common::models::{Appointment, ScheduleType, Service, WeeklySchedule};
use booking_common::services::{
    AppointmentStore, BoxFuture, InsertOutcome, ScheduleStore, ServiceCatalog, StoreError,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    schedules: HashMap<(String, ScheduleType), WeeklySchedule>,
    services: HashMap<String, Service>,
    appointments: HashMap<String, Appointment>,
}

/// All tables behind one mutex; the conditional insert checks and writes under that lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    /// Number of stored appointments, cancelled ones included.
    pub fn appointment_count(&self) -> usize {
        self.tables().map(|t| t.appointments.len()).unwrap_or(0)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ScheduleStore for InMemoryStore {
    fn get_schedule(
        &self,
        provider_id: &str,
        schedule_type: ScheduleType,
    ) -> BoxFuture<'_, Option<WeeklySchedule>, StoreError> {
        let key = (provider_id.to_string(), schedule_type);
        Box::pin(async move { Ok(self.tables()?.schedules.get(&key).cloned()) })
    }

    fn upsert_schedule(
        &self,
        mut schedule: WeeklySchedule,
    ) -> BoxFuture<'_, WeeklySchedule, StoreError> {
        Box::pin(async move {
            let mut tables = self.tables()?;
            let key = (schedule.provider_id.clone(), schedule.schedule_type);
            match tables.schedules.get(&key) {
                Some(existing) => {
                    schedule.id = existing.id.clone();
                    schedule.created_at = existing.created_at.or(schedule.created_at);
                }
                None => {
                    schedule.id = Some(new_id());
                }
            }
            tables.schedules.insert(key, schedule.clone());
            Ok(schedule)
        })
    }
}

impl ServiceCatalog for InMemoryStore {
    fn get_service(&self, service_id: &str) -> BoxFuture<'_, Option<Service>, StoreError> {
        let service_id = service_id.to_string();
        Box::pin(async move { Ok(self.tables()?.services.get(&service_id).cloned()) })
    }

    fn list_services(&self, provider_id: &str) -> BoxFuture<'_, Vec<Service>, StoreError> {
        let provider_id = provider_id.to_string();
        Box::pin(async move {
            let tables = self.tables()?;
            let mut services: Vec<Service> = tables
                .services
                .values()
                .filter(|s| s.provider_id == provider_id)
                .cloned()
                .collect();
            services.sort_by(|a, b| a.title.cmp(&b.title));
            Ok(services)
        })
    }

    fn create_service(&self, mut service: Service) -> BoxFuture<'_, Service, StoreError> {
        Box::pin(async move {
            let id = service.id.clone().unwrap_or_else(new_id);
            service.id = Some(id.clone());
            self.tables()?.services.insert(id, service.clone());
            Ok(service)
        })
    }
}

impl AppointmentStore for InMemoryStore {
    fn list_for_day(
        &self,
        provider_id: &str,
        day_start: DateTime<FixedOffset>,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError> {
        let provider_id = provider_id.to_string();
        let from = day_start.with_timezone(&Utc);
        let to = from + Duration::hours(24);
        Box::pin(async move {
            let tables = self.tables()?;
            let mut appointments: Vec<Appointment> = tables
                .appointments
                .values()
                .filter(|a| a.provider_id == provider_id && a.is_active())
                .filter(|a| a.scheduled_at >= from && a.scheduled_at < to)
                .cloned()
                .collect();
            appointments.sort_by_key(|a| a.scheduled_at);
            Ok(appointments)
        })
    }

    fn get_appointment(&self, id: &str) -> BoxFuture<'_, Option<Appointment>, StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.tables()?.appointments.get(&id).cloned()) })
    }

    fn insert_if_vacant(
        &self,
        mut appointment: Appointment,
    ) -> BoxFuture<'_, InsertOutcome, StoreError> {
        Box::pin(async move {
            let mut tables = self.tables()?;
            let start = appointment.scheduled_at;
            let end = appointment.busy_until();
            let occupied = tables.appointments.values().any(|existing| {
                existing.provider_id == appointment.provider_id
                    && existing.is_active()
                    && existing.scheduled_at < end
                    && existing.busy_until() > start
            });
            if occupied {
                debug!(
                    "Provider {} already busy in {} - {}",
                    appointment.provider_id, start, end
                );
                return Ok(InsertOutcome::Occupied);
            }

            let id = new_id();
            appointment.id = Some(id.clone());
            tables.appointments.insert(id, appointment.clone());
            Ok(InsertOutcome::Inserted(appointment))
        })
    }

    fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        Box::pin(async move {
            let id = appointment
                .id
                .clone()
                .ok_or_else(|| StoreError::NotFound("appointment without id".to_string()))?;
            let mut tables = self.tables()?;
            match tables.appointments.get_mut(&id) {
                Some(stored) => {
                    *stored = appointment.clone();
                    Ok(appointment)
                }
                None => Err(StoreError::NotFound(format!("appointment {id}"))),
            }
        })
    }
}
