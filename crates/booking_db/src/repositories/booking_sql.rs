//! SQL implementation of the booking store traits
//!
//! Timestamps are stored as epoch milliseconds and JSON blobs as text, because the `Any`
//! driver cannot decode `DateTime<Utc>` or JSON columns.

use crate::error::DbError;
use crate::DbClient;
use booking_common::models::{Appointment, ScheduleType, Service, WeeklySchedule};
use booking_common::services::{
    AppointmentStore, BoxFuture, InsertOutcome, ScheduleStore, ServiceCatalog, StoreError,
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};
use tracing::{debug, error, info};
use uuid::Uuid;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS schedules (
        id TEXT PRIMARY KEY,
        provider_id TEXT NOT NULL,
        schedule_type TEXT NOT NULL,
        days TEXT NOT NULL,
        valid_from BIGINT,
        valid_to BIGINT,
        created_at BIGINT,
        updated_at BIGINT,
        UNIQUE(provider_id, schedule_type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        provider_id TEXT NOT NULL,
        title TEXT NOT NULL,
        duration_minutes BIGINT NOT NULL DEFAULT 0,
        description TEXT,
        icon_url TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id TEXT PRIMARY KEY,
        provider_id TEXT NOT NULL,
        service_id TEXT NOT NULL,
        user_id TEXT,
        service_name TEXT,
        scheduled_at BIGINT NOT NULL,
        ends_at BIGINT NOT NULL,
        duration_minutes BIGINT NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        notes TEXT,
        created_at BIGINT,
        updated_at BIGINT,
        deleted_at BIGINT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_appointments_provider_start
        ON appointments (provider_id, scheduled_at)
    "#,
];

const SCHEDULE_COLUMNS: &str =
    "id, provider_id, schedule_type, days, valid_from, valid_to, created_at, updated_at";
const SERVICE_COLUMNS: &str = "id, provider_id, title, duration_minutes, description, icon_url";
const APPOINTMENT_COLUMNS: &str = "id, provider_id, service_id, user_id, service_name, \
     scheduled_at, duration_minutes, status, notes, created_at, updated_at, deleted_at";

// --- Column conversions ---

fn millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

fn opt_millis(instant: Option<DateTime<Utc>>) -> Option<i64> {
    instant.map(millis)
}

fn from_millis(value: i64) -> Result<DateTime<Utc>, DbError> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| DbError::DecodeError(format!("timestamp out of range: {value}")))
}

fn opt_from_millis(value: Option<i64>) -> Result<Option<DateTime<Utc>>, DbError> {
    value.map(from_millis).transpose()
}

fn json_text(value: &Option<Value>) -> Option<String> {
    value.as_ref().map(Value::to_string)
}

fn parse_json(text: Option<String>) -> Result<Option<Value>, DbError> {
    text.map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(|e| DbError::DecodeError(format!("invalid JSON column: {e}")))
}

fn column<'r, T>(row: &'r AnyRow, name: &str) -> Result<T, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get(name)
        .map_err(|e| DbError::DecodeError(format!("column {name}: {e}")))
}

/// A nullable column. The `Any` driver refuses to decode NULL into `Option<T>`, so NULL is
/// checked on the raw value first.
fn optional_column<'r, T>(row: &'r AnyRow, name: &str) -> Result<Option<T>, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    let raw = row
        .try_get_raw(name)
        .map_err(|e| DbError::DecodeError(format!("column {name}: {e}")))?;
    if raw.is_null() {
        return Ok(None);
    }
    column(row, name).map(Some)
}

fn schedule_from_row(row: &AnyRow) -> Result<WeeklySchedule, DbError> {
    let schedule_type: String = column(row, "schedule_type")?;
    let days: String = column(row, "days")?;
    Ok(WeeklySchedule {
        id: Some(column(row, "id")?),
        provider_id: column(row, "provider_id")?,
        schedule_type: schedule_type.parse().map_err(DbError::DecodeError)?,
        days: serde_json::from_str(&days)
            .map_err(|e| DbError::DecodeError(format!("invalid schedule days: {e}")))?,
        valid_from: opt_from_millis(optional_column(row, "valid_from")?)?,
        valid_to: opt_from_millis(optional_column(row, "valid_to")?)?,
        created_at: opt_from_millis(optional_column(row, "created_at")?)?,
        updated_at: opt_from_millis(optional_column(row, "updated_at")?)?,
    })
}

fn service_from_row(row: &AnyRow) -> Result<Service, DbError> {
    Ok(Service {
        id: Some(column(row, "id")?),
        provider_id: column(row, "provider_id")?,
        title: column(row, "title")?,
        duration_minutes: column(row, "duration_minutes")?,
        description: parse_json(optional_column(row, "description")?)?,
        icon_url: optional_column(row, "icon_url")?,
    })
}

fn appointment_from_row(row: &AnyRow) -> Result<Appointment, DbError> {
    Ok(Appointment {
        id: Some(column(row, "id")?),
        provider_id: column(row, "provider_id")?,
        service_id: column(row, "service_id")?,
        user_id: optional_column(row, "user_id")?,
        service_name: optional_column(row, "service_name")?,
        scheduled_at: from_millis(column(row, "scheduled_at")?)?,
        duration_minutes: column(row, "duration_minutes")?,
        status: column(row, "status")?,
        notes: parse_json(optional_column(row, "notes")?)?,
        created_at: opt_from_millis(optional_column(row, "created_at")?)?,
        updated_at: opt_from_millis(optional_column(row, "updated_at")?)?,
        deleted_at: opt_from_millis(optional_column(row, "deleted_at")?)?,
    })
}

fn query_failed(what: &str) -> impl Fn(sqlx::Error) -> DbError + '_ {
    move |e| {
        error!("Failed to {}: {}", what, e);
        DbError::QueryError(e.to_string())
    }
}

/// SQL implementation of the schedule, service and appointment stores
#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Connects to `db_url` and creates the tables if needed.
    pub async fn connect(db_url: &str) -> Result<Self, DbError> {
        let store = Self::new(DbClient::from_url(db_url).await?);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");
        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }
        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn find_schedule(
        &self,
        provider_id: &str,
        schedule_type: ScheduleType,
    ) -> Result<Option<WeeklySchedule>, DbError> {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE provider_id = $1 AND schedule_type = $2"
        );
        let row = sqlx::query(&query)
            .bind(provider_id)
            .bind(schedule_type.as_str())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_failed("find schedule"))?;
        row.as_ref().map(schedule_from_row).transpose()
    }

    async fn save_schedule(&self, schedule: WeeklySchedule) -> Result<WeeklySchedule, DbError> {
        let days = serde_json::to_string(&schedule.days)
            .map_err(|e| DbError::QueryError(format!("schedule days not serializable: {e}")))?;
        let id = schedule.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tx = self.db_client.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO schedules
                (id, provider_id, schedule_type, days, valid_from, valid_to, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (provider_id, schedule_type) DO UPDATE SET
                days = excluded.days,
                valid_from = excluded.valid_from,
                valid_to = excluded.valid_to,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(&schedule.provider_id)
        .bind(schedule.schedule_type.as_str())
        .bind(days)
        .bind(opt_millis(schedule.valid_from))
        .bind(opt_millis(schedule.valid_to))
        .bind(opt_millis(schedule.created_at))
        .bind(opt_millis(schedule.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(query_failed("upsert schedule"))?;

        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE provider_id = $1 AND schedule_type = $2"
        );
        let row = sqlx::query(&query)
            .bind(&schedule.provider_id)
            .bind(schedule.schedule_type.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(query_failed("read back schedule"))?;
        let stored = schedule_from_row(&row)?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(
            "Stored {} schedule for provider {}",
            stored.schedule_type, stored.provider_id
        );
        Ok(stored)
    }

    async fn find_service(&self, service_id: &str) -> Result<Option<Service>, DbError> {
        let query = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(service_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_failed("find service"))?;
        row.as_ref().map(service_from_row).transpose()
    }

    async fn find_services(&self, provider_id: &str) -> Result<Vec<Service>, DbError> {
        let query =
            format!("SELECT {SERVICE_COLUMNS} FROM services WHERE provider_id = $1 ORDER BY title");
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_failed("list services"))?;
        rows.iter().map(service_from_row).collect()
    }

    async fn insert_service(&self, mut service: Service) -> Result<Service, DbError> {
        let id = service.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        sqlx::query(
            r#"
            INSERT INTO services (id, provider_id, title, duration_minutes, description, icon_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&id)
        .bind(&service.provider_id)
        .bind(&service.title)
        .bind(service.duration_minutes)
        .bind(json_text(&service.description))
        .bind(service.icon_url.clone())
        .execute(self.db_client.pool())
        .await
        .map_err(query_failed("insert service"))?;
        service.id = Some(id);
        Ok(service)
    }

    async fn find_active_in_window(
        &self,
        provider_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, DbError> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE provider_id = $1 AND scheduled_at >= $2 AND scheduled_at < $3 \
             AND deleted_at IS NULL AND status <> 'cancelled' \
             ORDER BY scheduled_at"
        );
        let rows = sqlx::query(&query)
            .bind(provider_id)
            .bind(millis(from))
            .bind(millis(to))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_failed("list appointments"))?;
        rows.iter().map(appointment_from_row).collect()
    }

    async fn find_appointment(&self, id: &str) -> Result<Option<Appointment>, DbError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_failed("find appointment"))?;
        row.as_ref().map(appointment_from_row).transpose()
    }

    /// Inserts in one statement, guarded by `NOT EXISTS` over the provider's active
    /// appointments, so no other writer can slip in between check and write.
    async fn insert_vacant(&self, mut appointment: Appointment) -> Result<InsertOutcome, DbError> {
        let id = Uuid::new_v4().to_string();
        let start = millis(appointment.scheduled_at);
        let end = millis(appointment.busy_until());

        // One statement, and SQLite admits one writer at a time, so the overlap check cannot
        // interleave with another insert.
        let result = sqlx::query(
            r#"
            INSERT INTO appointments
                (id, provider_id, service_id, user_id, service_name, scheduled_at, ends_at,
                 duration_minutes, status, notes, created_at, updated_at, deleted_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            WHERE NOT EXISTS (
                SELECT 1 FROM appointments
                WHERE provider_id = $2
                  AND deleted_at IS NULL
                  AND status <> 'cancelled'
                  AND scheduled_at < $7
                  AND ends_at > $6
            )
            "#,
        )
        .bind(&id)
        .bind(&appointment.provider_id)
        .bind(&appointment.service_id)
        .bind(appointment.user_id.clone())
        .bind(appointment.service_name.clone())
        .bind(start)
        .bind(end)
        .bind(appointment.duration_minutes)
        .bind(&appointment.status)
        .bind(json_text(&appointment.notes))
        .bind(opt_millis(appointment.created_at))
        .bind(opt_millis(appointment.updated_at))
        .bind(opt_millis(appointment.deleted_at))
        .execute(self.db_client.pool())
        .await
        .map_err(query_failed("insert appointment"))?;

        if result.rows_affected() == 0 {
            debug!(
                "Provider {} already busy in {} - {}",
                appointment.provider_id,
                appointment.scheduled_at,
                appointment.busy_until()
            );
            return Ok(InsertOutcome::Occupied);
        }
        appointment.id = Some(id);
        Ok(InsertOutcome::Inserted(appointment))
    }

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let id = appointment
            .id
            .clone()
            .ok_or_else(|| StoreError::NotFound("appointment without id".to_string()))?;
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                service_id = $2, user_id = $3, service_name = $4, scheduled_at = $5,
                ends_at = $6, duration_minutes = $7, status = $8, notes = $9,
                created_at = $10, updated_at = $11, deleted_at = $12
            WHERE id = $1
            "#,
        )
        .bind(&id)
        .bind(&appointment.service_id)
        .bind(appointment.user_id.clone())
        .bind(appointment.service_name.clone())
        .bind(millis(appointment.scheduled_at))
        .bind(millis(appointment.busy_until()))
        .bind(appointment.duration_minutes)
        .bind(&appointment.status)
        .bind(json_text(&appointment.notes))
        .bind(opt_millis(appointment.created_at))
        .bind(opt_millis(appointment.updated_at))
        .bind(opt_millis(appointment.deleted_at))
        .execute(self.db_client.pool())
        .await
        .map_err(query_failed("update appointment"))
        .map_err(StoreError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("appointment {id}")));
        }
        Ok(appointment)
    }
}

impl ScheduleStore for SqlBookingStore {
    fn get_schedule(
        &self,
        provider_id: &str,
        schedule_type: ScheduleType,
    ) -> BoxFuture<'_, Option<WeeklySchedule>, StoreError> {
        let provider_id = provider_id.to_string();
        Box::pin(async move { Ok(self.find_schedule(&provider_id, schedule_type).await?) })
    }

    fn upsert_schedule(
        &self,
        schedule: WeeklySchedule,
    ) -> BoxFuture<'_, WeeklySchedule, StoreError> {
        Box::pin(async move { Ok(self.save_schedule(schedule).await?) })
    }
}

impl ServiceCatalog for SqlBookingStore {
    fn get_service(&self, service_id: &str) -> BoxFuture<'_, Option<Service>, StoreError> {
        let service_id = service_id.to_string();
        Box::pin(async move { Ok(self.find_service(&service_id).await?) })
    }

    fn list_services(&self, provider_id: &str) -> BoxFuture<'_, Vec<Service>, StoreError> {
        let provider_id = provider_id.to_string();
        Box::pin(async move { Ok(self.find_services(&provider_id).await?) })
    }

    fn create_service(&self, service: Service) -> BoxFuture<'_, Service, StoreError> {
        Box::pin(async move { Ok(self.insert_service(service).await?) })
    }
}

impl AppointmentStore for SqlBookingStore {
    fn list_for_day(
        &self,
        provider_id: &str,
        day_start: DateTime<FixedOffset>,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError> {
        let provider_id = provider_id.to_string();
        let from = day_start.with_timezone(&Utc);
        let to = from + Duration::hours(24);
        Box::pin(async move { Ok(self.find_active_in_window(&provider_id, from, to).await?) })
    }

    fn get_appointment(&self, id: &str) -> BoxFuture<'_, Option<Appointment>, StoreError> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.find_appointment(&id).await?) })
    }

    fn insert_if_vacant(
        &self,
        appointment: Appointment,
    ) -> BoxFuture<'_, InsertOutcome, StoreError> {
        Box::pin(async move { Ok(self.insert_vacant(appointment).await?) })
    }

    fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        Box::pin(self.save_appointment(appointment))
    }
}
