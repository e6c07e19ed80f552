// File: crates/booking_slots/src/handlers.rs
use crate::logic::{
    BookAppointmentRequest, HealthResponse, ScheduleQuery, SlotQuery, SlotsResponse,
};
use crate::schedule::resolve_query_date;
use crate::service::{BookingRequest, BookingService};
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::Json,
};
use booking_common::error::{validation_error, AppError};
use booking_common::http::handle_json_result;
use booking_common::models::{Appointment, ScheduleType, Service, WeeklySchedule};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

/// Header carrying the caller identity set by the authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

// Shared state of the booking handlers
pub type BookingState = Arc<BookingService>;

/// The authenticated caller, if the auth layer identified one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(CallerIdentity(user_id))
    }
}

fn parse_schedule_type(raw: Option<&str>) -> Result<ScheduleType, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ScheduleType::Global),
        Some(value) => value.parse().map_err(validation_error),
    }
}

/// Lists the services a provider offers.
pub async fn get_services_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<Service>>, AppError> {
    handle_json_result(service.list_services(&provider_id).await)
}

/// Adds a service to a provider's catalog.
pub async fn create_service_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
    Json(payload): Json<Service>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let created = service.create_service(&provider_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Free start times of a service on one day.
pub async fn get_slots_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    if query.date.trim().is_empty() || query.service.trim().is_empty() {
        return Err(validation_error("date and service are required"));
    }
    let day = resolve_query_date(&query.date, query.timezone_offset.as_deref())?;
    let slots = service
        .list_free_slots(&provider_id, query.service.trim(), &day)
        .await?;
    info!(
        "{} free slots for provider {} on {}",
        slots.len(),
        provider_id,
        day.date
    );
    Ok(Json(SlotsResponse { slots }))
}

/// Books an appointment if the slot is still free.
#[axum::debug_handler]
pub async fn book_appointment_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
    CallerIdentity(user_id): CallerIdentity,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let request = BookingRequest {
        provider_id,
        service_id: payload.service_id,
        scheduled_at: payload.scheduled_at,
        duration_minutes: payload.duration_minutes,
        user_id,
        notes: payload.notes,
    };
    let appointment = service.validate_and_book(request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment_handler(
    State(service): State<BookingState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    handle_json_result(service.get_appointment(&appointment_id).await)
}

pub async fn cancel_appointment_handler(
    State(service): State<BookingState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    handle_json_result(service.cancel_appointment(&appointment_id).await)
}

pub async fn get_schedule_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<WeeklySchedule>, AppError> {
    let schedule_type = parse_schedule_type(query.schedule_type.as_deref())?;
    handle_json_result(service.get_schedule(&provider_id, schedule_type).await)
}

/// Creates or replaces a provider's schedule. The body's `type` picks which one.
pub async fn put_schedule_handler(
    State(service): State<BookingState>,
    Path(provider_id): Path<String>,
    Json(schedule): Json<WeeklySchedule>,
) -> Result<Json<WeeklySchedule>, AppError> {
    handle_json_result(service.upsert_schedule(&provider_id, schedule).await)
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
