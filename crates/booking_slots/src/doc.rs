// File: crates/booking_slots/src/doc.rs

#![allow(dead_code)]
use utoipa::OpenApi;

use crate::logic::{BookAppointmentRequest, HealthResponse, SlotQuery, SlotsResponse};
use booking_common::models::{
    Appointment, DaySchedule, ScheduleType, Service, TimeRange, WeeklySchedule,
};

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/services",
    params(("provider_id" = String, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Services offered by the provider", body = [Service]),
        (status = 500, description = "Storage error")
    ),
    tag = "booking"
)]
fn doc_get_services_handler() {}

#[utoipa::path(
    post,
    path = "/providers/{provider_id}/services",
    params(("provider_id" = String, Path, description = "Provider id")),
    request_body(content = Service, example = json!({
        "title": "Consultation",
        "duration_minutes": 30
    })),
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Duration outside 0..=1440 minutes")
    ),
    tag = "booking"
)]
fn doc_create_service_handler() {}

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/slots",
    params(
        ("provider_id" = String, Path, description = "Provider id"),
        SlotQuery
    ),
    responses(
        (status = 200, description = "Free start times, HH:MM in the caller's offset", body = SlotsResponse,
         example = json!({"slots": ["09:00", "09:30", "10:00"]})),
        (status = 400, description = "Invalid date or missing parameters"),
        (status = 404, description = "Unknown service")
    ),
    tag = "booking"
)]
fn doc_get_slots_handler() {}

#[utoipa::path(
    post,
    path = "/providers/{provider_id}/appointments",
    params(
        ("provider_id" = String, Path, description = "Provider id"),
        ("x-user-id" = Option<String>, Header, description = "Caller identity")
    ),
    request_body(content = BookAppointmentRequest, example = json!({
        "service_id": "3f1c0a52-6a53-4a4e-9f0e-2f4f6c7b8d90",
        "scheduled_at": "2030-01-07T09:00:00-03:00",
        "notes": {"text": "first visit"}
    })),
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Booking in the past, duration over a day or service of another provider"),
        (status = 404, description = "Unknown service"),
        (status = 409, description = "Slot already booked")
    ),
    tag = "booking"
)]
fn doc_book_appointment_handler() {}

#[utoipa::path(
    patch,
    path = "/appointments/{appointment_id}/cancel",
    params(("appointment_id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = Appointment),
        (status = 404, description = "Unknown appointment")
    ),
    tag = "booking"
)]
fn doc_cancel_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/appointments/{appointment_id}",
    params(("appointment_id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment", body = Appointment),
        (status = 404, description = "Unknown appointment")
    ),
    tag = "booking"
)]
fn doc_get_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/providers/{provider_id}/schedule",
    params(
        ("provider_id" = String, Path, description = "Provider id"),
        ("type" = Option<String>, Query, description = "global (default) or custom")
    ),
    responses(
        (status = 200, description = "The schedule, empty if none is stored", body = WeeklySchedule)
    ),
    tag = "booking"
)]
fn doc_get_schedule_handler() {}

#[utoipa::path(
    put,
    path = "/providers/{provider_id}/schedule",
    params(("provider_id" = String, Path, description = "Provider id")),
    request_body(content = WeeklySchedule, example = json!({
        "type": "global",
        "days": {"mon": {"enabled": true, "ranges": [{"start": "09:00", "end": "12:00"}]}}
    })),
    responses(
        (status = 200, description = "Stored schedule", body = WeeklySchedule)
    ),
    tag = "booking"
)]
fn doc_put_schedule_handler() {}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "booking"
)]
fn doc_health_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_services_handler,
        doc_create_service_handler,
        doc_get_slots_handler,
        doc_book_appointment_handler,
        doc_cancel_appointment_handler,
        doc_get_appointment_handler,
        doc_get_schedule_handler,
        doc_put_schedule_handler,
        doc_health_handler
    ),
    components(
        schemas(
            SlotsResponse,
            BookAppointmentRequest,
            HealthResponse,
            Appointment,
            Service,
            WeeklySchedule,
            DaySchedule,
            TimeRange,
            ScheduleType
        )
    ),
    tags(
        (name = "booking", description = "Provider availability and appointment booking")
    ),
    servers(
        (url = "/api", description = "Booking API server")
    )
)]
pub struct BookingApiDoc;
