// --- File: crates/booking_slots/src/routes.rs ---

use crate::handlers::{
    book_appointment_handler, cancel_appointment_handler, create_service_handler,
    get_appointment_handler, get_schedule_handler, get_services_handler, get_slots_handler,
    health_handler, put_schedule_handler,
};
use crate::service::BookingService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all booking routes, meant to be nested under `/api`.
pub fn routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/providers/{provider_id}/services",
            get(get_services_handler).post(create_service_handler),
        )
        .route("/providers/{provider_id}/slots", get(get_slots_handler))
        .route(
            "/providers/{provider_id}/appointments",
            post(book_appointment_handler),
        )
        .route(
            "/providers/{provider_id}/schedule",
            get(get_schedule_handler).put(put_schedule_handler),
        )
        .route("/appointments/{appointment_id}", get(get_appointment_handler))
        .route(
            "/appointments/{appointment_id}/cancel",
            patch(cancel_appointment_handler),
        )
        .with_state(service)
}
