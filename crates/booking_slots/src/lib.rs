// --- File: crates/booking_slots/src/lib.rs ---
// Declare modules within this crate
#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod memory;
pub mod routes;
pub mod schedule;
pub mod service;

pub use logic::BookingError;
pub use memory::InMemoryStore;
pub use schedule::{resolve_day, resolve_query_date, DayAvailability, ResolvedDate};
pub use service::{BookingRequest, BookingService, Clock, SystemClock};
