use booking_common::models::{
    Appointment, DaySchedule, ScheduleType, Service, TimeRange, WeeklySchedule, STATUS_CANCELLED,
};
use booking_common::services::{
    AppointmentStore, InsertOutcome, ScheduleStore, ServiceCatalog, StoreError,
};
use booking_db::SqlBookingStore;
use chrono::{DateTime, FixedOffset, TimeZone, Utc, Weekday};
use serde_json::json;

async fn store() -> SqlBookingStore {
    SqlBookingStore::connect("sqlite::memory:").await.unwrap()
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, minute, 0).unwrap()
}

fn appointment(provider: &str, start: DateTime<Utc>, minutes: i64) -> Appointment {
    let mut appointment = Appointment::new(provider, "service-1", start);
    appointment.duration_minutes = minutes;
    appointment.created_at = Some(at(0, 0));
    appointment.updated_at = Some(at(0, 0));
    appointment
}

async fn insert(store: &SqlBookingStore, appointment: Appointment) -> Appointment {
    match store.insert_if_vacant(appointment).await.unwrap() {
        InsertOutcome::Inserted(stored) => stored,
        InsertOutcome::Occupied => panic!("slot unexpectedly occupied"),
    }
}

#[tokio::test]
async fn test_schema_init_is_idempotent() {
    let store = store().await;
    store.init_schema().await.unwrap();
    assert!(store.client().is_healthy().await);
}

#[tokio::test]
async fn test_schedule_round_trip_and_upsert() {
    let store = store().await;
    let mut schedule = WeeklySchedule::empty("p", ScheduleType::Global).with_day(
        Weekday::Mon,
        DaySchedule::open(vec![TimeRange::new("09:00", "12:00")]),
    );
    schedule.valid_from = Some(at(0, 0));
    schedule.created_at = Some(at(1, 0));
    schedule.updated_at = Some(at(1, 0));

    let first = store.upsert_schedule(schedule.clone()).await.unwrap();
    assert!(first.id.is_some());
    assert_eq!(first.days, schedule.days);
    assert_eq!(first.valid_from, Some(at(0, 0)));

    schedule.days.clear();
    schedule.created_at = Some(at(5, 0));
    schedule.updated_at = Some(at(5, 0));
    let second = store.upsert_schedule(schedule).await.unwrap();
    assert_eq!(second.id, first.id);
    assert!(second.days.is_empty());
    assert_eq!(second.created_at, Some(at(1, 0)));
    assert_eq!(second.updated_at, Some(at(5, 0)));

    let fetched = store
        .get_schedule("p", ScheduleType::Global)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, second);
    assert!(store
        .get_schedule("p", ScheduleType::Custom)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_services_round_trip_with_description() {
    let store = store().await;
    let mut service = Service::new("p", "Massage", 45);
    service.description = Some(json!({"en": "Relaxing", "es": "Relajante"}));
    let created = store.create_service(service).await.unwrap();
    store.create_service(Service::new("q", "Other", 30)).await.unwrap();

    let fetched = store
        .get_service(created.id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, created);
    assert_eq!(store.list_services("p").await.unwrap(), vec![created]);
    assert!(store.get_service("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_conditional_insert_rejects_overlap() {
    let store = store().await;
    let first = insert(&store, appointment("p", at(9, 0), 30)).await;
    assert!(first.id.is_some());

    let clash = store
        .insert_if_vacant(appointment("p", at(9, 15), 30))
        .await
        .unwrap();
    assert_eq!(clash, InsertOutcome::Occupied);

    // Touching the end, and another provider, are both fine.
    insert(&store, appointment("p", at(9, 30), 30)).await;
    insert(&store, appointment("q", at(9, 0), 30)).await;

    // Zero duration blocks sixty minutes at write time.
    insert(&store, appointment("p", at(11, 0), 0)).await;
    let clash = store
        .insert_if_vacant(appointment("p", at(11, 45), 15))
        .await
        .unwrap();
    assert_eq!(clash, InsertOutcome::Occupied);
}

#[tokio::test]
async fn test_day_listing_excludes_cancelled_and_other_days() {
    let store = store().await;
    let mut kept = appointment("p", at(9, 0), 30);
    kept.notes = Some(json!({"text": "bring forms"}));
    kept.user_id = Some("user-1".to_string());
    let kept = insert(&store, kept).await;

    let mut cancelled = insert(&store, appointment("p", at(10, 0), 30)).await;
    cancelled.cancel(at(8, 0));
    let updated = store.update_appointment(cancelled).await.unwrap();
    assert_eq!(updated.status, STATUS_CANCELLED);

    insert(&store, appointment("p", at(23, 30), 30)).await;

    let day_start = at(0, 0).fixed_offset();
    let listed = store.list_for_day("p", day_start).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], kept);

    // Local midnight in UTC+02:00 is 22:00 UTC the day before.
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let local_start = plus_two.with_ymd_and_hms(2030, 1, 8, 0, 0, 0).unwrap();
    let next_local_day = store.list_for_day("p", local_start).await.unwrap();
    assert_eq!(next_local_day.len(), 1);
    assert_eq!(next_local_day[0].scheduled_at, at(23, 30));

    // The cancelled slot can be booked again.
    insert(&store, appointment("p", at(10, 0), 30)).await;
}

#[tokio::test]
async fn test_update_unknown_appointment_is_not_found() {
    let store = store().await;
    let mut ghost = appointment("p", at(9, 0), 30);
    ghost.id = Some("ghost".to_string());
    let err = store.update_appointment(ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(store.get_appointment("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_columns_read_back_as_none() {
    let store = store().await;
    let schedule = WeeklySchedule::empty("p", ScheduleType::Custom);
    let stored = store.upsert_schedule(schedule).await.unwrap();
    let fetched = store
        .get_schedule("p", ScheduleType::Custom)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, stored);
    assert_eq!(fetched.valid_from, None);
    assert_eq!(fetched.valid_to, None);
    assert_eq!(fetched.created_at, None);

    let service = store
        .create_service(Service::new("p", "Plain", 30))
        .await
        .unwrap();
    let fetched = store
        .get_service(service.id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.description, None);
    assert_eq!(fetched.icon_url, None);

    let mut bare = Appointment::new("p", "service-1", at(9, 0));
    bare.duration_minutes = 30;
    let stored = insert(&store, bare).await;
    let fetched = store
        .get_appointment(stored.id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, stored);
    assert_eq!(fetched.user_id, None);
    assert_eq!(fetched.service_name, None);
    assert_eq!(fetched.notes, None);
    assert_eq!(fetched.deleted_at, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_admit_one() {
    // A file database, so the pool really holds several connections.
    let path = std::env::temp_dir().join(format!("booking-{}.db", uuid::Uuid::new_v4()));
    let store = SqlBookingStore::connect(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_if_vacant(appointment("p", at(9, i * 5), 30))
                    .await
            })
        })
        .collect();

    let mut inserted = 0;
    for attempt in attempts {
        if let InsertOutcome::Inserted(_) = attempt.await.unwrap().unwrap() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);

    let listed = store.list_for_day("p", at(0, 0).fixed_offset()).await.unwrap();
    assert_eq!(listed.len(), 1);
    drop(store);
    let _ = std::fs::remove_file(&path);
}
