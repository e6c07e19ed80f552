//! End-to-end booking flow against the in-memory store.


use booking_slots::{resolve_query_date, BookingError, BookingRequest};
use fixtures::{create_booking_service, create_seeded_store, monday_at, PROVIDER};

fn request(service_id: &str, hour: u32, minute: u32, offset_minutes: i32) -> BookingRequest {
    BookingRequest {
        provider_id: PROVIDER.to_string(),
        service_id: service_id.to_string(),
        scheduled_at: monday_at(hour, minute, offset_minutes),
        duration_minutes: None,
        user_id: Some("flow-user".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn test_list_book_list_cancel_list() {
    let (store, short, long) = create_seeded_store().await;
    let service = create_booking_service(store);
    let day = resolve_query_date("2030-01-07", None).unwrap();

    let before = service.list_free_slots(PROVIDER, &short, &day).await.unwrap();
    assert_eq!(before.len(), 6);

    // A 60 minute booking at 10:00 blocks 10:00 and 10:30 for the short service.
    let booked = service
        .validate_and_book(request(&long, 10, 0, 0))
        .await
        .unwrap();
    let during = service.list_free_slots(PROVIDER, &short, &day).await.unwrap();
    assert_eq!(during, vec!["09:00", "09:30", "11:00", "11:30"]);

    // The long service now only fits at 09:00 and 11:00.
    let long_slots = service.list_free_slots(PROVIDER, &long, &day).await.unwrap();
    assert_eq!(long_slots, vec!["09:00", "11:00"]);

    service
        .cancel_appointment(booked.id.as_deref().unwrap())
        .await
        .unwrap();
    let after = service.list_free_slots(PROVIDER, &short, &day).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_client_offset_shifts_the_window() {
    let (store, short, _) = create_seeded_store().await;
    let service = create_booking_service(store);

    // Booked at 09:00 in UTC-03:00, i.e. 12:00 UTC.
    service
        .validate_and_book(request(&short, 9, 0, -180))
        .await
        .unwrap();

    let local = resolve_query_date("2030-01-07", Some("-180")).unwrap();
    let local_slots = service.list_free_slots(PROVIDER, &short, &local).await.unwrap();
    assert_eq!(local_slots.first().map(String::as_str), Some("09:30"));

    let utc = resolve_query_date("2030-01-07", None).unwrap();
    let utc_slots = service.list_free_slots(PROVIDER, &short, &utc).await.unwrap();
    assert_eq!(utc_slots.len(), 6);
}

#[tokio::test]
async fn test_split_shift_lists_ranges_in_order() {
    let (store, short, _) = create_seeded_store().await;
    let service = create_booking_service(store);
    let friday = resolve_query_date("2030-01-11", None).unwrap();
    let slots = service.list_free_slots(PROVIDER, &short, &friday).await.unwrap();
    assert_eq!(
        slots,
        vec!["08:00", "08:30", "09:00", "09:30", "14:00", "14:30", "15:00", "15:30"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_clients_race_for_one_slot() {
    let (store, short, _) = create_seeded_store().await;
    let service = create_booking_service(store);

    let first = {
        let service = service.clone();
        let short = short.clone();
        tokio::spawn(async move { service.validate_and_book(request(&short, 11, 30, 0)).await })
    };
    let second = {
        let service = service.clone();
        let short = short.clone();
        tokio::spawn(async move { service.validate_and_book(request(&short, 11, 30, 0)).await })
    };
    let (a, b) = (first.await.unwrap(), second.await.unwrap());

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(BookingError::SlotConflict))));
}
