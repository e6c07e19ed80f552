#[cfg(test)]
mod tests {
    use crate::models::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
    use serde_json::json;

    #[test]
    fn test_day_key_table_starts_on_sunday() {
        assert_eq!(day_key(Weekday::Sun), "sun");
        assert_eq!(day_key(Weekday::Mon), "mon");
        assert_eq!(day_key(Weekday::Sat), "sat");
        assert_eq!(DAY_KEYS.len(), 7);
    }

    #[test]
    fn test_schedule_deserializes_with_missing_fields() {
        let schedule: WeeklySchedule = serde_json::from_value(json!({
            "provider_id": "prov-1",
            "days": {
                "mon": { "enabled": true, "ranges": [{ "start": "09:00", "end": "12:00" }] },
                "tue": { "ranges": [] }
            }
        }))
        .expect("schedule should parse");

        assert_eq!(schedule.schedule_type, ScheduleType::Global);
        assert!(schedule.days["mon"].enabled);
        assert!(!schedule.days["tue"].enabled);
        assert_eq!(schedule.days["mon"].ranges[0], TimeRange::new("09:00", "12:00"));
    }

    #[test]
    fn test_schedule_type_round_trips_through_str() {
        assert_eq!("custom".parse::<ScheduleType>(), Ok(ScheduleType::Custom));
        assert_eq!(" Global ".parse::<ScheduleType>(), Ok(ScheduleType::Global));
        assert!("weekly".parse::<ScheduleType>().is_err());
        assert_eq!(ScheduleType::Custom.to_string(), "custom");
    }

    #[test]
    fn test_validity_window_is_inclusive() {
        let mut schedule = WeeklySchedule::empty("prov-1", ScheduleType::Global);
        schedule.valid_from = Some(Utc.with_ymd_and_hms(2030, 1, 7, 0, 0, 0).unwrap());
        schedule.valid_to = Some(Utc.with_ymd_and_hms(2030, 1, 13, 23, 0, 0).unwrap());

        assert!(!schedule.covers(NaiveDate::from_ymd_opt(2030, 1, 6).unwrap()));
        assert!(schedule.covers(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()));
        assert!(schedule.covers(NaiveDate::from_ymd_opt(2030, 1, 13).unwrap()));
        assert!(!schedule.covers(NaiveDate::from_ymd_opt(2030, 1, 14).unwrap()));
    }

    #[test]
    fn test_service_slot_duration_defaults_to_thirty() {
        assert_eq!(Service::new("p", "Cut", 45).slot_duration(), Duration::minutes(45));
        assert_eq!(Service::new("p", "Cut", 0).slot_duration(), Duration::minutes(30));
        assert_eq!(Service::new("p", "Cut", -5).slot_duration(), Duration::minutes(30));
    }

    #[test]
    fn test_durations_are_capped_at_one_day() {
        assert_eq!(
            Service::new("p", "Marathon", i64::MAX).slot_duration(),
            Duration::minutes(MAX_DURATION_MINUTES)
        );
        assert_eq!(capped_minutes(-10), Duration::zero());

        let start = Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap();
        let mut appointment = Appointment::new("prov-1", "svc-1", start);
        appointment.duration_minutes = i64::MAX;
        assert_eq!(appointment.busy_until(), start + Duration::days(1));
    }

    #[test]
    fn test_cancel_makes_appointment_inactive() {
        let start = Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap();
        let mut appointment = Appointment::new("prov-1", "svc-1", start);
        assert!(appointment.is_active());
        assert_eq!(appointment.busy_until(), start + Duration::minutes(60));

        appointment.cancel(start);
        assert!(!appointment.is_active());
        assert_eq!(appointment.status, STATUS_CANCELLED);
        assert_eq!(appointment.deleted_at, Some(start));
    }

    #[test]
    fn test_opaque_notes_pass_through() {
        let start = Utc.with_ymd_and_hms(2030, 1, 7, 9, 0, 0).unwrap();
        let mut appointment = Appointment::new("prov-1", "svc-1", start);
        appointment.notes = Some(json!({ "allergies": ["latex"], "floor": 3 }));

        let encoded = serde_json::to_value(&appointment).unwrap();
        let decoded: Appointment = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.notes, appointment.notes);
    }
}
