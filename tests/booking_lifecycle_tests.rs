use chrono::{NaiveDate, NaiveDateTime};
use fleet_calendar::{
    BookingRequest, CalendarEvent, DeliveryCalendar, EngineError, UnitPool, WeekendRule, amend,
    book_at, cancel, check_integrity, project,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(secs: u32) -> NaiveDateTime {
    d(2024, 5, 1).and_hms_opt(9, 0, secs).unwrap()
}

fn outstanding(calendar: &DeliveryCalendar, unit_type: &str) -> u32 {
    calendar
        .deliveries()
        .filter(|(_, delivery)| delivery.unit_type == unit_type)
        .count() as u32
}

#[test]
fn saturday_booking_then_cancel_restores_everything() {
    let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();

    let receipt = book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Plastisaro", "Torton", d(2024, 5, 4), 2),
        at(0),
    )
    .unwrap();
    assert_eq!(receipt.effective_return_days, 3);
    assert_eq!(receipt.return_date, d(2024, 5, 7));
    assert_eq!(pool.available("Torton"), Some(0));

    let on_ship = calendar.events_on(d(2024, 5, 4));
    assert_eq!(on_ship.len(), 1);
    assert!(matches!(&on_ship[0], CalendarEvent::Delivery(delivery) if delivery.id == receipt.delivery_id));
    let on_return = calendar.events_on(d(2024, 5, 7));
    assert_eq!(on_return.len(), 1);
    let ret = on_return[0].as_return().unwrap();
    assert!(ret.is_linked_to(&receipt.delivery_id));
    assert_eq!(ret.associated_client.as_deref(), Some("Plastisaro"));

    let err = book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Other", "Torton", d(2024, 5, 4), 1),
        at(1),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::PoolExhausted { .. }));
    assert_eq!(calendar.event_count(), 2);

    let cancelled = cancel(&mut calendar, &mut pool, &receipt.delivery_id).unwrap();
    assert_eq!(cancelled.removed_returns, 1);
    assert_eq!(pool.available("Torton"), Some(1));
    assert!(calendar.is_empty());
}

#[test]
fn pool_plus_outstanding_deliveries_is_conserved() {
    let mut pool: UnitPool = [("Torton", 3), ("Tráiler 53", 2)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();
    let total = |pool: &UnitPool, calendar: &DeliveryCalendar, unit: &str| {
        pool.available(unit).unwrap() + outstanding(calendar, unit)
    };

    let mut ids = Vec::new();
    for (i, (client, unit, day, days)) in [
        ("Acme", "Torton", 3, 2),
        ("Acme", "Torton", 4, 1),
        ("Beta", "Tráiler 53", 4, 7),
        ("Gamma", "Torton", 6, 4),
    ]
    .into_iter()
    .enumerate()
    {
        let receipt = book_at(
            &mut pool,
            &mut calendar,
            &rule,
            &BookingRequest::new(client, unit, d(2024, 5, day), days),
            at(i as u32),
        )
        .unwrap();
        ids.push(receipt.delivery_id);
        assert_eq!(total(&pool, &calendar, "Torton"), 3);
        assert_eq!(total(&pool, &calendar, "Tráiler 53"), 2);
    }

    let err = book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Delta", "Torton", d(2024, 5, 8), 1),
        at(10),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::PoolExhausted { .. }));

    amend(&mut calendar, &rule, &ids[0], 9).unwrap();
    assert_eq!(total(&pool, &calendar, "Torton"), 3);

    cancel(&mut calendar, &mut pool, &ids[1]).unwrap();
    cancel(&mut calendar, &mut pool, &ids[2]).unwrap();
    assert_eq!(total(&pool, &calendar, "Torton"), 3);
    assert_eq!(total(&pool, &calendar, "Tráiler 53"), 2);
    assert_eq!(pool.available("Tráiler 53"), Some(2));
    assert!(check_integrity(&calendar, &pool).is_empty());
}

#[test]
fn amend_moves_return_without_touching_pool() {
    let mut pool: UnitPool = [("Torton", 2)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();
    let receipt = book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Acme", "Torton", d(2024, 5, 4), 2),
        at(0),
    )
    .unwrap();

    let amended = amend(&mut calendar, &rule, &receipt.delivery_id, 5).unwrap();
    assert_eq!(amended.previous_return_date, Some(d(2024, 5, 7)));
    assert_eq!(amended.effective_return_days, 5);
    assert_eq!(amended.return_date, d(2024, 5, 9));
    assert_eq!(pool.available("Torton"), Some(1));

    assert!(calendar.events_on(d(2024, 5, 7)).is_empty());
    assert_eq!(calendar.returns().count(), 1);
    let (_, delivery) = calendar.find_delivery(&receipt.delivery_id).unwrap();
    assert_eq!(delivery.requested_return_days, 5);
    assert_eq!(delivery.return_date(), Some(d(2024, 5, 9)));

    // Back under the threshold on a Saturday ship date: the extra day returns.
    let amended = amend(&mut calendar, &rule, &receipt.delivery_id, 1).unwrap();
    assert_eq!(amended.effective_return_days, 2);
    assert_eq!(amended.return_date, d(2024, 5, 6));
    assert!(check_integrity(&calendar, &pool).is_empty());
}

#[test]
fn unknown_ids_and_units_leave_state_untouched() {
    let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();
    let before = (pool.clone(), calendar.clone());

    assert!(matches!(
        book_at(
            &mut pool,
            &mut calendar,
            &rule,
            &BookingRequest::new("Acme", "Camioneta", d(2024, 5, 4), 2),
            at(0),
        ),
        Err(EngineError::UnknownUnit { .. })
    ));
    assert!(matches!(
        cancel(&mut calendar, &mut pool, "nope"),
        Err(EngineError::NotFound { .. })
    ));
    assert!(matches!(
        amend(&mut calendar, &rule, "nope", 3),
        Err(EngineError::NotFound { .. })
    ));
    assert_eq!((pool, calendar), before);
}

#[test]
fn same_second_bookings_get_distinct_ids() {
    let mut pool: UnitPool = [("Torton", 2)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();
    let request = BookingRequest::new("Acme", "Torton", d(2024, 5, 2), 1);

    let first = book_at(&mut pool, &mut calendar, &rule, &request, at(0)).unwrap();
    let second = book_at(&mut pool, &mut calendar, &rule, &request, at(0)).unwrap();
    assert_ne!(first.delivery_id, second.delivery_id);

    cancel(&mut calendar, &mut pool, &first.delivery_id).unwrap();
    assert!(calendar.contains_delivery(&second.delivery_id));
    assert_eq!(calendar.returns().count(), 1);
    assert_eq!(pool.available("Torton"), Some(1));
}

#[test]
fn projection_tracks_bookings_over_time() {
    let mut pool: UnitPool = [("Torton", 2)].into_iter().collect();
    let mut calendar = DeliveryCalendar::new();
    let rule = WeekendRule::default();
    book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Acme", "Torton", d(2024, 5, 1), 5),
        at(0),
    )
    .unwrap();
    book_at(
        &mut pool,
        &mut calendar,
        &rule,
        &BookingRequest::new("Beta", "Torton", d(2024, 5, 2), 1),
        at(1),
    )
    .unwrap();

    let report = project(&calendar, &pool, d(2024, 5, 2));
    let torton = report.unit("Torton").unwrap();
    assert_eq!(torton.pool_count, 0);
    assert_eq!(torton.today.in_transit, 2);
    assert_eq!(torton.today.loaded, 1);
    assert_eq!(torton.today.returned, 0);
    assert_eq!(torton.today.net_available, -3);
    assert_eq!(torton.tomorrow.in_transit, 1);
    assert_eq!(torton.tomorrow.returned, 1);
    assert_eq!(torton.tomorrow.net_available, -2);

    // Projection is read-only.
    assert_eq!(pool.available("Torton"), Some(0));
    assert_eq!(calendar.event_count(), 4);
}
