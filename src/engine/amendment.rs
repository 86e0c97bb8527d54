use super::{EngineError, EngineResult};
use crate::calendar::DeliveryCalendar;
use crate::event::return_date_after;
use crate::weekend::WeekendRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentReceipt {
    pub delivery_id: String,
    pub requested_return_days: u32,
    pub effective_return_days: u32,
    /// `None` when the stored lead time pointed past the calendar range.
    pub previous_return_date: Option<NaiveDate>,
    pub return_date: NaiveDate,
}

impl fmt::Display for AmendmentReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Return lead time for delivery {} set to {} days (effective: {} days).",
            self.delivery_id, self.requested_return_days, self.effective_return_days
        )
    }
}

/// Changes a delivery's return lead time and moves its return event.
///
/// The pool is never involved: the same unit stays committed to the same
/// delivery, only its return date moves.
pub fn amend(
    calendar: &mut DeliveryCalendar,
    rule: &WeekendRule,
    delivery_id: &str,
    new_requested_return_days: u32,
) -> EngineResult<AmendmentReceipt> {
    if new_requested_return_days == 0 {
        return Err(EngineError::InvalidReturnDays { days: 0 });
    }
    let Some((_, delivery)) = calendar.find_delivery(delivery_id) else {
        warn!(delivery_id, "amendment refused: delivery not found");
        return Err(EngineError::NotFound {
            delivery_id: delivery_id.to_string(),
        });
    };
    let ship_date = delivery.ship_date;
    let previous_return_date = delivery.return_date();
    let effective_return_days = rule.effective_return_days(ship_date, new_requested_return_days);
    let Some(return_date) = return_date_after(ship_date, effective_return_days) else {
        warn!(
            delivery_id,
            days = effective_return_days,
            "amendment refused: return date out of range"
        );
        return Err(EngineError::ReturnDateOutOfRange {
            ship_date,
            days: effective_return_days,
        });
    };

    let removed = previous_return_date.map_or(0, |date| {
        calendar.remove_on(date, |event| event.is_return_for(delivery_id))
    });
    if removed == 0 {
        let elsewhere = calendar.remove_everywhere(|event| event.is_return_for(delivery_id));
        warn!(
            delivery_id,
            expected = ?previous_return_date,
            found = elsewhere.len(),
            "return was not on its expected date"
        );
    }

    let Some(delivery) = calendar.find_delivery_mut(delivery_id) else {
        return Err(EngineError::NotFound {
            delivery_id: delivery_id.to_string(),
        });
    };
    delivery.requested_return_days = new_requested_return_days;
    delivery.effective_return_days = Some(effective_return_days);
    let return_event = delivery.to_return_event();
    calendar.push(return_date, return_event);

    info!(
        delivery_id,
        requested = new_requested_return_days,
        effective = effective_return_days,
        %return_date,
        "return lead time amended"
    );
    Ok(AmendmentReceipt {
        delivery_id: delivery_id.to_string(),
        requested_return_days: new_requested_return_days,
        effective_return_days,
        previous_return_date,
        return_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BookingRequest, book};
    use crate::event::DeliveryEvent;
    use crate::pool::UnitPool;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn booked(ship_date: NaiveDate, days: u32) -> (UnitPool, DeliveryCalendar, String) {
        let mut pool: UnitPool = [("Torton", 2)].into_iter().collect();
        let mut calendar = DeliveryCalendar::new();
        let receipt = book(
            &mut pool,
            &mut calendar,
            &WeekendRule::default(),
            &BookingRequest::new("Acme", "Torton", ship_date, days),
        )
        .unwrap();
        (pool, calendar, receipt.delivery_id)
    }

    #[test]
    fn moves_return_and_reapplies_weekend_rule() {
        // Saturday shipment, 5 days requested
        let (_, mut calendar, id) = booked(d(2024, 5, 4), 5);
        assert_eq!(calendar.events_on(d(2024, 5, 9)).len(), 1);

        let receipt = amend(&mut calendar, &WeekendRule::default(), &id, 2).unwrap();
        assert_eq!(receipt.previous_return_date, Some(d(2024, 5, 9)));
        assert_eq!(receipt.effective_return_days, 3);
        assert_eq!(receipt.return_date, d(2024, 5, 7));
        assert!(calendar.dates().all(|date| date != d(2024, 5, 9)));

        let (_, delivery) = calendar.find_delivery(&id).unwrap();
        assert_eq!(delivery.requested_return_days, 2);
        assert_eq!(delivery.effective_return_days, Some(3));
        assert_eq!(
            calendar.returns().filter(|(_, ret)| ret.is_linked_to(&id)).count(),
            1
        );
        assert!(receipt.to_string().contains("2 days (effective: 3 days)"));
    }

    #[test]
    fn never_changes_the_pool() {
        let (pool, mut calendar, id) = booked(d(2024, 5, 6), 3);
        let pool_before = pool.clone();
        for days in [1, 7, 2, 30, 3] {
            amend(&mut calendar, &WeekendRule::default(), &id, days).unwrap();
        }
        assert_eq!(pool, pool_before);
        let (_, ret) = calendar.returns().next().unwrap();
        assert!(ret.is_linked_to(&id));
        assert_eq!(calendar.event_count(), 2);
    }

    #[test]
    fn legacy_record_uses_requested_days_to_find_old_return() {
        let mut calendar = DeliveryCalendar::new();
        let legacy = DeliveryEvent {
            id: "Old-Torton-1".into(),
            client: "Old".into(),
            unit_type: "Torton".into(),
            requested_return_days: 4,
            effective_return_days: None,
            ship_date: d(2024, 5, 6),
        };
        calendar.push(legacy.ship_date, legacy.clone());
        calendar.push(d(2024, 5, 10), legacy.to_return_event());

        let receipt = amend(&mut calendar, &WeekendRule::default(), "Old-Torton-1", 1).unwrap();
        assert_eq!(receipt.previous_return_date, Some(d(2024, 5, 10)));
        assert!(calendar.events_on(d(2024, 5, 10)).is_empty());
        assert_eq!(calendar.events_on(d(2024, 5, 7)).len(), 1);
    }

    #[test]
    fn missing_delivery_or_zero_days_is_refused() {
        let (_, mut calendar, id) = booked(d(2024, 5, 6), 3);
        let before = calendar.clone();
        assert!(matches!(
            amend(&mut calendar, &WeekendRule::default(), "nope", 2),
            Err(EngineError::NotFound { .. })
        ));
        assert_eq!(
            amend(&mut calendar, &WeekendRule::default(), &id, 0),
            Err(EngineError::InvalidReturnDays { days: 0 })
        );
        assert_eq!(calendar, before);
    }

    #[test]
    fn return_past_calendar_range_is_refused_without_moving_anything() {
        let (_, mut calendar, id) = booked(d(2024, 5, 6), 3);
        let before = calendar.clone();

        let err = amend(&mut calendar, &WeekendRule::default(), &id, u32::MAX).unwrap_err();

        assert_eq!(
            err,
            EngineError::ReturnDateOutOfRange {
                ship_date: d(2024, 5, 6),
                days: u32::MAX
            }
        );
        assert_eq!(calendar, before);
    }
}
