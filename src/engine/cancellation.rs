use super::{EngineError, EngineResult};
use crate::calendar::DeliveryCalendar;
use crate::event::CalendarEvent;
use crate::pool::UnitPool;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub delivery_id: String,
    pub unit_type: String,
    pub removed_returns: usize,
    pub available_units: u32,
}

impl fmt::Display for CancellationReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Delivery {} and its return removed. Unit '{}' is available again.",
            self.delivery_id, self.unit_type
        )
    }
}

/// Removes a delivery and its return from wherever they are filed and puts
/// the unit back into the pool.
///
/// Fails with `NotFound` before touching anything when the delivery is absent.
pub fn cancel(
    calendar: &mut DeliveryCalendar,
    pool: &mut UnitPool,
    delivery_id: &str,
) -> EngineResult<CancellationReceipt> {
    if !calendar.contains_delivery(delivery_id) {
        warn!(delivery_id, "cancellation refused: delivery not found");
        return Err(EngineError::NotFound {
            delivery_id: delivery_id.to_string(),
        });
    }

    let removed = calendar.remove_everywhere(|event| {
        event.is_delivery_with_id(delivery_id) || event.is_return_for(delivery_id)
    });

    let mut unit_type = String::new();
    let mut removed_returns = 0;
    let mut available_units = 0;
    for (_, event) in &removed {
        match event {
            CalendarEvent::Delivery(delivery) => {
                available_units = pool.restore_one(&delivery.unit_type);
                unit_type.clone_from(&delivery.unit_type);
            }
            CalendarEvent::Return(_) => removed_returns += 1,
        }
    }
    if removed_returns != 1 {
        warn!(
            delivery_id,
            removed_returns, "delivery did not have exactly one return"
        );
    }

    info!(delivery_id, %unit_type, available_units, "delivery cancelled");
    Ok(CancellationReceipt {
        delivery_id: delivery_id.to_string(),
        unit_type,
        removed_returns,
        available_units,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BookingRequest, book};
    use crate::weekend::WeekendRule;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cancel_restores_pool_and_clears_both_events() {
        let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
        let mut calendar = DeliveryCalendar::new();
        let receipt = book(
            &mut pool,
            &mut calendar,
            &WeekendRule::default(),
            &BookingRequest::new("Acme", "Torton", d(2024, 5, 4), 2),
        )
        .unwrap();

        let cancelled = cancel(&mut calendar, &mut pool, &receipt.delivery_id).unwrap();
        assert_eq!(cancelled.unit_type, "Torton");
        assert_eq!(cancelled.removed_returns, 1);
        assert_eq!(cancelled.available_units, 1);
        assert_eq!(pool.available("Torton"), Some(1));
        assert!(calendar.is_empty());
        assert_eq!(calendar.dates().count(), 0);
    }

    #[test]
    fn unknown_id_changes_nothing() {
        let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
        let mut calendar = DeliveryCalendar::new();
        book(
            &mut pool,
            &mut calendar,
            &WeekendRule::default(),
            &BookingRequest::new("Acme", "Torton", d(2024, 5, 6), 4),
        )
        .unwrap();
        let pool_before = pool.clone();
        let calendar_before = calendar.clone();

        let err = cancel(&mut calendar, &mut pool, "missing").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(pool, pool_before);
        assert_eq!(calendar, calendar_before);
    }

    #[test]
    fn finds_return_that_was_moved_by_hand() {
        let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
        let mut calendar = DeliveryCalendar::new();
        let receipt = book(
            &mut pool,
            &mut calendar,
            &WeekendRule::default(),
            &BookingRequest::new("Acme", "Torton", d(2024, 5, 6), 4),
        )
        .unwrap();
        let moved = calendar.remove_on(receipt.return_date, |event| {
            event.is_return_for(&receipt.delivery_id)
        });
        assert_eq!(moved, 1);
        let (_, delivery) = calendar.find_delivery(&receipt.delivery_id).unwrap();
        let ret = delivery.to_return_event();
        calendar.push(d(2024, 6, 1), ret);

        cancel(&mut calendar, &mut pool, &receipt.delivery_id).unwrap();
        assert!(calendar.is_empty());
    }
}
