use super::{EngineError, EngineResult};
use crate::calendar::DeliveryCalendar;
use crate::event::{DeliveryEvent, return_date_after};
use crate::pool::UnitPool;
use crate::weekend::WeekendRule;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// One order to be placed on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client: String,
    pub unit_type: String,
    pub ship_date: NaiveDate,
    pub requested_return_days: u32,
}

impl BookingRequest {
    pub fn new(
        client: impl Into<String>,
        unit_type: impl Into<String>,
        ship_date: NaiveDate,
        requested_return_days: u32,
    ) -> Self {
        Self {
            client: client.into(),
            unit_type: unit_type.into(),
            ship_date,
            requested_return_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub delivery_id: String,
    pub client: String,
    pub unit_type: String,
    pub ship_date: NaiveDate,
    pub return_date: NaiveDate,
    pub requested_return_days: u32,
    pub effective_return_days: u32,
    pub remaining_units: u32,
}

impl fmt::Display for BookingReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Booked {} for {} with unit {}. Return in {} days.",
            self.delivery_id, self.client, self.unit_type, self.effective_return_days
        )
    }
}

/// Books a delivery stamped with the current local time.
pub fn book(
    pool: &mut UnitPool,
    calendar: &mut DeliveryCalendar,
    rule: &WeekendRule,
    request: &BookingRequest,
) -> EngineResult<BookingReceipt> {
    book_at(pool, calendar, rule, request, Local::now().naive_local())
}

/// Takes one unit from the pool and files the delivery plus its return.
///
/// `booked_at` only feeds the delivery id. On any error neither the pool nor
/// the calendar is touched.
pub fn book_at(
    pool: &mut UnitPool,
    calendar: &mut DeliveryCalendar,
    rule: &WeekendRule,
    request: &BookingRequest,
    booked_at: NaiveDateTime,
) -> EngineResult<BookingReceipt> {
    if !pool.contains(&request.unit_type) {
        warn!(unit_type = %request.unit_type, "booking refused: unknown unit type");
        return Err(EngineError::UnknownUnit {
            unit_type: request.unit_type.clone(),
        });
    }
    if request.requested_return_days == 0 {
        return Err(EngineError::InvalidReturnDays { days: 0 });
    }
    let effective_return_days =
        rule.effective_return_days(request.ship_date, request.requested_return_days);
    let Some(return_date) = return_date_after(request.ship_date, effective_return_days) else {
        warn!(
            ship_date = %request.ship_date,
            days = effective_return_days,
            "booking refused: return date out of range"
        );
        return Err(EngineError::ReturnDateOutOfRange {
            ship_date: request.ship_date,
            days: effective_return_days,
        });
    };
    let Some(remaining_units) = pool.take_one(&request.unit_type) else {
        warn!(
            unit_type = %request.unit_type,
            client = %request.client,
            "booking refused: pool exhausted"
        );
        return Err(EngineError::PoolExhausted {
            unit_type: request.unit_type.clone(),
        });
    };

    let delivery = DeliveryEvent {
        id: next_delivery_id(calendar, &request.client, &request.unit_type, booked_at),
        client: request.client.clone(),
        unit_type: request.unit_type.clone(),
        requested_return_days: request.requested_return_days,
        effective_return_days: Some(effective_return_days),
        ship_date: request.ship_date,
    };
    let receipt = BookingReceipt {
        delivery_id: delivery.id.clone(),
        client: delivery.client.clone(),
        unit_type: delivery.unit_type.clone(),
        ship_date: delivery.ship_date,
        return_date,
        requested_return_days: delivery.requested_return_days,
        effective_return_days: delivery.resolved_return_days(),
        remaining_units,
    };

    let return_event = delivery.to_return_event();
    calendar.push(delivery.ship_date, delivery);
    calendar.push(return_date, return_event);

    info!(
        delivery_id = %receipt.delivery_id,
        unit_type = %receipt.unit_type,
        ship_date = %receipt.ship_date,
        return_date = %receipt.return_date,
        remaining_units,
        "delivery booked"
    );
    Ok(receipt)
}

/// `client-unit-timestamp`, suffixed when the same id is already filed.
fn next_delivery_id(
    calendar: &DeliveryCalendar,
    client: &str,
    unit_type: &str,
    booked_at: NaiveDateTime,
) -> String {
    let base = format!(
        "{client}-{unit_type}-{}",
        booked_at.format("%Y%m%d%H%M%S%6f")
    );
    if !calendar.contains_delivery(&base) {
        return base;
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !calendar.contains_delivery(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
