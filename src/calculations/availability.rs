use crate::calendar::DeliveryCalendar;
use crate::event::CalendarEvent;
use crate::pool::UnitPool;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Movement and net availability of one unit type on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub in_transit: u32,
    pub loaded: u32,
    pub returned: u32,
    pub net_available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAvailability {
    pub unit_type: String,
    /// Idle count currently stored in the pool.
    pub pool_count: u32,
    pub today: DayAvailability,
    pub tomorrow: DayAvailability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub as_of: NaiveDate,
    pub units: Vec<UnitAvailability>,
}

impl AvailabilityReport {
    pub fn unit(&self, unit_type: &str) -> Option<&UnitAvailability> {
        self.units.iter().find(|unit| unit.unit_type == unit_type)
    }
}

#[derive(Default)]
struct Tally {
    today: DayAvailability,
    tomorrow: DayAvailability,
}

/// Availability per unit type as of `as_of`, with a one-day-ahead forecast.
///
/// Scans every event because a delivery counts as in transit for its whole
/// span, not only on the days it has an event filed:
///
/// * `today.net_available = pool - in_transit + returned - loaded`
/// * `tomorrow.net_available = today.net_available + returned - loaded`
///   using tomorrow's movements; `tomorrow.in_transit` is informational.
///
/// Unit types that only appear in the calendar are reported with a pool
/// count of zero.
pub fn project(
    calendar: &DeliveryCalendar,
    pool: &UnitPool,
    as_of: NaiveDate,
) -> AvailabilityReport {
    let tomorrow = as_of.succ_opt();
    let mut tallies: BTreeMap<&str, Tally> = pool
        .unit_types()
        .map(|unit_type| (unit_type, Tally::default()))
        .collect();

    for (date, event) in calendar.events() {
        let tally = tallies.entry(event.unit_type()).or_default();
        match event {
            CalendarEvent::Delivery(delivery) => {
                if delivery.is_out_on(as_of) {
                    tally.today.in_transit += 1;
                }
                if tomorrow.is_some_and(|day| delivery.is_out_on(day)) {
                    tally.tomorrow.in_transit += 1;
                }
                if date == as_of {
                    tally.today.loaded += 1;
                } else if Some(date) == tomorrow {
                    tally.tomorrow.loaded += 1;
                }
            }
            CalendarEvent::Return(_) => {
                if date == as_of {
                    tally.today.returned += 1;
                } else if Some(date) == tomorrow {
                    tally.tomorrow.returned += 1;
                }
            }
        }
    }

    let units = tallies
        .into_iter()
        .map(|(unit_type, mut tally)| {
            let pool_count = pool.available(unit_type).unwrap_or(0);
            tally.today.net_available = i64::from(pool_count)
                - i64::from(tally.today.in_transit)
                + i64::from(tally.today.returned)
                - i64::from(tally.today.loaded);
            tally.tomorrow.net_available = tally.today.net_available
                + i64::from(tally.tomorrow.returned)
                - i64::from(tally.tomorrow.loaded);
            UnitAvailability {
                unit_type: unit_type.to_string(),
                pool_count,
                today: tally.today,
                tomorrow: tally.tomorrow,
            }
        })
        .collect::<Vec<_>>();

    debug!(%as_of, unit_types = units.len(), "availability projected");
    AvailabilityReport { as_of, units }
}

/// One report per day for `days` consecutive days starting at `start`,
/// stopping early at the end of the calendar range.
pub fn project_range(
    calendar: &DeliveryCalendar,
    pool: &UnitPool,
    start: NaiveDate,
    days: u32,
) -> Vec<AvailabilityReport> {
    (0..days)
        .map_while(|offset| start.checked_add_days(Days::new(u64::from(offset))))
        .map(|day| project(calendar, pool, day))
        .collect()
}
