use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Shifts short-turnaround returns off the non-operating day.
///
/// A booking shipped on `shift_weekday` whose requested lead time is at most
/// `threshold_days` gets `extra_days` added, so that with the defaults a
/// Saturday shipment never comes back on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendRule {
    pub threshold_days: u32,
    pub shift_weekday: Weekday,
    pub extra_days: u32,
}

impl Default for WeekendRule {
    fn default() -> Self {
        Self {
            threshold_days: 2,
            shift_weekday: Weekday::Sat,
            extra_days: 1,
        }
    }
}

impl WeekendRule {
    pub fn with_threshold(threshold_days: u32) -> Self {
        Self {
            threshold_days,
            ..Self::default()
        }
    }

    pub fn applies(&self, ship_date: NaiveDate, requested_return_days: u32) -> bool {
        requested_return_days <= self.threshold_days && ship_date.weekday() == self.shift_weekday
    }

    /// Lead time after the adjustment.
    pub fn effective_return_days(&self, ship_date: NaiveDate, requested_return_days: u32) -> u32 {
        if self.applies(ship_date, requested_return_days) {
            requested_return_days.saturating_add(self.extra_days)
        } else {
            requested_return_days
        }
    }
}
