use crate::calculations::{AvailabilityReport, project, project_range};
use crate::calendar::{DaySummary, DeliveryCalendar};
use crate::engine::{
    self, AmendmentReceipt, BookingReceipt, BookingRequest, CancellationReceipt, EngineResult,
};
use crate::migrate::{self, IntegrityIssue, RelinkSummary};
use crate::pool::UnitPool;
use crate::weekend::WeekendRule;
use chrono::NaiveDate;

/// The unit pool and delivery calendar loaded for one interaction.
///
/// Presentation layers hold a `Ledger`, call its mutators, and hand it back
/// to a [`LedgerStore`](crate::persistence::LedgerStore) afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub pool: UnitPool,
    pub calendar: DeliveryCalendar,
    pub rule: WeekendRule,
}

impl Ledger {
    pub fn new(pool: UnitPool, calendar: DeliveryCalendar) -> Self {
        Self {
            pool,
            calendar,
            rule: WeekendRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: WeekendRule) -> Self {
        self.rule = rule;
        self
    }

    /// Four zeroed unit types and empty buckets for the week starting `today`.
    pub fn reset(today: NaiveDate) -> Self {
        Self::new(
            UnitPool::default_fleet(),
            DeliveryCalendar::with_empty_days(today, 7),
        )
    }

    pub fn book(&mut self, request: &BookingRequest) -> EngineResult<BookingReceipt> {
        engine::book(&mut self.pool, &mut self.calendar, &self.rule, request)
    }

    pub fn cancel(&mut self, delivery_id: &str) -> EngineResult<CancellationReceipt> {
        engine::cancel(&mut self.calendar, &mut self.pool, delivery_id)
    }

    pub fn amend(
        &mut self,
        delivery_id: &str,
        new_requested_return_days: u32,
    ) -> EngineResult<AmendmentReceipt> {
        engine::amend(
            &mut self.calendar,
            &self.rule,
            delivery_id,
            new_requested_return_days,
        )
    }

    pub fn set_unit_count(&mut self, unit_type: impl Into<String>, count: u32) {
        self.pool.set_count(unit_type, count);
    }

    pub fn availability(&self, as_of: NaiveDate) -> AvailabilityReport {
        project(&self.calendar, &self.pool, as_of)
    }

    /// Today's report and the reports for the following `days - 1` days.
    pub fn outlook(&self, today: NaiveDate, days: u32) -> Vec<AvailabilityReport> {
        project_range(&self.calendar, &self.pool, today, days)
    }

    pub fn day_summaries(&self) -> Vec<DaySummary> {
        self.calendar.day_summaries()
    }

    pub fn check_integrity(&self) -> Vec<IntegrityIssue> {
        migrate::check_integrity(&self.calendar, &self.pool)
    }

    pub fn relink_returns(&mut self) -> RelinkSummary {
        migrate::relink_returns(&mut self.calendar)
    }

    /// Dates in the inclusive range that have at least one event.
    pub fn busy_days(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = from;
        while current <= to {
            if !self.calendar.events_on(current).is_empty() {
                days.push(current);
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }
}
