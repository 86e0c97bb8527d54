use crate::event::{CalendarEvent, DeliveryEvent, ReturnEvent};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Delivery and return events bucketed by calendar date.
///
/// On disk this is a JSON object keyed by `YYYY-MM-DD`. A date that is absent
/// and a date whose bucket is empty both mean "nothing happens that day".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryCalendar {
    days: BTreeMap<NaiveDate, Vec<CalendarEvent>>,
}

/// Counts shown for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub deliveries: usize,
    pub returns: usize,
}

impl DaySummary {
    pub fn caption(&self) -> String {
        format!(
            "{} entrega(s), {} retorno(s)",
            self.deliveries, self.returns
        )
    }
}

impl DeliveryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar holding `count` consecutive empty buckets starting at `start`.
    pub fn with_empty_days(start: NaiveDate, count: u32) -> Self {
        let days = (0..count)
            .map_while(|offset| start.checked_add_days(Days::new(u64::from(offset))))
            .map(|date| (date, Vec::new()))
            .collect();
        Self { days }
    }

    pub fn events_on(&self, date: NaiveDate) -> &[CalendarEvent] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, date: NaiveDate, event: impl Into<CalendarEvent>) {
        self.days.entry(date).or_default().push(event.into());
    }

    /// Every stored date, including ones with an empty bucket.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[CalendarEvent])> {
        self.days
            .iter()
            .map(|(date, events)| (*date, events.as_slice()))
    }

    pub fn events(&self) -> impl Iterator<Item = (NaiveDate, &CalendarEvent)> {
        self.days
            .iter()
            .flat_map(|(date, events)| events.iter().map(move |event| (*date, event)))
    }

    pub(crate) fn events_mut(&mut self) -> impl Iterator<Item = (NaiveDate, &mut CalendarEvent)> {
        self.days
            .iter_mut()
            .flat_map(|(date, events)| events.iter_mut().map(move |event| (*date, event)))
    }

    pub fn deliveries(&self) -> impl Iterator<Item = (NaiveDate, &DeliveryEvent)> {
        self.events()
            .filter_map(|(date, event)| event.as_delivery().map(|delivery| (date, delivery)))
    }

    pub fn returns(&self) -> impl Iterator<Item = (NaiveDate, &ReturnEvent)> {
        self.events()
            .filter_map(|(date, event)| event.as_return().map(|ret| (date, ret)))
    }

    /// Finds a delivery by id wherever it is filed.
    pub fn find_delivery(&self, delivery_id: &str) -> Option<(NaiveDate, &DeliveryEvent)> {
        self.deliveries()
            .find(|(_, delivery)| delivery.id == delivery_id)
    }

    pub(crate) fn find_delivery_mut(&mut self, delivery_id: &str) -> Option<&mut DeliveryEvent> {
        self.days
            .values_mut()
            .flat_map(|events| events.iter_mut())
            .find_map(|event| match event {
                CalendarEvent::Delivery(delivery) if delivery.id == delivery_id => Some(delivery),
                _ => None,
            })
    }

    pub fn contains_delivery(&self, delivery_id: &str) -> bool {
        self.find_delivery(delivery_id).is_some()
    }

    /// Removes matching events from one date. A bucket emptied by the removal
    /// is dropped; returns how many events were removed.
    pub(crate) fn remove_on<F>(&mut self, date: NaiveDate, mut predicate: F) -> usize
    where
        F: FnMut(&CalendarEvent) -> bool,
    {
        let Some(events) = self.days.get_mut(&date) else {
            return 0;
        };
        let before = events.len();
        events.retain(|event| !predicate(event));
        let removed = before - events.len();
        if removed > 0 && events.is_empty() {
            self.days.remove(&date);
        }
        removed
    }

    /// Removes matching events from every date, dropping buckets the removal
    /// emptied. Removed events are returned with the date they were filed on.
    ///
    /// Buckets that were already empty, such as the week written by a reset,
    /// are kept; use [`prune_empty`](Self::prune_empty) to drop those too.
    pub(crate) fn remove_everywhere<F>(&mut self, mut predicate: F) -> Vec<(NaiveDate, CalendarEvent)>
    where
        F: FnMut(&CalendarEvent) -> bool,
    {
        let mut removed = Vec::new();
        let mut emptied = Vec::new();
        for (date, events) in self.days.iter_mut() {
            let before = events.len();
            let mut kept = Vec::with_capacity(before);
            for event in events.drain(..) {
                if predicate(&event) {
                    removed.push((*date, event));
                } else {
                    kept.push(event);
                }
            }
            *events = kept;
            if before > 0 && events.is_empty() {
                emptied.push(*date);
            }
        }
        for date in emptied {
            self.days.remove(&date);
        }
        removed
    }

    /// Drops every empty bucket.
    pub fn prune_empty(&mut self) {
        self.days.retain(|_, events| !events.is_empty());
    }

    /// True when no event is stored on any date.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    /// Per-day delivery and return counts in date order, skipping empty days.
    pub fn day_summaries(&self) -> Vec<DaySummary> {
        self.iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(date, events)| {
                let deliveries = events
                    .iter()
                    .filter(|event| event.as_delivery().is_some())
                    .count();
                DaySummary {
                    date,
                    deliveries,
                    returns: events.len() - deliveries,
                }
            })
            .collect()
    }
}

impl FromIterator<(NaiveDate, Vec<CalendarEvent>)> for DeliveryCalendar {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Vec<CalendarEvent>)>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for (date, events) in iter {
            calendar.days.entry(date).or_default().extend(events);
        }
        calendar
    }
}
