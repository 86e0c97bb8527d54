//! Repairs and consistency checks for calendars written by older tooling or
//! edited by hand.

use crate::calendar::DeliveryCalendar;
use crate::event::{CalendarEvent, RETURN_ID_PREFIX};
use crate::pool::UnitPool;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{info, warn};

/// Identifies a delivery by what an unlinked return still remembers about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnKey {
    pub unit_type: String,
    pub client: Option<String>,
    pub ship_date: Option<NaiveDate>,
}

impl fmt::Display for ReturnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.unit_type,
            self.client.as_deref().unwrap_or("?"),
            self.ship_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "?".to_string())
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelinkSummary {
    pub relinked: usize,
    pub unmatched: Vec<ReturnKey>,
}

/// Links returns that lack `pedido_id_asociado` to their delivery.
///
/// A delivery matches when unit type, client and ship date all agree. A
/// missing return id is derived from the delivery id at the same time.
pub fn relink_returns(calendar: &mut DeliveryCalendar) -> RelinkSummary {
    let index: HashMap<(String, String, NaiveDate), String> = calendar
        .deliveries()
        .map(|(_, delivery)| {
            (
                (
                    delivery.unit_type.clone(),
                    delivery.client.clone(),
                    delivery.ship_date,
                ),
                delivery.id.clone(),
            )
        })
        .collect();

    let mut summary = RelinkSummary::default();
    for (_, event) in calendar.events_mut() {
        let CalendarEvent::Return(ret) = event else {
            continue;
        };
        if ret.linked_delivery_id.is_some() {
            continue;
        }
        let key = ReturnKey {
            unit_type: ret.unit_type.clone(),
            client: ret.associated_client.clone(),
            ship_date: ret.associated_ship_date,
        };
        let matched = match (&key.client, key.ship_date) {
            (Some(client), Some(ship_date)) => {
                index.get(&(key.unit_type.clone(), client.clone(), ship_date))
            }
            _ => None,
        };
        match matched {
            Some(delivery_id) => {
                ret.linked_delivery_id = Some(delivery_id.clone());
                if ret.id.is_empty() {
                    ret.id = format!("{RETURN_ID_PREFIX}{delivery_id}");
                }
                summary.relinked += 1;
            }
            None => {
                warn!(%key, "could not link return to a delivery");
                summary.unmatched.push(key);
            }
        }
    }
    info!(
        relinked = summary.relinked,
        unmatched = summary.unmatched.len(),
        "return relink finished"
    );
    summary
}

/// A broken invariant found by [`check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IntegrityIssue {
    DuplicateDeliveryId {
        delivery_id: String,
    },
    MissingReturn {
        delivery_id: String,
    },
    DuplicateReturns {
        delivery_id: String,
        count: usize,
    },
    OrphanReturn {
        date: NaiveDate,
        return_id: String,
        linked_delivery_id: Option<String>,
    },
    UnitMismatch {
        delivery_id: String,
        delivery_unit: String,
        return_unit: String,
    },
    MisplacedReturn {
        delivery_id: String,
        /// `None` when the delivery's lead time runs past the calendar range.
        expected: Option<NaiveDate>,
        found: NaiveDate,
    },
    UnknownUnit {
        unit_type: String,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateDeliveryId { delivery_id } => {
                write!(f, "delivery id {delivery_id} is used more than once")
            }
            IntegrityIssue::MissingReturn { delivery_id } => {
                write!(f, "delivery {delivery_id} has no return event")
            }
            IntegrityIssue::DuplicateReturns { delivery_id, count } => {
                write!(f, "delivery {delivery_id} has {count} return events")
            }
            IntegrityIssue::OrphanReturn {
                date,
                return_id,
                linked_delivery_id,
            } => match linked_delivery_id {
                Some(linked) => write!(
                    f,
                    "return {return_id} on {date} points at missing delivery {linked}"
                ),
                None => write!(f, "return {return_id} on {date} is not linked to a delivery"),
            },
            IntegrityIssue::UnitMismatch {
                delivery_id,
                delivery_unit,
                return_unit,
            } => write!(
                f,
                "delivery {delivery_id} uses {delivery_unit} but its return uses {return_unit}"
            ),
            IntegrityIssue::MisplacedReturn {
                delivery_id,
                expected,
                found,
            } => match expected {
                Some(expected) => write!(
                    f,
                    "return for delivery {delivery_id} is filed on {found}, expected {expected}"
                ),
                None => write!(
                    f,
                    "return for delivery {delivery_id} is filed on {found}, but its lead time runs past the calendar range"
                ),
            },
            IntegrityIssue::UnknownUnit { unit_type } => {
                write!(f, "unit type '{unit_type}' is not part of the fleet")
            }
        }
    }
}

/// Checks delivery/return pairing and unit types across the whole calendar.
pub fn check_integrity(calendar: &DeliveryCalendar, pool: &UnitPool) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    let mut deliveries = BTreeMap::new();
    let mut unknown_units = BTreeSet::new();
    for (_, delivery) in calendar.deliveries() {
        if deliveries.insert(delivery.id.as_str(), delivery).is_some() {
            issues.push(IntegrityIssue::DuplicateDeliveryId {
                delivery_id: delivery.id.clone(),
            });
        }
        if !pool.contains(&delivery.unit_type) {
            unknown_units.insert(delivery.unit_type.clone());
        }
    }

    let mut returns_per_delivery: BTreeMap<&str, usize> = BTreeMap::new();
    for (date, ret) in calendar.returns() {
        let linked = ret
            .linked_delivery_id
            .as_deref()
            .and_then(|id| deliveries.get(id));
        let Some(delivery) = linked else {
            issues.push(IntegrityIssue::OrphanReturn {
                date,
                return_id: ret.id.clone(),
                linked_delivery_id: ret.linked_delivery_id.clone(),
            });
            continue;
        };
        *returns_per_delivery.entry(delivery.id.as_str()).or_default() += 1;
        if delivery.unit_type != ret.unit_type {
            issues.push(IntegrityIssue::UnitMismatch {
                delivery_id: delivery.id.clone(),
                delivery_unit: delivery.unit_type.clone(),
                return_unit: ret.unit_type.clone(),
            });
        }
        let expected = delivery.return_date();
        if expected != Some(date) {
            issues.push(IntegrityIssue::MisplacedReturn {
                delivery_id: delivery.id.clone(),
                expected,
                found: date,
            });
        }
    }

    for delivery_id in deliveries.keys() {
        match returns_per_delivery.get(delivery_id).copied().unwrap_or(0) {
            0 => issues.push(IntegrityIssue::MissingReturn {
                delivery_id: delivery_id.to_string(),
            }),
            1 => {}
            count => issues.push(IntegrityIssue::DuplicateReturns {
                delivery_id: delivery_id.to_string(),
                count,
            }),
        }
    }

    issues.extend(
        unknown_units
            .into_iter()
            .map(|unit_type| IntegrityIssue::UnknownUnit { unit_type }),
    );
    issues
}
