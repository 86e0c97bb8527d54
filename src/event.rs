use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that turns a delivery id into the id of its return event.
pub const RETURN_ID_PREFIX: &str = "retorno-";

/// `ship_date` plus `days`, or `None` on overflow.
pub fn return_date_after(ship_date: NaiveDate, days: u32) -> Option<NaiveDate> {
    ship_date.checked_add_days(Days::new(u64::from(days)))
}

/// An outbound booking of one unit to a client.
///
/// Field names on disk follow the calendar file format (`cliente`, `unidad`,
/// `dias_retorno`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub id: String,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "unidad")]
    pub unit_type: String,
    /// Return lead time as requested by the order.
    #[serde(rename = "dias_retorno")]
    pub requested_return_days: u32,
    /// Lead time after the weekend adjustment. Records written before the
    /// adjustment existed do not carry it.
    #[serde(
        rename = "dias_retorno_calculados",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_return_days: Option<u32>,
    #[serde(rename = "fecha_pedido")]
    pub ship_date: NaiveDate,
}

impl DeliveryEvent {
    /// Lead time actually in force: the stored effective days, or the
    /// requested days for records that predate the adjustment.
    pub fn resolved_return_days(&self) -> u32 {
        self.effective_return_days
            .unwrap_or(self.requested_return_days)
    }

    /// Date the paired return event belongs on, `None` when it falls past
    /// the last representable date.
    pub fn return_date(&self) -> Option<NaiveDate> {
        return_date_after(self.ship_date, self.resolved_return_days())
    }

    /// True while the unit is out: shipped on or before `date` and not yet
    /// due back. A return date beyond the calendar range never arrives.
    pub fn is_out_on(&self, date: NaiveDate) -> bool {
        self.ship_date <= date && self.return_date().is_none_or(|back| date < back)
    }

    pub fn return_id(&self) -> String {
        format!("{RETURN_ID_PREFIX}{}", self.id)
    }

    /// Builds the return event paired with this delivery.
    pub fn to_return_event(&self) -> ReturnEvent {
        ReturnEvent {
            id: self.return_id(),
            unit_type: self.unit_type.clone(),
            linked_delivery_id: Some(self.id.clone()),
            associated_client: Some(self.client.clone()),
            associated_ship_date: Some(self.ship_date),
        }
    }
}

/// The scheduled day a booked unit is expected back.
///
/// The link fields are optional on disk because older calendar files stored
/// returns without them; `migrate::relink_returns` fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "unidad")]
    pub unit_type: String,
    #[serde(
        rename = "pedido_id_asociado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_delivery_id: Option<String>,
    #[serde(
        rename = "cliente_asociado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub associated_client: Option<String>,
    #[serde(
        rename = "fecha_pedido_asociado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub associated_ship_date: Option<NaiveDate>,
}

impl ReturnEvent {
    pub fn is_linked_to(&self, delivery_id: &str) -> bool {
        self.linked_delivery_id.as_deref() == Some(delivery_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Delivery,
    Return,
}

impl EventKind {
    /// Name used for the `tipo_evento` field on disk.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Delivery => "entrega",
            EventKind::Return => "retorno",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a calendar day, tagged on disk by `tipo_evento`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo_evento")]
pub enum CalendarEvent {
    #[serde(rename = "entrega")]
    Delivery(DeliveryEvent),
    #[serde(rename = "retorno")]
    Return(ReturnEvent),
}

impl CalendarEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CalendarEvent::Delivery(_) => EventKind::Delivery,
            CalendarEvent::Return(_) => EventKind::Return,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CalendarEvent::Delivery(delivery) => &delivery.id,
            CalendarEvent::Return(ret) => &ret.id,
        }
    }

    pub fn unit_type(&self) -> &str {
        match self {
            CalendarEvent::Delivery(delivery) => &delivery.unit_type,
            CalendarEvent::Return(ret) => &ret.unit_type,
        }
    }

    pub fn as_delivery(&self) -> Option<&DeliveryEvent> {
        match self {
            CalendarEvent::Delivery(delivery) => Some(delivery),
            CalendarEvent::Return(_) => None,
        }
    }

    pub fn as_return(&self) -> Option<&ReturnEvent> {
        match self {
            CalendarEvent::Return(ret) => Some(ret),
            CalendarEvent::Delivery(_) => None,
        }
    }

    pub(crate) fn is_delivery_with_id(&self, delivery_id: &str) -> bool {
        matches!(self, CalendarEvent::Delivery(delivery) if delivery.id == delivery_id)
    }

    pub(crate) fn is_return_for(&self, delivery_id: &str) -> bool {
        matches!(self, CalendarEvent::Return(ret) if ret.is_linked_to(delivery_id))
    }
}

impl From<DeliveryEvent> for CalendarEvent {
    fn from(value: DeliveryEvent) -> Self {
        CalendarEvent::Delivery(value)
    }
}

impl From<ReturnEvent> for CalendarEvent {
    fn from(value: ReturnEvent) -> Self {
        CalendarEvent::Return(value)
    }
}
