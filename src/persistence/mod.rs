use crate::calendar::DeliveryCalendar;
use crate::ledger::Ledger;
use crate::pool::UnitPool;
use chrono::NaiveDate;
use serde_json::Value;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// The stored calendar or pool does not have the expected shape.
    #[error("malformed store: {0}")]
    MalformedStore(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Loads and saves the pool and calendar snapshot.
///
/// There is no locking across processes: two writers that load the same
/// snapshot and save in turn lose the first writer's changes.
pub trait LedgerStore {
    fn load_ledger(&self) -> PersistenceResult<Ledger>;
    fn save_ledger(&self, ledger: &Ledger) -> PersistenceResult<()>;

    /// Replaces the stored ledger with a freshly reset one.
    fn reset(&self, today: NaiveDate) -> PersistenceResult<Ledger> {
        let ledger = Ledger::reset(today);
        self.save_ledger(&ledger)?;
        Ok(ledger)
    }
}

/// Why [`commit_ledger`] left the ledger unchanged.
#[derive(Debug, Error)]
pub enum CommitError<E> {
    /// The operation itself refused the change.
    #[error("{0}")]
    Rejected(E),
    #[error("{0}; the change was not applied")]
    NotSaved(#[source] PersistenceError),
}

/// Runs `op` on a copy of `ledger`, saves the copy, and only then replaces
/// `ledger` with it. On any failure `ledger` is left as it was.
pub fn commit_ledger<S, T, E, F>(
    store: &S,
    ledger: &mut Ledger,
    op: F,
) -> Result<T, CommitError<E>>
where
    S: LedgerStore + ?Sized,
    F: FnOnce(&mut Ledger) -> Result<T, E>,
{
    let mut draft = ledger.clone();
    let value = op(&mut draft).map_err(CommitError::Rejected)?;
    store.save_ledger(&draft).map_err(CommitError::NotSaved)?;
    *ledger = draft;
    Ok(value)
}

/// Parses a calendar document, rejecting anything that is not an object of
/// date keys mapped to event arrays.
pub fn calendar_from_value(value: Value) -> PersistenceResult<DeliveryCalendar> {
    let Value::Object(days) = &value else {
        return Err(PersistenceError::MalformedStore(format!(
            "calendar must be an object of dates, found {}",
            json_kind(&value)
        )));
    };
    if let Some((key, events)) = days.iter().find(|(_, events)| !events.is_array()) {
        return Err(PersistenceError::MalformedStore(format!(
            "calendar day '{key}' must hold a list of events, found {}",
            json_kind(events)
        )));
    }
    let calendar: DeliveryCalendar = serde_json::from_value(value)
        .map_err(|err| PersistenceError::MalformedStore(format!("calendar: {err}")))?;
    check_return_dates(&calendar)?;
    Ok(calendar)
}

/// Rejects deliveries whose lead time puts the return past the last
/// representable date.
pub(crate) fn check_return_dates(calendar: &DeliveryCalendar) -> PersistenceResult<()> {
    match calendar
        .deliveries()
        .find(|(_, delivery)| delivery.return_date().is_none())
    {
        Some((date, delivery)) => Err(PersistenceError::MalformedStore(format!(
            "delivery '{}' on {date} has a return lead time of {} days, beyond the calendar range",
            delivery.id,
            delivery.resolved_return_days()
        ))),
        None => Ok(()),
    }
}

pub fn pool_from_value(value: Value) -> PersistenceResult<UnitPool> {
    if !value.is_object() {
        return Err(PersistenceError::MalformedStore(format!(
            "unit pool must be an object of unit counts, found {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|err| PersistenceError::MalformedStore(format!("unit pool: {err}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::JsonFileStore;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn calendar_must_map_dates_to_lists() {
        let err = calendar_from_value(json!(["2024-05-01"])).unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedStore(_)));

        let err = calendar_from_value(json!({"2024-05-01": {"id": "x"}})).unwrap_err();
        assert!(err.to_string().contains("2024-05-01"));

        let err = calendar_from_value(json!({"next week": []})).unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedStore(_)));

        let ok = calendar_from_value(json!({"2024-05-01": []})).unwrap();
        assert!(ok.is_empty());
    }

    #[test]
    fn lead_time_past_calendar_range_is_malformed() {
        let err = calendar_from_value(json!({
            "2024-05-06": [{
                "tipo_evento": "entrega",
                "id": "huge",
                "cliente": "Acme",
                "unidad": "Torton",
                "dias_retorno": u32::MAX,
                "fecha_pedido": "2024-05-06"
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, PersistenceError::MalformedStore(_)));
        assert!(err.to_string().contains("huge"));
    }

    struct ReadOnlyStore;

    impl LedgerStore for ReadOnlyStore {
        fn load_ledger(&self) -> PersistenceResult<Ledger> {
            Ok(Ledger::default())
        }

        fn save_ledger(&self, _ledger: &Ledger) -> PersistenceResult<()> {
            Err(PersistenceError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn failed_save_leaves_ledger_unchanged() {
        let mut ledger = Ledger::default();
        let result = commit_ledger(&ReadOnlyStore, &mut ledger, |draft| {
            draft.set_unit_count("Torton", 3);
            Ok::<_, std::convert::Infallible>(())
        });

        let err = result.unwrap_err();
        assert!(matches!(err, CommitError::NotSaved(_)));
        assert!(err.to_string().contains("not applied"));
        assert_eq!(ledger, Ledger::default());
    }

    #[test]
    fn rejected_operation_is_not_saved() {
        let mut ledger = Ledger::default();
        let result = commit_ledger(&ReadOnlyStore, &mut ledger, |draft| {
            draft.set_unit_count("Torton", 3);
            Err::<(), _>("refused")
        });
        assert!(matches!(result, Err(CommitError::Rejected("refused"))));
        assert_eq!(ledger, Ledger::default());
    }

    #[test]
    fn pool_must_be_an_object() {
        assert!(matches!(
            pool_from_value(json!([1, 2])),
            Err(PersistenceError::MalformedStore(_))
        ));
        let pool = pool_from_value(json!({"Torton": 2})).unwrap();
        assert_eq!(pool.available("Torton"), Some(2));
    }
}
