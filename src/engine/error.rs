use chrono::NaiveDate;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Why a booking, cancellation or amendment was refused.
///
/// None of these are fatal: the ledger is left exactly as it was and the
/// `Display` text is meant to be shown to the dispatcher as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unit type '{unit_type}' is not part of the fleet")]
    UnknownUnit { unit_type: String },
    #[error("no units of type '{unit_type}' are available for the selected day")]
    PoolExhausted { unit_type: String },
    #[error("delivery {delivery_id} not found or already removed")]
    NotFound { delivery_id: String },
    #[error("return lead time must be at least one day (got {days})")]
    InvalidReturnDays { days: u32 },
    #[error("a return {days} days after {ship_date} is beyond the supported calendar range")]
    ReturnDateOutOfRange { ship_date: NaiveDate, days: u32 },
}
