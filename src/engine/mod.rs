//! Mutators over the unit pool and the delivery calendar.
//!
//! State is passed in explicitly and changed in place; persisting it
//! afterwards is the caller's job. Every operation either completes fully or
//! returns an [`EngineError`] with the pool and calendar untouched.

mod amendment;
mod booking;
mod cancellation;
mod error;

pub use amendment::{AmendmentReceipt, amend};
pub use booking::{BookingReceipt, BookingRequest, book, book_at};
pub use cancellation::{CancellationReceipt, cancel};
pub use error::{EngineError, EngineResult};

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Success flag plus the message a dispatcher sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn from_result<T: Display>(result: &EngineResult<T>) -> Self {
        match result {
            Ok(receipt) => Self {
                success: true,
                message: receipt.to_string(),
            },
            Err(err) => Self {
                success: false,
                message: err.to_string(),
            },
        }
    }
}

impl<T: Display> From<EngineResult<T>> for Outcome {
    fn from(value: EngineResult<T>) -> Self {
        Self::from_result(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_carries_flag_and_message() {
        let refused: EngineResult<BookingReceipt> = Err(EngineError::PoolExhausted {
            unit_type: "Torton".into(),
        });
        let outcome = Outcome::from(refused);
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "no units of type 'Torton' are available for the selected day"
        );
    }
}
