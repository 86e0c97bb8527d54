pub mod calculations;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod event;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod migrate;
pub mod persistence;
pub mod pool;
pub mod weekend;

pub use calculations::{AvailabilityReport, DayAvailability, UnitAvailability, project, project_range};
pub use calendar::{DaySummary, DeliveryCalendar};
pub use config::{ConfigError, LedgerConfig};
pub use engine::{
    AmendmentReceipt, BookingReceipt, BookingRequest, CancellationReceipt, EngineError,
    EngineResult, Outcome, amend, book, book_at, cancel,
};
pub use event::{CalendarEvent, DeliveryEvent, EventKind, ReturnEvent};
pub use intake::{PendingOrder, load_orders_from_csv, read_orders_csv};
pub use ledger::Ledger;
pub use migrate::{IntegrityIssue, RelinkSummary, check_integrity, relink_returns};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteLedgerStore;
pub use persistence::{
    CommitError, JsonFileStore, LedgerStore, PersistenceError, PersistenceResult, commit_ledger,
};
pub use pool::UnitPool;
pub use weekend::WeekendRule;
