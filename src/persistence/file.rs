use super::{
    LedgerStore, PersistenceError, PersistenceResult, calendar_from_value, pool_from_value,
};
use crate::calendar::DeliveryCalendar;
use crate::config::LedgerConfig;
use crate::intake::PendingOrder;
use crate::ledger::Ledger;
use crate::pool::UnitPool;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The unit pool, the calendar and the pending orders kept as three
/// pretty-printed JSON files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    units_path: PathBuf,
    calendar_path: PathBuf,
    orders_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(
        units_path: impl Into<PathBuf>,
        calendar_path: impl Into<PathBuf>,
        orders_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            units_path: units_path.into(),
            calendar_path: calendar_path.into(),
            orders_path: orders_path.into(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.units_path(),
            config.calendar_path(),
            config.orders_path(),
        )
    }

    /// Store using the standard file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::from_config(&LedgerConfig {
            data_dir: dir.as_ref().to_path_buf(),
            ..LedgerConfig::default()
        })
    }

    pub fn units_path(&self) -> &Path {
        &self.units_path
    }

    pub fn calendar_path(&self) -> &Path {
        &self.calendar_path
    }

    pub fn orders_path(&self) -> &Path {
        &self.orders_path
    }

    pub fn load_pool(&self) -> PersistenceResult<UnitPool> {
        ensure_file(&self.units_path, &UnitPool::default_fleet())?;
        pool_from_value(read_json(&self.units_path)?)
    }

    pub fn save_pool(&self, pool: &UnitPool) -> PersistenceResult<()> {
        write_json(&self.units_path, pool)
    }

    pub fn load_calendar(&self) -> PersistenceResult<DeliveryCalendar> {
        ensure_file(&self.calendar_path, &DeliveryCalendar::new())?;
        calendar_from_value(read_json(&self.calendar_path)?)
    }

    pub fn save_calendar(&self, calendar: &DeliveryCalendar) -> PersistenceResult<()> {
        write_json(&self.calendar_path, calendar)
    }

    /// Pending orders from the last import. A missing file is created empty;
    /// an unreadable one is treated as holding no orders.
    pub fn load_orders(&self) -> PersistenceResult<Vec<PendingOrder>> {
        ensure_file(&self.orders_path, &Vec::<PendingOrder>::new())?;
        let file = File::open(&self.orders_path)?;
        match serde_json::from_reader::<_, Vec<PendingOrder>>(file) {
            Ok(orders) => Ok(orders),
            Err(err) => {
                warn!(path = %self.orders_path.display(), %err, "ignoring unreadable pending orders");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_orders(&self, orders: &[PendingOrder]) -> PersistenceResult<()> {
        write_json(&self.orders_path, &orders)
    }

    pub fn clear_orders(&self) -> PersistenceResult<()> {
        if self.orders_path.exists() {
            fs::remove_file(&self.orders_path)?;
        }
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load_ledger(&self) -> PersistenceResult<Ledger> {
        let pool = self.load_pool()?;
        let calendar = self.load_calendar()?;
        debug!(
            units = %self.units_path.display(),
            calendar = %self.calendar_path.display(),
            "ledger loaded"
        );
        Ok(Ledger::new(pool, calendar))
    }

    fn save_ledger(&self, ledger: &Ledger) -> PersistenceResult<()> {
        self.save_pool(&ledger.pool)?;
        self.save_calendar(&ledger.calendar)?;
        Ok(())
    }

    fn reset(&self, today: NaiveDate) -> PersistenceResult<Ledger> {
        let ledger = Ledger::reset(today);
        self.save_ledger(&ledger)?;
        self.clear_orders()?;
        Ok(ledger)
    }
}

fn ensure_file<T: Serialize + ?Sized>(path: &Path, initial: &T) -> PersistenceResult<()> {
    if path.exists() {
        return Ok(());
    }
    write_json(path, initial)
}

/// Text that is not JSON at all is as corrupt as JSON of the wrong shape.
fn read_json(path: &Path) -> PersistenceResult<Value> {
    let file = File::open(path)?;
    serde_json::from_reader(file).map_err(|err| {
        PersistenceError::MalformedStore(format!("{}: {err}", path.display()))
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PersistenceResult<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
