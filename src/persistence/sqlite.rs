use super::{LedgerStore, PersistenceError, PersistenceResult, check_return_dates};
use crate::calendar::DeliveryCalendar;
use crate::event::CalendarEvent;
use crate::ledger::Ledger;
use crate::pool::UnitPool;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::sync::Mutex;

/// The same snapshot as the JSON files, kept in two tables and replaced in
/// a single transaction on every save.
pub struct SqliteLedgerStore {
    connection: Mutex<Connection>,
}

impl SqliteLedgerStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS units (
                name TEXT PRIMARY KEY,
                available INTEGER NOT NULL CHECK (available >= 0)
            );
            CREATE TABLE IF NOT EXISTS calendar_days (
                day TEXT PRIMARY KEY,
                events_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_pool(&self, tx: &rusqlite::Transaction, pool: &UnitPool) -> PersistenceResult<()> {
        tx.execute("DELETE FROM units", [])?;
        let mut stmt = tx.prepare("INSERT INTO units (name, available) VALUES (?1, ?2)")?;
        for (name, available) in pool.iter() {
            stmt.execute(params![name, available])?;
        }
        Ok(())
    }

    fn save_calendar(
        &self,
        tx: &rusqlite::Transaction,
        calendar: &DeliveryCalendar,
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM calendar_days", [])?;
        let mut stmt = tx.prepare("INSERT INTO calendar_days (day, events_json) VALUES (?1, ?2)")?;
        for (date, events) in calendar.iter() {
            let json = serde_json::to_string(events)?;
            stmt.execute(params![date.format("%Y-%m-%d").to_string(), json])?;
        }
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn save_ledger(&self, ledger: &Ledger) -> PersistenceResult<()> {
        let mut conn = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction()?;
        self.save_pool(&tx, &ledger.pool)?;
        self.save_calendar(&tx, &ledger.calendar)?;
        tx.commit()?;
        Ok(())
    }

    /// A store that has never been saved to yields the default fleet and an
    /// empty calendar.
    fn load_ledger(&self) -> PersistenceResult<Ledger> {
        let conn = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut stmt = conn.prepare("SELECT name, available FROM units ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;
        let mut units = Vec::new();
        for row in rows {
            units.push(row?);
        }
        let pool = if units.is_empty() {
            UnitPool::default_fleet()
        } else {
            units.into_iter().collect()
        };

        let mut stmt = conn.prepare("SELECT day, events_json FROM calendar_days ORDER BY day ASC")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut days = Vec::new();
        for row in rows {
            let (day, json) = row?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|err| {
                PersistenceError::MalformedStore(format!("invalid calendar day '{day}': {err}"))
            })?;
            let events: Vec<CalendarEvent> = serde_json::from_str(&json).map_err(|err| {
                PersistenceError::MalformedStore(format!("calendar day '{day}': {err}"))
            })?;
            days.push((date, events));
        }

        let calendar: DeliveryCalendar = days.into_iter().collect();
        check_return_dates(&calendar)?;
        Ok(Ledger::new(pool, calendar))
    }
}
