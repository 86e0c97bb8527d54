use crate::weekend::WeekendRule;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DATA_DIR_VAR: &str = "FLEET_CALENDAR_DATA_DIR";
pub const HTTP_ADDR_VAR: &str = "FLEET_CALENDAR_HTTP_ADDR";
pub const WEEKEND_THRESHOLD_VAR: &str = "FLEET_CALENDAR_WEEKEND_THRESHOLD";

pub const UNITS_FILE: &str = "units.json";
pub const CALENDAR_FILE: &str = "calendar.json";
pub const ORDERS_FILE: &str = "pedidos_excel_guardados.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the ledger lives and how the weekend rule is tuned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub http_addr: String,
    pub weekend_threshold: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            http_addr: "0.0.0.0:3000".to_string(),
            weekend_threshold: WeekendRule::default().threshold_days,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a config from a variable lookup, falling back to defaults for
    /// anything unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup(HTTP_ADDR_VAR) {
            config.http_addr = addr;
        }
        if let Some(raw) = lookup(WEEKEND_THRESHOLD_VAR) {
            config.weekend_threshold =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        var: WEEKEND_THRESHOLD_VAR,
                        value: raw.clone(),
                    })?;
        }
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn units_path(&self) -> PathBuf {
        self.data_dir.join(UNITS_FILE)
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.data_dir.join(CALENDAR_FILE)
    }

    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join(ORDERS_FILE)
    }

    pub fn weekend_rule(&self) -> WeekendRule {
        WeekendRule::with_threshold(self.weekend_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_vars_use_defaults() {
        let config = LedgerConfig::from_vars(|_| None).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.units_path(), PathBuf::from("data").join("units.json"));
        assert_eq!(config.weekend_rule(), WeekendRule::default());
    }

    #[test]
    fn vars_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DATA_DIR_VAR, "/srv/fleet"),
            (HTTP_ADDR_VAR, "127.0.0.1:8080"),
            (WEEKEND_THRESHOLD_VAR, "3"),
        ]);
        let config = LedgerConfig::from_vars(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.calendar_path(), PathBuf::from("/srv/fleet/calendar.json"));
        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert_eq!(config.weekend_rule().threshold_days, 3);
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let err = LedgerConfig::from_vars(|key| {
            (key == WEEKEND_THRESHOLD_VAR).then(|| "two".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(WEEKEND_THRESHOLD_VAR));
    }

    #[test]
    fn partial_json_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"weekend_threshold": 1}"#).unwrap();
        let config = LedgerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.weekend_threshold, 1);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }
}
