use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit types a freshly reset fleet starts with, each at zero.
pub const DEFAULT_UNIT_TYPES: [&str; 4] = ["Tráiler 53", "Tráiler 48", "Torton", "Interplanta"];

/// Idle, assignable units per unit type.
///
/// Serialized as a flat JSON object (`{"Torton": 2, ...}`). Counts are
/// unsigned, so a stored negative count is rejected when the pool is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPool {
    units: BTreeMap<String, u32>,
}

impl UnitPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four standard unit types, all with no idle units.
    pub fn default_fleet() -> Self {
        DEFAULT_UNIT_TYPES
            .iter()
            .map(|name| (name.to_string(), 0))
            .collect()
    }

    pub fn contains(&self, unit_type: &str) -> bool {
        self.units.contains_key(unit_type)
    }

    /// Idle count for a unit type, `None` when the type is not configured.
    pub fn available(&self, unit_type: &str) -> Option<u32> {
        self.units.get(unit_type).copied()
    }

    /// Overwrites the idle count for a unit type, adding the type if needed.
    pub fn set_count(&mut self, unit_type: impl Into<String>, count: u32) {
        self.units.insert(unit_type.into(), count);
    }

    /// Takes one unit out of the pool and returns the remaining count.
    ///
    /// Returns `None` without touching the pool when the type is unknown or
    /// has no idle units left.
    pub(crate) fn take_one(&mut self, unit_type: &str) -> Option<u32> {
        let count = self.units.get_mut(unit_type)?;
        if *count == 0 {
            return None;
        }
        *count -= 1;
        Some(*count)
    }

    /// Puts one unit back and returns the new count.
    pub(crate) fn restore_one(&mut self, unit_type: &str) -> u32 {
        let count = self.units.entry(unit_type.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn unit_types(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.units.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for UnitPool {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            units: iter
                .into_iter()
                .map(|(name, count)| (name.into(), count))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_one_refuses_when_exhausted() {
        let mut pool: UnitPool = [("Torton", 1)].into_iter().collect();
        assert_eq!(pool.take_one("Torton"), Some(0));
        assert_eq!(pool.take_one("Torton"), None);
        assert_eq!(pool.available("Torton"), Some(0));
        assert_eq!(pool.take_one("Interplanta"), None);
        assert!(!pool.contains("Interplanta"));
    }

    #[test]
    fn restore_one_adds_missing_type() {
        let mut pool = UnitPool::new();
        assert_eq!(pool.restore_one("Torton"), 1);
        assert_eq!(pool.available("Torton"), Some(1));
    }

    #[test]
    fn serializes_as_flat_object() {
        let pool: UnitPool = [("Torton", 2), ("Interplanta", 0)].into_iter().collect();
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json, serde_json::json!({"Torton": 2, "Interplanta": 0}));

        let negative: Result<UnitPool, _> = serde_json::from_str(r#"{"Torton": -1}"#);
        assert!(negative.is_err());
    }

    #[test]
    fn default_fleet_is_zeroed() {
        let pool = UnitPool::default_fleet();
        assert_eq!(pool.len(), 4);
        assert!(pool.iter().all(|(_, count)| count == 0));
        assert!(pool.contains("Tráiler 53"));
    }
}
