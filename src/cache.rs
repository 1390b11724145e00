//! Per-driver stores for fetched telemetry and lap times.
//!
//! Both caches are owned by the [`Dashboard`](crate::dashboard::Dashboard)
//! aggregate and only ever hold drivers that are currently selected.
//!
//! # Update rules
//! - `TelemetryCache`: merged one driver at a time; other drivers are untouched.
//! - `LapTimeCache`: replaced wholesale on every refresh.
//!
//! Both keep insertion order so charts list drivers in selection order.

use crate::model::{DriverTelemetry, LapRecord, Metric, TelemetrySeries};
use indexmap::IndexMap;

/// Driver abbreviation → fetched telemetry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryCache {
    entries: IndexMap<String, DriverTelemetry>,
}

impl TelemetryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite `driver`'s entry.
    pub fn merge(&mut self, driver: &str, telemetry: DriverTelemetry) {
        self.entries.insert(driver.to_string(), telemetry);
    }

    pub fn purge(&mut self, driver: &str) -> Option<DriverTelemetry> {
        self.entries.shift_remove(driver)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, driver: &str) -> Option<&DriverTelemetry> {
        self.entries.get(driver)
    }

    pub fn series(&self, driver: &str, metric: Metric) -> Option<&TelemetrySeries> {
        self.entries.get(driver).and_then(|t| t.metric(metric))
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.entries.contains_key(driver)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Driver abbreviation → laps in running order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapTimeCache {
    entries: IndexMap<String, Vec<LapRecord>>,
}

impl LapTimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, entries: IndexMap<String, Vec<LapRecord>>) {
        self.entries = entries;
    }

    pub fn purge(&mut self, driver: &str) -> Option<Vec<LapRecord>> {
        self.entries.shift_remove(driver)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, driver: &str) -> Option<&[LapRecord]> {
        self.entries.get(driver).map(Vec::as_slice)
    }

    pub fn contains(&self, driver: &str) -> bool {
        self.entries.contains_key(driver)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LapRecord])> {
        self.entries
            .iter()
            .map(|(driver, laps)| (driver.as_str(), laps.as_slice()))
    }

    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry(speed: &[f64]) -> DriverTelemetry {
        let mut t = DriverTelemetry::default();
        t.series.insert(Metric::Speed, speed.to_vec());
        t
    }

    #[test]
    fn merge_leaves_other_drivers_intact() {
        let mut cache = TelemetryCache::new();
        cache.merge("VER", telemetry(&[300.0, 310.0]));
        cache.merge("HAM", telemetry(&[290.0]));
        assert_eq!(cache.series("VER", Metric::Speed), Some(&vec![300.0, 310.0]));
        assert_eq!(cache.series("HAM", Metric::Speed), Some(&vec![290.0]));

        cache.merge("HAM", telemetry(&[295.0, 296.0]));
        assert_eq!(cache.series("VER", Metric::Speed), Some(&vec![300.0, 310.0]));
        assert_eq!(cache.series("HAM", Metric::Speed), Some(&vec![295.0, 296.0]));
        assert_eq!(cache.drivers().collect::<Vec<_>>(), vec!["VER", "HAM"]);
    }

    #[test]
    fn purge_keeps_order_of_remaining_drivers() {
        let mut cache = TelemetryCache::new();
        for drv in ["VER", "HAM", "LEC"] {
            cache.merge(drv, telemetry(&[1.0]));
        }
        assert!(cache.purge("HAM").is_some());
        assert!(cache.purge("HAM").is_none());
        assert_eq!(cache.drivers().collect::<Vec<_>>(), vec!["VER", "LEC"]);
    }

    #[test]
    fn lap_cache_replace_drops_previous_entries() {
        let lap = LapRecord {
            lap_number: 1,
            duration_minutes: 1.5,
            tyre_compound: None,
        };
        let mut cache = LapTimeCache::new();
        cache.replace(IndexMap::from([("VER".to_string(), vec![lap.clone()])]));
        cache.replace(IndexMap::from([("HAM".to_string(), vec![lap])]));
        assert!(!cache.contains("VER"));
        assert_eq!(cache.get("HAM").map(|l| l.len()), Some(1));
    }
}
