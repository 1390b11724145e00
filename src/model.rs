//! Typed records for everything the dashboard selects, fetches and plots.

use crate::config::{DEFAULT_SEASON, SUPPORTED_SEASONS, UNKNOWN_COMPOUND};
use crate::error::SelectionError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A championship year from the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Season(u16);

impl Season {
    pub fn new(year: u16) -> Result<Self, SelectionError> {
        if SUPPORTED_SEASONS.contains(&year) {
            Ok(Season(year))
        } else {
            Err(SelectionError::UnsupportedSeason(year))
        }
    }

    pub fn year(self) -> u16 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Season> {
        SUPPORTED_SEASONS.iter().map(|&year| Season(year))
    }
}

impl TryFrom<u16> for Season {
    type Error = SelectionError;

    fn try_from(year: u16) -> Result<Self, Self::Error> {
        Season::new(year)
    }
}

impl From<Season> for u16 {
    fn from(season: Season) -> u16 {
        season.0
    }
}

impl Default for Season {
    fn default() -> Self {
        Season(DEFAULT_SEASON)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A race weekend. Names are unique within a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "EventName")]
    pub name: String,
    #[serde(rename = "EventDate")]
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Session {
    Practice1,
    Practice2,
    Practice3,
    Qualifying,
    #[default]
    Race,
}

impl Session {
    pub const ALL: [Session; 5] = [
        Session::Practice1,
        Session::Practice2,
        Session::Practice3,
        Session::Qualifying,
        Session::Race,
    ];

    /// Name understood by the data service (and shown in the UI).
    pub fn wire_name(self) -> &'static str {
        match self {
            Session::Practice1 => "Practice 1",
            Session::Practice2 => "Practice 2",
            Session::Practice3 => "Practice 3",
            Session::Qualifying => "Qualifying",
            Session::Race => "Race",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Session> {
        Session::ALL.into_iter().find(|s| s.wire_name() == name)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(rename = "Abbreviation")]
    pub abbreviation: String,
    #[serde(rename = "FullName")]
    pub full_name: String,
    /// Compound of the driver's fastest lap in the session, when known.
    #[serde(
        rename = "TyreCompound",
        default,
        deserialize_with = "deserialize_compound"
    )]
    pub tyre_compound: Option<String>,
}

/// Telemetry channels plotted for every selected driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Rpm,
    Speed,
    Throttle,
    Brake,
    Gear,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Rpm,
        Metric::Speed,
        Metric::Throttle,
        Metric::Brake,
        Metric::Gear,
    ];

    /// Analysis key used in telemetry requests and payloads.
    pub fn wire_key(self) -> &'static str {
        match self {
            Metric::Rpm => "RPM",
            Metric::Speed => "Speed",
            Metric::Throttle => "Throttle",
            Metric::Brake => "Brake",
            Metric::Gear => "nGear",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Gear => "Gear",
            other => other.wire_key(),
        }
    }

    pub fn from_wire_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.wire_key() == key)
    }

    /// Comma-joined `analyses` parameter covering every metric.
    pub fn analyses_param() -> String {
        Metric::ALL
            .iter()
            .map(|m| m.wire_key())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Samples for one driver and metric, indexed by position only.
pub type TelemetrySeries = Vec<f64>;

/// Everything fetched for one driver in one telemetry request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DriverTelemetry {
    pub series: IndexMap<Metric, TelemetrySeries>,
    /// Compound of the lap the samples were taken from.
    pub tyre_compound: Option<String>,
}

impl DriverTelemetry {
    pub fn metric(&self, metric: Metric) -> Option<&TelemetrySeries> {
        self.series.get(&metric)
    }
}

/// One lap with a valid time.
#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    /// One-based position in the service's lap list, kept when earlier laps
    /// are dropped.
    pub lap_number: u32,
    pub duration_minutes: f64,
    pub tyre_compound: Option<String>,
}

impl LapRecord {
    pub fn compound_label(&self) -> &str {
        self.tyre_compound.as_deref().unwrap_or(UNKNOWN_COMPOUND)
    }
}

/// Maps the service's "Unknown"/empty placeholder to `None`.
pub fn normalize_compound(raw: Option<String>) -> Option<String> {
    raw.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && c != UNKNOWN_COMPOUND)
}

fn deserialize_compound<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_compound(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_outside_supported_set_is_rejected() {
        assert!(Season::new(2023).is_ok());
        assert_eq!(
            Season::new(2017),
            Err(SelectionError::UnsupportedSeason(2017))
        );
        assert_eq!(Season::all().count(), SUPPORTED_SEASONS.len());
        assert_eq!(Season::new(DEFAULT_SEASON), Ok(Season::default()));
    }

    #[test]
    fn session_wire_names_round_trip() {
        for session in Session::ALL {
            assert_eq!(Session::from_wire_name(session.wire_name()), Some(session));
        }
        assert_eq!(Session::from_wire_name("Sprint"), None);
    }

    #[test]
    fn gear_uses_service_key() {
        assert_eq!(Metric::Gear.wire_key(), "nGear");
        assert_eq!(Metric::Gear.label(), "Gear");
        assert_eq!(Metric::from_wire_key("nGear"), Some(Metric::Gear));
        assert_eq!(Metric::analyses_param(), "RPM,Speed,Throttle,Brake,nGear");
    }

    #[test]
    fn driver_roster_entry_parses_service_shape() {
        let driver: Driver = serde_json::from_str(
            r#"{"Abbreviation":"VER","FullName":"Max Verstappen","TyreCompound":"Unknown"}"#,
        )
        .unwrap();
        assert_eq!(driver.abbreviation, "VER");
        assert_eq!(driver.tyre_compound, None);

        let driver: Driver =
            serde_json::from_str(r#"{"Abbreviation":"HAM","FullName":"Lewis Hamilton"}"#)
                .unwrap();
        assert_eq!(driver.tyre_compound, None);
    }

    #[test]
    fn unknown_compound_label() {
        let lap = LapRecord {
            lap_number: 1,
            duration_minutes: 1.5,
            tyre_compound: None,
        };
        assert_eq!(lap.compound_label(), "Unknown");
    }

    #[test]
    fn season_deserializes_only_supported_years() {
        let season: Season = serde_json::from_str("2021").unwrap();
        assert_eq!(season.year(), 2021);
        assert_eq!(serde_json::to_string(&season).unwrap(), "2021");
        assert!(serde_json::from_str::<Season>("2017").is_err());
    }
}
