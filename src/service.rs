//! The remote data service: request paths, payload decoding and the HTTP client.

use crate::error::ViewerError;
use crate::model::{
    normalize_compound, Driver, DriverTelemetry, Event, LapRecord, Metric, Season, Session,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Identifies one session of one event, the scope of every driver query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub season: Season,
    pub event: String,
    pub session: Session,
}

impl SessionKey {
    fn path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.season,
            urlencoding::encode(&self.event),
            urlencoding::encode(self.session.wire_name())
        )
    }
}

/// Queries answered by the data service. Each call is one request, no retry.
#[async_trait(?Send)]
pub trait DataService {
    async fn races(&self, season: Season) -> Result<Vec<Event>, ViewerError>;

    async fn drivers(&self, key: &SessionKey) -> Result<Vec<Driver>, ViewerError>;

    /// Telemetry for every metric of the given drivers.
    async fn telemetry(
        &self,
        key: &SessionKey,
        drivers: &[String],
    ) -> Result<IndexMap<String, DriverTelemetry>, ViewerError>;

    async fn lap_times(
        &self,
        key: &SessionKey,
        drivers: &[String],
    ) -> Result<IndexMap<String, Vec<LapRecord>>, ViewerError>;
}

pub fn races_url(base_url: &str, season: Season) -> String {
    format!("{}/races/{}", base_url, season)
}

pub fn drivers_url(base_url: &str, key: &SessionKey) -> String {
    format!("{}/drivers/{}", base_url, key.path())
}

pub fn telemetry_url(base_url: &str, key: &SessionKey, drivers: &[String]) -> String {
    format!(
        "{}/telemetry/{}?drivers={}&analyses={}",
        base_url,
        key.path(),
        join_param(drivers),
        Metric::analyses_param()
    )
}

pub fn lap_times_url(base_url: &str, key: &SessionKey, drivers: &[String]) -> String {
    format!(
        "{}/laptimes/{}?drivers={}",
        base_url,
        key.path(),
        join_param(drivers)
    )
}

fn join_param(values: &[String]) -> String {
    values
        .iter()
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Deserialize)]
struct RacesBody {
    #[serde(default)]
    races: Vec<Event>,
}

#[derive(Deserialize)]
struct DriversBody {
    #[serde(default)]
    drivers: Vec<Driver>,
}

#[derive(Deserialize)]
struct TelemetryBody {
    #[serde(default)]
    data: IndexMap<String, IndexMap<String, Value>>,
}

#[derive(Deserialize)]
struct LapTimesBody {
    #[serde(default)]
    lap_times: IndexMap<String, DriverLapsBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DriverLapsBody {
    Failed {
        error: String,
    },
    Laps {
        lap_times_min: Vec<Option<f64>>,
        #[serde(default)]
        tyre_compounds: Vec<Option<String>>,
    },
}

/// Top-level `error` field, read without touching the rest of the body.
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<Value>,
}

/// The service's `error` message, if the body is a JSON object carrying one.
fn service_error(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match envelope.error? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Decode a response body, turning `{ "error": ... }` into a service error.
/// The body is decoded straight into `T` so map fields keep the service's
/// key order.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ViewerError> {
    if let Some(message) = service_error(body) {
        return Err(ViewerError::Service(message));
    }
    Ok(serde_json::from_str(body)?)
}

/// Pass a body on unless the status failed without a service `error` message.
fn check_status(status: reqwest::StatusCode, body: String) -> Result<String, ViewerError> {
    if status.is_success() || service_error(&body).is_some() {
        Ok(body)
    } else {
        warn!("Service answered HTTP {} without an error message", status);
        Err(ViewerError::Transport(format!("HTTP {}", status)))
    }
}

pub fn parse_races(body: &str) -> Result<Vec<Event>, ViewerError> {
    Ok(decode::<RacesBody>(body)?.races)
}

pub fn parse_drivers(body: &str) -> Result<Vec<Driver>, ViewerError> {
    Ok(decode::<DriversBody>(body)?.drivers)
}

pub fn parse_telemetry(body: &str) -> Result<IndexMap<String, DriverTelemetry>, ViewerError> {
    let data = decode::<TelemetryBody>(body)?.data;
    Ok(data
        .into_iter()
        .map(|(driver, fields)| (driver, driver_telemetry(fields)))
        .collect())
}

fn driver_telemetry(fields: IndexMap<String, Value>) -> DriverTelemetry {
    let mut telemetry = DriverTelemetry::default();
    for (key, value) in fields {
        if key == "tire" {
            telemetry.tyre_compound = normalize_compound(value.as_str().map(str::to_string));
            continue;
        }
        let Some(metric) = Metric::from_wire_key(&key) else {
            debug!("Ignoring unexpected telemetry field '{}'", key);
            continue;
        };
        match value {
            Value::Array(samples) => {
                telemetry
                    .series
                    .insert(metric, samples.iter().map(sample_value).collect());
            }
            other => warn!("Telemetry field '{}' is not a sample list: {}", key, other),
        }
    }
    telemetry
}

/// Numbers pass through, booleans (brake on/off) map to 0/1, gaps to NaN.
fn sample_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(on) => {
            if *on {
                1.0
            } else {
                0.0
            }
        }
        _ => f64::NAN,
    }
}

pub fn parse_lap_times(body: &str) -> Result<IndexMap<String, Vec<LapRecord>>, ViewerError> {
    let lap_times = decode::<LapTimesBody>(body)?.lap_times;
    let mut out = IndexMap::with_capacity(lap_times.len());
    for (driver, entry) in lap_times {
        match entry {
            DriverLapsBody::Failed { error } => {
                warn!("No lap times for {}: {}", driver, error);
            }
            DriverLapsBody::Laps {
                lap_times_min,
                tyre_compounds,
            } => {
                let laps = lap_records(&driver, lap_times_min, tyre_compounds);
                out.insert(driver, laps);
            }
        }
    }
    Ok(out)
}

fn lap_records(
    driver: &str,
    durations: Vec<Option<f64>>,
    mut compounds: Vec<Option<String>>,
) -> Vec<LapRecord> {
    compounds.resize(durations.len(), None);
    let total = durations.len();
    let laps: Vec<LapRecord> = durations
        .into_iter()
        .zip(compounds)
        .zip(1u32..)
        .filter_map(|((duration, compound), lap_number)| match duration {
            Some(minutes) if minutes.is_finite() && minutes > 0.0 => Some(LapRecord {
                lap_number,
                duration_minutes: minutes,
                tyre_compound: normalize_compound(compound),
            }),
            _ => None,
        })
        .collect();
    if laps.len() < total {
        debug!(
            "Dropped {} laps without a valid time for {}",
            total - laps.len(),
            driver
        );
    }
    laps
}

/// `DataService` over HTTP GET with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str) -> Result<String, ViewerError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, body)
    }
}

#[async_trait(?Send)]
impl DataService for HttpDataService {
    async fn races(&self, season: Season) -> Result<Vec<Event>, ViewerError> {
        let body = self.get(&races_url(&self.base_url, season)).await?;
        parse_races(&body)
    }

    async fn drivers(&self, key: &SessionKey) -> Result<Vec<Driver>, ViewerError> {
        let body = self.get(&drivers_url(&self.base_url, key)).await?;
        parse_drivers(&body)
    }

    async fn telemetry(
        &self,
        key: &SessionKey,
        drivers: &[String],
    ) -> Result<IndexMap<String, DriverTelemetry>, ViewerError> {
        let body = self.get(&telemetry_url(&self.base_url, key, drivers)).await?;
        parse_telemetry(&body)
    }

    async fn lap_times(
        &self,
        key: &SessionKey,
        drivers: &[String],
    ) -> Result<IndexMap<String, Vec<LapRecord>>, ViewerError> {
        let body = self.get(&lap_times_url(&self.base_url, key, drivers)).await?;
        parse_lap_times(&body)
    }
}
