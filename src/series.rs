//! Chart-ready series derived from the caches.
//!
//! Everything here is a pure function of its inputs, so the UI can rebuild
//! traces after every mutation. The descriptor types serialize to the JSON
//! shape the chart engine expects.

use crate::cache::{LapTimeCache, TelemetryCache};
use crate::config::{
    CHART_BACKGROUND, CHART_FONT_COLOR, LAP_CHART_HEIGHT, METRIC_CHART_HEIGHT, TICK_INTERVAL_MIN,
};
use crate::model::{LapRecord, Metric};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub shape: &'static str,
    pub smoothing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
    pub margin: Margin,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: AxisTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<bool>,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Axis {
            title: AxisTitle {
                text: text.to_string(),
            },
            tickmode: None,
            tickvals: None,
            ticktext: None,
            autorange: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub b: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub color: &'static str,
}

/// An x-axis tick on the elapsed-time axis, in whole minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub minutes: u32,
    pub label: String,
}

/// Lap comparison traces plus the elapsed-time ticks they share.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LapChart {
    pub traces: Vec<Trace>,
    pub ticks: Vec<Tick>,
}

impl LapChart {
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

/// One line per selected driver that has samples for `metric`, in selection
/// order. Drivers without that metric are skipped.
pub fn metric_traces(metric: Metric, selected: &[String], cache: &TelemetryCache) -> Vec<Trace> {
    selected
        .iter()
        .filter_map(|driver| {
            cache.series(driver, metric).map(|samples| Trace {
                name: driver.clone(),
                x: None,
                y: samples.clone(),
                text: None,
                kind: "scatter",
                mode: "lines",
                line: None,
                hoverinfo: None,
            })
        })
        .collect()
}

pub fn metric_layout(metric: Metric) -> Layout {
    Layout {
        title: format!("{} Comparative Chart", metric.label()),
        xaxis: Axis::titled("Sample Index"),
        yaxis: Axis::titled(metric.label()),
        height: METRIC_CHART_HEIGHT,
        margin: Margin {
            t: 40,
            b: 40,
            l: None,
            r: None,
        },
        paper_bgcolor: CHART_BACKGROUND,
        plot_bgcolor: CHART_BACKGROUND,
        font: Font {
            color: CHART_FONT_COLOR,
        },
        hovermode: None,
    }
}

/// Running total of lap durations: `elapsed[i] = duration[0] + … + duration[i]`.
pub fn elapsed_minutes(laps: &[LapRecord]) -> Vec<f64> {
    laps.iter()
        .scan(0.0, |total, lap| {
            *total += lap.duration_minutes;
            Some(*total)
        })
        .collect()
}

/// Hover label naming the lap by its number in the service's lap list.
pub fn lap_hover_text(lap: &LapRecord) -> String {
    format!(
        "Lap {}: {} — {}",
        lap.lap_number,
        format_lap_time(lap.duration_minutes),
        lap.compound_label()
    )
}

/// Ticks every five minutes from 0 up to `ceil(max_elapsed)` inclusive.
pub fn elapsed_ticks(max_elapsed: f64) -> Vec<Tick> {
    let upper = if max_elapsed.is_finite() && max_elapsed > 0.0 {
        max_elapsed.ceil() as u32
    } else {
        0
    };
    (0..=upper)
        .step_by(TICK_INTERVAL_MIN as usize)
        .map(|minutes| Tick {
            minutes,
            label: format!("{} min", minutes),
        })
        .collect()
}

/// Lap duration plotted against elapsed race time, one trace per driver in
/// the cache.
pub fn lap_time_chart(cache: &LapTimeCache) -> LapChart {
    let mut max_elapsed: f64 = 0.0;
    let traces: Vec<Trace> = cache
        .iter()
        .map(|(driver, laps)| {
            let elapsed = elapsed_minutes(laps);
            if let Some(&last) = elapsed.last() {
                max_elapsed = max_elapsed.max(last);
            }
            Trace {
                name: driver.to_string(),
                x: Some(elapsed),
                y: laps.iter().map(|lap| lap.duration_minutes).collect(),
                text: Some(laps.iter().map(lap_hover_text).collect()),
                kind: "scatter",
                mode: "lines+markers",
                line: Some(LineStyle {
                    shape: "spline",
                    smoothing: 1.2,
                }),
                hoverinfo: Some("text"),
            }
        })
        .collect();

    LapChart {
        traces,
        ticks: elapsed_ticks(max_elapsed),
    }
}

pub fn lap_layout(ticks: &[Tick]) -> Layout {
    Layout {
        title: "Lap Times Over Race Duration".to_string(),
        xaxis: Axis {
            tickmode: Some("array"),
            tickvals: Some(ticks.iter().map(|t| t.minutes).collect()),
            ticktext: Some(ticks.iter().map(|t| t.label.clone()).collect()),
            ..Axis::titled("Elapsed Time (minutes)")
        },
        yaxis: Axis {
            autorange: Some(true),
            ..Axis::titled("Lap Times (minutes)")
        },
        height: LAP_CHART_HEIGHT,
        margin: Margin {
            t: 50,
            b: 50,
            l: Some(60),
            r: Some(20),
        },
        paper_bgcolor: CHART_BACKGROUND,
        plot_bgcolor: CHART_BACKGROUND,
        font: Font {
            color: CHART_FONT_COLOR,
        },
        hovermode: Some("closest"),
    }
}

/// Format fractional minutes as `m:ss.mmm`. Negative or non-finite input
/// formats as zero.
pub fn format_lap_time(minutes: f64) -> String {
    let total_ms = if minutes.is_finite() && minutes > 0.0 {
        minutes * 60_000.0
    } else {
        0.0
    };
    let mins = (total_ms / 60_000.0).floor() as u64;
    let secs = ((total_ms % 60_000.0) / 1_000.0).floor() as u64;
    let millis = (total_ms % 1_000.0).floor() as u64;
    format!("{}:{:02}.{:03}", mins, secs, millis)
}
