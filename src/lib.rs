//! Core of the F1 telemetry viewer.
//!
//! The browser frontend (`main.rs`) is a thin shell over these modules:
//! selection state and its cascade rules, the per-driver caches, the data
//! service client, chart series derivation and the chart surface lifecycle.
//! Apart from [`chart::PlotlyEngine`] and the HTTP transport, everything here
//! is plain Rust and is tested natively.

pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod selection;
pub mod series;
pub mod service;

pub use dashboard::{Dashboard, Transition};
pub use error::{SelectionError, ViewerError};
pub use model::{Driver, DriverTelemetry, Event, LapRecord, Metric, Season, Session};
pub use service::{DataService, HttpDataService, SessionKey};
