//! Application-level configuration constants.

use once_cell::sync::Lazy;

// Data service
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Page query parameter that overrides the base URL at runtime.
pub const API_QUERY_PARAM: &str = "api";

/// Base URL baked in at build time, falling back to the local dev server.
pub static API_BASE_URL: Lazy<String> = Lazy::new(|| {
    option_env!("F1_VIEWER_API_URL")
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .trim_end_matches('/')
        .to_string()
});

// Selection defaults
pub const SUPPORTED_SEASONS: [u16; 7] = [2018, 2019, 2020, 2021, 2022, 2023, 2024];
pub const DEFAULT_SEASON: u16 = 2023;

// Lap chart
pub const TICK_INTERVAL_MIN: u32 = 5;
pub const UNKNOWN_COMPOUND: &str = "Unknown";

// Chart heights (px)
pub const METRIC_CHART_HEIGHT: u32 = 350;
pub const LAP_CHART_HEIGHT: u32 = 500;

// Palette shared by all charts
pub const CHART_BACKGROUND: &str = "#121212";
pub const CHART_FONT_COLOR: &str = "#fff";
