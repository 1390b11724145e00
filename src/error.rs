//! Error types surfaced to the user.

use thiserror::Error;

/// Rejected selection edits and missing prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Season {0} is not supported")]
    UnsupportedSeason(u16),
    #[error("Please select a race first.")]
    NoEventSelected,
    #[error("Event '{0}' is not part of the loaded schedule")]
    UnknownEvent(String),
    #[error("Please select a driver to add.")]
    NoDriverChosen,
    #[error("Driver {0} is already in the list.")]
    DuplicateSelection(String),
    #[error("Driver {0} is not in the loaded roster. Load drivers first.")]
    NoRosterLoaded(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Validation(#[from] SelectionError),
    /// The service answered with an `error` field.
    #[error("{0}")]
    Service(String),
    /// No usable response was obtained.
    #[error("Request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        ViewerError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Transport(format!("malformed response: {}", err))
    }
}

impl ViewerError {
    /// Message for the blocking notification, prefixed with the failed action.
    pub fn notification(&self, action: &str) -> String {
        format!("{}: {}", action, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_keeps_service_message() {
        let err = ViewerError::Service("no data".into());
        assert_eq!(
            err.notification("Failed to fetch telemetry data"),
            "Failed to fetch telemetry data: no data"
        );
    }

    #[test]
    fn validation_errors_convert() {
        let err: ViewerError = SelectionError::DuplicateSelection("VER".into()).into();
        assert_eq!(err.to_string(), "Driver VER is already in the list.");
    }
}
