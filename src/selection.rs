//! What the user has chosen: season, event, session, roster and drivers.
//!
//! `SelectionState` only knows about selection fields. Cache purging that goes
//! with the cascade resets is done by the owning
//! [`Dashboard`](crate::dashboard::Dashboard), which reacts to the returned
//! [`Cascade`].

use crate::error::SelectionError;
use crate::model::{Driver, Event, Season, Session};
use log::debug;

/// How far a selection change invalidated downstream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    /// Nothing changed.
    None,
    /// Roster and selected drivers were cleared.
    Drivers,
    /// Event list, event, roster and selected drivers were cleared.
    Season,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    season: Season,
    events: Vec<Event>,
    event: Option<String>,
    session: Session,
    roster: Vec<Driver>,
    selected: Vec<String>,
}

impl SelectionState {
    pub fn new(season: Season, session: Session) -> Self {
        Self {
            season,
            session,
            ..Self::default()
        }
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn roster(&self) -> &[Driver] {
        &self.roster
    }

    pub fn selected_drivers(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, abbreviation: &str) -> bool {
        self.selected.iter().any(|d| d == abbreviation)
    }

    pub fn roster_driver(&self, abbreviation: &str) -> Option<&Driver> {
        self.roster.iter().find(|d| d.abbreviation == abbreviation)
    }

    /// Switch season. The event is cleared until a fresh list arrives.
    pub fn set_season(&mut self, year: u16) -> Result<Cascade, SelectionError> {
        let season = Season::new(year)?;
        debug!("Season {} -> {}", self.season, season);
        self.season = season;
        self.events.clear();
        self.event = None;
        self.clear_drivers();
        Ok(Cascade::Season)
    }

    /// Replace the event list and select its first entry, if any.
    pub fn set_events(&mut self, events: Vec<Event>) -> Cascade {
        let first = events.first().map(|e| e.name.clone());
        self.events = events;
        self.event = first;
        self.clear_drivers();
        Cascade::Drivers
    }

    pub fn set_event(&mut self, name: &str) -> Result<Cascade, SelectionError> {
        if self.event.as_deref() == Some(name) {
            return Ok(Cascade::None);
        }
        if !self.events.iter().any(|e| e.name == name) {
            return Err(SelectionError::UnknownEvent(name.to_string()));
        }
        debug!("Event -> {}", name);
        self.event = Some(name.to_string());
        self.clear_drivers();
        Ok(Cascade::Drivers)
    }

    pub fn set_session(&mut self, session: Session) -> Cascade {
        if self.session == session {
            return Cascade::None;
        }
        debug!("Session {} -> {}", self.session, session);
        self.session = session;
        self.clear_drivers();
        Cascade::Drivers
    }

    /// Install a freshly loaded roster. Any prior selection is dropped even if
    /// abbreviations coincide.
    pub fn set_driver_roster(&mut self, drivers: Vec<Driver>) -> Cascade {
        self.selected.clear();
        self.roster = drivers;
        Cascade::Drivers
    }

    /// Check that `abbreviation` could be added, without adding it.
    pub fn validate_add(&self, abbreviation: &str) -> Result<(), SelectionError> {
        if self.is_selected(abbreviation) {
            return Err(SelectionError::DuplicateSelection(abbreviation.to_string()));
        }
        if self.roster_driver(abbreviation).is_none() {
            return Err(SelectionError::NoRosterLoaded(abbreviation.to_string()));
        }
        Ok(())
    }

    pub fn add_selected_driver(&mut self, abbreviation: &str) -> Result<(), SelectionError> {
        self.validate_add(abbreviation)?;
        self.selected.push(abbreviation.to_string());
        Ok(())
    }

    /// Returns whether the driver was selected.
    pub fn remove_selected_driver(&mut self, abbreviation: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|d| d != abbreviation);
        before != self.selected.len()
    }

    fn clear_drivers(&mut self) {
        self.roster.clear();
        self.selected.clear();
    }
}
