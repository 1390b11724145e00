//! The dashboard aggregate: selection plus the caches derived from it, and the
//! fetch sequencing that keeps them in step.
//!
//! Every fetch is split in two synchronous halves so the UI can keep the
//! aggregate in a `RefCell` and never hold a borrow across an `.await`:
//!
//! 1. `begin_*` validates, issues a [`Ticket`] and returns a request.
//! 2. `apply_*` consumes the service result for that request.
//!
//! A result whose ticket is no longer current is dropped. Tickets go stale when
//! a newer request of the same kind was issued, or when a cascade reset moved
//! the epoch on. The `async` helpers at the bottom run both halves against a
//! [`DataService`] for callers that own the aggregate outright.

use crate::cache::{LapTimeCache, TelemetryCache};
use crate::error::{SelectionError, ViewerError};
use crate::model::{Driver, DriverTelemetry, Event, LapRecord, Season, Session};
use crate::selection::{Cascade, SelectionState};
use crate::service::{DataService, SessionKey};
use indexmap::IndexMap;
use log::{debug, info, warn};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventsRequest {
    pub ticket: Ticket,
    pub season: Season,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRequest {
    pub ticket: Ticket,
    pub key: SessionKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRequest {
    pub ticket: Ticket,
    pub key: SessionKey,
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapTimesRequest {
    pub ticket: Ticket,
    pub key: SessionKey,
    pub drivers: Vec<String>,
}

/// Outcome of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Revision of the aggregate after the mutation.
    pub revision: u64,
    /// False when a stale result was dropped.
    pub applied: bool,
    /// Lap-time refresh owed because the selected drivers changed.
    pub lap_times: Option<LapTimesRequest>,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    selection: SelectionState,
    telemetry: TelemetryCache,
    lap_times: LapTimeCache,
    driver_to_add: Option<String>,
    revision: u64,
    epoch: u64,
    next_seq: u64,
    events_seq: u64,
    roster_seq: u64,
    lap_times_seq: u64,
}

impl Dashboard {
    pub fn new(season: Season, session: Session) -> Self {
        Self {
            selection: SelectionState::new(season, session),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn telemetry(&self) -> &TelemetryCache {
        &self.telemetry
    }

    pub fn lap_times(&self) -> &LapTimeCache {
        &self.lap_times
    }

    /// Driver picked in the "add driver" control, if any.
    pub fn driver_to_add(&self) -> Option<&str> {
        self.driver_to_add.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── selection changes ────────────────────────────────────────────────────

    /// Switch season and reset everything downstream. The returned request
    /// fetches the new event list.
    pub fn set_season(&mut self, year: u16) -> Result<EventsRequest, ViewerError> {
        self.selection.set_season(year)?;
        self.reset_drivers();
        Ok(self.begin_load_events())
    }

    pub fn set_event(&mut self, name: &str) -> Result<Transition, ViewerError> {
        let cascade = self.selection.set_event(name)?;
        Ok(self.after_cascade(cascade))
    }

    pub fn set_session(&mut self, session: Session) -> Transition {
        let cascade = self.selection.set_session(session);
        self.after_cascade(cascade)
    }

    pub fn set_driver_to_add(&mut self, abbreviation: Option<String>) {
        self.driver_to_add = abbreviation.filter(|a| !a.is_empty());
        self.bump();
    }

    /// Deselect a driver and purge it from both caches. Removing a driver
    /// that is not selected changes nothing.
    pub fn remove_driver(&mut self, abbreviation: &str) -> Transition {
        if !self.selection.remove_selected_driver(abbreviation) {
            return self.unchanged();
        }
        self.telemetry.purge(abbreviation);
        self.lap_times.purge(abbreviation);
        info!("Removed driver {}", abbreviation);
        let lap_times = self.refresh_lap_times();
        self.transition(lap_times)
    }

    // ── events ───────────────────────────────────────────────────────────────

    pub fn begin_load_events(&mut self) -> EventsRequest {
        let ticket = self.issue();
        self.events_seq = ticket.seq;
        self.bump();
        debug!("Loading events for {}", self.selection.season());
        EventsRequest {
            ticket,
            season: self.selection.season(),
        }
    }

    /// Install the event list (first event selected) or, on failure, an empty
    /// list with no event.
    pub fn apply_events(
        &mut self,
        request: &EventsRequest,
        result: Result<Vec<Event>, ViewerError>,
    ) -> Result<Transition, ViewerError> {
        if request.ticket.seq != self.events_seq || request.season != self.selection.season() {
            return Ok(self.discard("events", request.ticket));
        }
        let (events, outcome) = match result {
            Ok(events) => (events, Ok(())),
            Err(err) => {
                warn!("Loading events failed: {}", err);
                (Vec::new(), Err(err))
            }
        };
        info!(
            "Loaded {} events for {}",
            events.len(),
            self.selection.season()
        );
        let cascade = self.selection.set_events(events);
        let transition = self.after_cascade(cascade);
        outcome.map(|_| transition)
    }

    // ── roster ───────────────────────────────────────────────────────────────

    pub fn begin_load_roster(&mut self) -> Result<RosterRequest, ViewerError> {
        let key = self.session_key()?;
        let ticket = self.issue();
        self.roster_seq = ticket.seq;
        debug!("Loading drivers for {:?}", key);
        Ok(RosterRequest { ticket, key })
    }

    /// A fresh roster always invalidates the previous selection. On failure
    /// the roster is left empty.
    pub fn apply_roster(
        &mut self,
        request: &RosterRequest,
        result: Result<Vec<Driver>, ViewerError>,
    ) -> Result<Transition, ViewerError> {
        if request.ticket.seq != self.roster_seq || request.ticket.epoch != self.epoch {
            return Ok(self.discard("roster", request.ticket));
        }
        let (drivers, outcome) = match result {
            Ok(drivers) => (drivers, Ok(())),
            Err(err) => {
                warn!("Loading drivers failed: {}", err);
                (Vec::new(), Err(err))
            }
        };
        info!("Loaded {} drivers", drivers.len());
        let first = drivers.first().map(|d| d.abbreviation.clone());
        let cascade = self.selection.set_driver_roster(drivers);
        let transition = self.after_cascade(cascade);
        self.driver_to_add = first;
        outcome.map(|_| transition)
    }

    // ── telemetry ────────────────────────────────────────────────────────────

    /// Validate an add and prepare its telemetry request. Nothing is committed
    /// until [`apply_telemetry`](Self::apply_telemetry) succeeds.
    pub fn begin_add_driver(&mut self, abbreviation: &str) -> Result<TelemetryRequest, ViewerError> {
        self.selection.validate_add(abbreviation)?;
        let key = self.session_key()?;
        let ticket = self.issue();
        debug!("Fetching telemetry for {}", abbreviation);
        Ok(TelemetryRequest {
            ticket,
            key,
            driver: abbreviation.to_string(),
        })
    }

    pub fn begin_add_pending_driver(&mut self) -> Result<TelemetryRequest, ViewerError> {
        let abbreviation = self
            .driver_to_add
            .clone()
            .ok_or(SelectionError::NoDriverChosen)?;
        self.begin_add_driver(&abbreviation)
    }

    /// Merge the driver's telemetry and commit the selection. On failure the
    /// selection and cache are left untouched.
    pub fn apply_telemetry(
        &mut self,
        request: &TelemetryRequest,
        result: Result<IndexMap<String, DriverTelemetry>, ViewerError>,
    ) -> Result<Transition, ViewerError> {
        if request.ticket.epoch != self.epoch {
            return Ok(self.discard("telemetry", request.ticket));
        }
        let mut data = result.inspect_err(|err| {
            warn!("Telemetry for {} failed: {}", request.driver, err);
        })?;
        self.selection.add_selected_driver(&request.driver)?;
        match data.shift_remove(&request.driver) {
            Some(telemetry) => self.telemetry.merge(&request.driver, telemetry),
            None => warn!("Service returned no telemetry for {}", request.driver),
        }
        info!(
            "Added driver {} ({} selected)",
            request.driver,
            self.selection.selected_drivers().len()
        );
        let lap_times = self.refresh_lap_times();
        Ok(self.transition(lap_times))
    }

    // ── lap times ────────────────────────────────────────────────────────────

    /// Prepare a lap-time refresh for the whole selection. With nothing
    /// selected the cache is cleared and no request is needed.
    pub fn refresh_lap_times(&mut self) -> Option<LapTimesRequest> {
        let ticket = self.issue();
        self.lap_times_seq = ticket.seq;
        let drivers = self.selection.selected_drivers().to_vec();
        if drivers.is_empty() {
            self.lap_times.clear();
            return None;
        }
        let key = self.session_key().ok()?;
        debug!("Refreshing lap times for {}", drivers.join(","));
        Some(LapTimesRequest {
            ticket,
            key,
            drivers,
        })
    }

    /// Replace the lap-time cache wholesale, keeping only the requested
    /// drivers in selection order. On failure the cache is cleared.
    pub fn apply_lap_times(
        &mut self,
        request: &LapTimesRequest,
        result: Result<IndexMap<String, Vec<LapRecord>>, ViewerError>,
    ) -> Result<Transition, ViewerError> {
        if request.ticket.seq != self.lap_times_seq || request.ticket.epoch != self.epoch {
            return Ok(self.discard("lap times", request.ticket));
        }
        match result {
            Ok(mut laps) => {
                let entries: IndexMap<String, Vec<LapRecord>> = request
                    .drivers
                    .iter()
                    .filter_map(|d| laps.shift_remove(d).map(|l| (d.clone(), l)))
                    .collect();
                info!("Loaded lap times for {} drivers", entries.len());
                self.lap_times.replace(entries);
                Ok(self.transition(None))
            }
            Err(err) => {
                warn!("Loading lap times failed: {}", err);
                self.lap_times.clear();
                self.bump();
                Err(err)
            }
        }
    }

    // ── async drivers ────────────────────────────────────────────────────────

    pub async fn load_events<S: DataService + ?Sized>(
        &mut self,
        service: &S,
    ) -> Result<Transition, ViewerError> {
        let request = self.begin_load_events();
        let result = service.races(request.season).await;
        self.apply_events(&request, result)
    }

    pub async fn change_season<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        year: u16,
    ) -> Result<Transition, ViewerError> {
        let request = self.set_season(year)?;
        let result = service.races(request.season).await;
        self.apply_events(&request, result)
    }

    pub async fn load_driver_roster<S: DataService + ?Sized>(
        &mut self,
        service: &S,
    ) -> Result<Transition, ViewerError> {
        let request = self.begin_load_roster()?;
        let result = service.drivers(&request.key).await;
        self.apply_roster(&request, result)
    }

    /// Add a driver, fetch its telemetry, then refresh lap times.
    pub async fn add_driver_and_fetch_telemetry<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        abbreviation: &str,
    ) -> Result<Transition, ViewerError> {
        let request = self.begin_add_driver(abbreviation)?;
        let result = service
            .telemetry(&request.key, std::slice::from_ref(&request.driver))
            .await;
        let transition = self.apply_telemetry(&request, result)?;
        self.follow_up(service, transition).await
    }

    pub async fn remove_driver_and_refresh<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        abbreviation: &str,
    ) -> Result<Transition, ViewerError> {
        let transition = self.remove_driver(abbreviation);
        self.follow_up(service, transition).await
    }

    pub async fn fetch_lap_times<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        request: &LapTimesRequest,
    ) -> Result<Transition, ViewerError> {
        let result = service.lap_times(&request.key, &request.drivers).await;
        self.apply_lap_times(request, result)
    }

    async fn follow_up<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        transition: Transition,
    ) -> Result<Transition, ViewerError> {
        match transition.lap_times {
            Some(request) => self.fetch_lap_times(service, &request).await,
            None => Ok(transition),
        }
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn session_key(&self) -> Result<SessionKey, SelectionError> {
        let event = self
            .selection
            .event()
            .ok_or(SelectionError::NoEventSelected)?;
        Ok(SessionKey {
            season: self.selection.season(),
            event: event.to_string(),
            session: self.selection.session(),
        })
    }

    fn after_cascade(&mut self, cascade: Cascade) -> Transition {
        match cascade {
            Cascade::None => self.unchanged(),
            Cascade::Drivers | Cascade::Season => {
                self.reset_drivers();
                self.transition(None)
            }
        }
    }

    /// Empty both caches and invalidate every driver-scoped request in flight.
    fn reset_drivers(&mut self) {
        self.telemetry.clear();
        self.lap_times.clear();
        self.driver_to_add = None;
        self.epoch += 1;
        self.bump();
    }

    fn issue(&mut self) -> Ticket {
        self.next_seq += 1;
        Ticket {
            epoch: self.epoch,
            seq: self.next_seq,
        }
    }

    fn discard(&self, kind: &str, ticket: Ticket) -> Transition {
        debug!("Dropping stale {} response {:?}", kind, ticket);
        Transition {
            revision: self.revision,
            applied: false,
            lap_times: None,
        }
    }

    fn unchanged(&self) -> Transition {
        Transition {
            revision: self.revision,
            applied: true,
            lap_times: None,
        }
    }

    fn transition(&mut self, lap_times: Option<LapTimesRequest>) -> Transition {
        self.bump();
        Transition {
            revision: self.revision,
            applied: true,
            lap_times,
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metric;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory service answering from canned data and recording every call.
    #[derive(Default)]
    struct FakeService {
        races: Vec<Event>,
        races_error: Option<String>,
        drivers: Vec<Driver>,
        drivers_error: Option<String>,
        telemetry: HashMap<String, DriverTelemetry>,
        telemetry_error: Option<String>,
        laps: HashMap<String, Vec<LapRecord>>,
        laps_error: Option<String>,
        calls: RefCell<Vec<String>>,
    }

    fn fail(error: &Option<String>) -> Result<(), ViewerError> {
        match error {
            Some(message) => Err(ViewerError::Service(message.clone())),
            None => Ok(()),
        }
    }

    #[async_trait(?Send)]
    impl DataService for FakeService {
        async fn races(&self, season: Season) -> Result<Vec<Event>, ViewerError> {
            self.calls.borrow_mut().push(format!("races {}", season));
            fail(&self.races_error)?;
            Ok(self.races.clone())
        }

        async fn drivers(&self, key: &SessionKey) -> Result<Vec<Driver>, ViewerError> {
            self.calls
                .borrow_mut()
                .push(format!("drivers {} {}", key.event, key.session));
            fail(&self.drivers_error)?;
            Ok(self.drivers.clone())
        }

        async fn telemetry(
            &self,
            _key: &SessionKey,
            drivers: &[String],
        ) -> Result<IndexMap<String, DriverTelemetry>, ViewerError> {
            self.calls
                .borrow_mut()
                .push(format!("telemetry {}", drivers.join(",")));
            fail(&self.telemetry_error)?;
            Ok(drivers
                .iter()
                .filter_map(|d| self.telemetry.get(d).map(|t| (d.clone(), t.clone())))
                .collect())
        }

        async fn lap_times(
            &self,
            _key: &SessionKey,
            drivers: &[String],
        ) -> Result<IndexMap<String, Vec<LapRecord>>, ViewerError> {
            self.calls
                .borrow_mut()
                .push(format!("laptimes {}", drivers.join(",")));
            fail(&self.laps_error)?;
            Ok(drivers
                .iter()
                .filter_map(|d| self.laps.get(d).map(|l| (d.clone(), l.clone())))
                .collect())
        }
    }

    fn event(name: &str) -> Event {
        Event {
            name: name.to_string(),
            date: "2023-03-05".to_string(),
        }
    }

    fn driver(abbr: &str) -> Driver {
        Driver {
            abbreviation: abbr.to_string(),
            full_name: format!("Driver {}", abbr),
            tyre_compound: None,
        }
    }

    fn telemetry(speed: f64) -> DriverTelemetry {
        let mut t = DriverTelemetry::default();
        t.series.insert(Metric::Speed, vec![speed, speed + 1.0]);
        t
    }

    fn laps(minutes: &[f64]) -> Vec<LapRecord> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, &m)| LapRecord {
                lap_number: i as u32 + 1,
                duration_minutes: m,
                tyre_compound: Some("SOFT".into()),
            })
            .collect()
    }

    fn service() -> FakeService {
        let mut service = FakeService {
            races: vec![event("Bahrain Grand Prix"), event("Saudi Arabian Grand Prix")],
            drivers: vec![driver("VER"), driver("HAM"), driver("LEC")],
            ..FakeService::default()
        };
        for (drv, speed) in [("VER", 300.0), ("HAM", 290.0), ("LEC", 295.0)] {
            service.telemetry.insert(drv.into(), telemetry(speed));
            service.laps.insert(drv.into(), laps(&[1.6, 1.5]));
        }
        service
    }

    fn dashboard_with(service: &FakeService, drivers: &[&str]) -> Dashboard {
        let mut dash = Dashboard::new(Season::new(2023).unwrap(), Session::Race);
        block_on(async {
            dash.load_events(service).await.unwrap();
            dash.load_driver_roster(service).await.unwrap();
            for drv in drivers {
                dash.add_driver_and_fetch_telemetry(service, drv).await.unwrap();
            }
        });
        dash
    }

    #[test]
    fn load_events_selects_first_event() {
        let service = service();
        let mut dash = Dashboard::default();
        block_on(dash.load_events(&service)).unwrap();
        assert_eq!(dash.selection().event(), Some("Bahrain Grand Prix"));
        assert_eq!(dash.selection().events().len(), 2);
    }

    #[test]
    fn failed_events_leave_empty_list() {
        let service = FakeService {
            races_error: Some("boom".into()),
            ..service()
        };
        let mut dash = Dashboard::default();
        let err = block_on(dash.load_events(&service)).unwrap_err();
        assert_eq!(err, ViewerError::Service("boom".into()));
        assert!(dash.selection().events().is_empty());
        assert_eq!(dash.selection().event(), None);
    }

    #[test]
    fn roster_requires_event() {
        let mut dash = Dashboard::default();
        assert_eq!(
            dash.begin_load_roster(),
            Err(ViewerError::Validation(SelectionError::NoEventSelected))
        );
    }

    #[test]
    fn roster_load_resets_selection_and_picks_first_driver() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER", "HAM"]);
        block_on(dash.load_driver_roster(&service)).unwrap();
        assert!(dash.selection().selected_drivers().is_empty());
        assert!(dash.telemetry().is_empty());
        assert!(dash.lap_times().is_empty());
        assert_eq!(dash.driver_to_add(), Some("VER"));
    }

    #[test]
    fn failed_roster_clears_roster() {
        let mut service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        service.drivers_error = Some("Session not found".into());
        let err = block_on(dash.load_driver_roster(&service)).unwrap_err();
        assert_eq!(err.to_string(), "Session not found");
        assert!(dash.selection().roster().is_empty());
        assert!(dash.selection().selected_drivers().is_empty());
        assert!(dash.telemetry().is_empty());
        assert_eq!(dash.driver_to_add(), None);
    }

    #[test]
    fn adding_drivers_merges_telemetry_and_refreshes_laps() {
        let service = service();
        let dash = dashboard_with(&service, &["VER", "HAM"]);
        assert_eq!(dash.selection().selected_drivers(), ["VER", "HAM"]);
        assert_eq!(dash.telemetry().series("VER", Metric::Speed), Some(&vec![300.0, 301.0]));
        assert_eq!(dash.telemetry().series("HAM", Metric::Speed), Some(&vec![290.0, 291.0]));
        assert_eq!(dash.lap_times().drivers().collect::<Vec<_>>(), vec!["VER", "HAM"]);
        let calls = service.calls.borrow();
        assert_eq!(
            &calls[2..],
            [
                "telemetry VER",
                "laptimes VER",
                "telemetry HAM",
                "laptimes VER,HAM"
            ]
        );
    }

    #[test]
    fn failed_telemetry_does_not_commit_selection() {
        let mut service = service();
        let mut dash = dashboard_with(&service, &["HAM"]);
        service.telemetry_error = Some("no data".into());
        let before = dash.telemetry().clone();
        let err = block_on(dash.add_driver_and_fetch_telemetry(&service, "VER")).unwrap_err();
        assert_eq!(err, ViewerError::Service("no data".into()));
        assert_eq!(dash.selection().selected_drivers(), ["HAM"]);
        assert_eq!(dash.telemetry(), &before);
    }

    #[test]
    fn duplicate_add_is_rejected_before_any_request() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        let calls_before = service.calls.borrow().len();
        let err = block_on(dash.add_driver_and_fetch_telemetry(&service, "VER")).unwrap_err();
        assert_eq!(
            err,
            ViewerError::Validation(SelectionError::DuplicateSelection("VER".into()))
        );
        assert_eq!(service.calls.borrow().len(), calls_before);
    }

    #[test]
    fn pending_driver_must_be_chosen() {
        let mut dash = Dashboard::default();
        assert_eq!(
            dash.begin_add_pending_driver(),
            Err(ViewerError::Validation(SelectionError::NoDriverChosen))
        );
    }

    #[test]
    fn removing_driver_purges_both_caches() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER", "HAM"]);
        let transition = dash.remove_driver("VER");
        assert!(!dash.telemetry().contains("VER"));
        assert!(!dash.lap_times().contains("VER"));
        let request = transition.lap_times.expect("refresh owed");
        assert_eq!(request.drivers, ["HAM"]);

        block_on(dash.fetch_lap_times(&service, &request)).unwrap();
        assert_eq!(dash.lap_times().drivers().collect::<Vec<_>>(), vec!["HAM"]);
    }

    #[test]
    fn removing_last_driver_clears_laps_without_request() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        let calls_before = service.calls.borrow().len();
        block_on(dash.remove_driver_and_refresh(&service, "VER")).unwrap();
        assert!(dash.lap_times().is_empty());
        assert_eq!(service.calls.borrow().len(), calls_before);
    }

    #[test]
    fn removing_unselected_driver_is_noop() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        let revision = dash.revision();
        let transition = dash.remove_driver("LEC");
        assert_eq!(transition.lap_times, None);
        assert_eq!(transition.revision, revision);
    }

    #[test]
    fn failed_lap_times_clear_cache() {
        let mut service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        service.laps_error = Some("Exception: boom".into());
        let err = block_on(dash.add_driver_and_fetch_telemetry(&service, "HAM")).unwrap_err();
        assert_eq!(err, ViewerError::Service("Exception: boom".into()));
        assert_eq!(dash.selection().selected_drivers(), ["VER", "HAM"]);
        assert!(dash.lap_times().is_empty());
    }

    #[test]
    fn season_change_clears_before_events_arrive() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER", "HAM"]);
        let request = dash.set_season(2024).unwrap();
        assert_eq!(request.season.year(), 2024);
        assert!(dash.selection().roster().is_empty());
        assert!(dash.selection().selected_drivers().is_empty());
        assert!(dash.telemetry().is_empty());
        assert!(dash.lap_times().is_empty());
        assert_eq!(dash.selection().event(), None);

        let result = block_on(service.races(request.season));
        dash.apply_events(&request, result).unwrap();
        assert_eq!(dash.selection().event(), Some("Bahrain Grand Prix"));
    }

    #[test]
    fn event_and_session_changes_reset_without_refetching_events() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER"]);
        let calls_before = service.calls.borrow().len();
        dash.set_event("Saudi Arabian Grand Prix").unwrap();
        assert!(dash.selection().selected_drivers().is_empty());
        assert!(dash.telemetry().is_empty());

        block_on(dash.load_driver_roster(&service)).unwrap();
        block_on(dash.add_driver_and_fetch_telemetry(&service, "LEC")).unwrap();
        let _ = dash.set_session(Session::Qualifying);
        assert!(dash.selection().roster().is_empty());
        assert!(dash.lap_times().is_empty());
        assert!(!service.calls.borrow()[calls_before..]
            .iter()
            .any(|c| c.starts_with("races")));
    }

    #[test]
    fn stale_lap_times_are_dropped() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER"]);

        let first = dash.begin_add_driver("HAM").unwrap();
        let result = block_on(service.telemetry(&first.key, &[first.driver.clone()]));
        let older = dash.apply_telemetry(&first, result).unwrap().lap_times.unwrap();
        let newer = dash.remove_driver("HAM").lap_times.unwrap();

        let stale = block_on(service.lap_times(&older.key, &older.drivers));
        let transition = dash.apply_lap_times(&older, stale).unwrap();
        assert!(!transition.applied);
        assert!(!dash.lap_times().contains("HAM"));

        block_on(dash.fetch_lap_times(&service, &newer)).unwrap();
        assert_eq!(dash.lap_times().drivers().collect::<Vec<_>>(), vec!["VER"]);
    }

    #[test]
    fn telemetry_for_previous_roster_is_dropped() {
        let service = service();
        let mut dash = dashboard_with(&service, &[]);
        let request = dash.begin_add_driver("VER").unwrap();
        block_on(dash.load_driver_roster(&service)).unwrap();

        let result = block_on(service.telemetry(&request.key, &[request.driver.clone()]));
        let transition = dash.apply_telemetry(&request, result).unwrap();
        assert!(!transition.applied);
        assert!(dash.selection().selected_drivers().is_empty());
        assert!(dash.telemetry().is_empty());
    }

    #[test]
    fn stale_roster_is_dropped_after_session_change() {
        let service = service();
        let mut dash = dashboard_with(&service, &[]);
        let request = dash.begin_load_roster().unwrap();
        let _ = dash.set_session(Session::Practice2);
        let result = block_on(service.drivers(&request.key));
        let transition = dash.apply_roster(&request, result).unwrap();
        assert!(!transition.applied);
        assert!(dash.selection().roster().is_empty());
    }

    #[test]
    fn lap_cache_keeps_only_requested_drivers_in_selection_order() {
        let service = service();
        let mut dash = dashboard_with(&service, &["VER", "HAM"]);
        let request = dash.refresh_lap_times().unwrap();
        let mut reply = IndexMap::new();
        reply.insert("LEC".to_string(), laps(&[1.4]));
        reply.insert("HAM".to_string(), laps(&[1.5]));
        reply.insert("VER".to_string(), laps(&[1.6]));
        dash.apply_lap_times(&request, Ok(reply)).unwrap();
        assert_eq!(dash.lap_times().drivers().collect::<Vec<_>>(), vec!["VER", "HAM"]);
    }
}
