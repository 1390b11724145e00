use f1_telemetry_viewer::{
    config::{API_BASE_URL, API_QUERY_PARAM},
    dashboard::{Dashboard, EventsRequest, LapTimesRequest, RosterRequest, TelemetryRequest, Transition},
    error::ViewerError,
    model::{Metric, Season, Session},
    series::{lap_layout, lap_time_chart, metric_layout, metric_traces, LapChart, Layout, Trace},
    service::{DataService, HttpDataService},
};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Shared engine plus the callbacks the view wires to its controls.
#[derive(Clone)]
pub struct DashboardHandle {
    /// Borrow during render only; never across an await.
    pub state: Rc<RefCell<Dashboard>>,
    /// Changes whenever the engine mutates, forcing a re-render.
    pub revision: u64,
    pub on_season: Callback<u16>,
    pub on_event: Callback<String>,
    pub on_session: Callback<Session>,
    pub on_load_drivers: Callback<()>,
    pub on_pick_driver: Callback<String>,
    pub on_add_driver: Callback<()>,
    pub on_remove_driver: Callback<String>,
}

/// Everything async callbacks need to reach back into the engine.
#[derive(Clone)]
struct EngineLink {
    state: Rc<RefCell<Dashboard>>,
    service: Rc<HttpDataService>,
    revision: UseStateHandle<u64>,
}

impl EngineLink {
    /// Publish the engine's revision so Yew re-renders.
    fn publish(&self) {
        let revision = self.state.borrow().revision();
        self.revision.set(revision);
    }

    fn fail(&self, action: &str, err: ViewerError) {
        self.publish();
        notify(&err.notification(action));
    }

    fn settle(&self, action: &str, outcome: Result<Transition, ViewerError>) {
        match outcome {
            Ok(transition) => self.follow(transition),
            Err(err) => self.fail(action, err),
        }
    }

    fn follow(&self, transition: Transition) {
        self.publish();
        if let Some(request) = transition.lap_times {
            self.fetch_lap_times(request);
        }
    }

    fn fetch_events(&self, request: EventsRequest) {
        self.publish();
        let link = self.clone();
        spawn_local(async move {
            let result = link.service.races(request.season).await;
            let outcome = link.state.borrow_mut().apply_events(&request, result);
            link.settle("Failed to load races", outcome);
        });
    }

    fn fetch_roster(&self, request: RosterRequest) {
        let link = self.clone();
        spawn_local(async move {
            let result = link.service.drivers(&request.key).await;
            let outcome = link.state.borrow_mut().apply_roster(&request, result);
            link.settle("Failed to load drivers", outcome);
        });
    }

    fn fetch_telemetry(&self, request: TelemetryRequest) {
        let link = self.clone();
        spawn_local(async move {
            let drivers = [request.driver.clone()];
            let result = link.service.telemetry(&request.key, &drivers).await;
            let outcome = link.state.borrow_mut().apply_telemetry(&request, result);
            link.settle("Failed to fetch telemetry data", outcome);
        });
    }

    fn fetch_lap_times(&self, request: LapTimesRequest) {
        let link = self.clone();
        spawn_local(async move {
            let result = link.service.lap_times(&request.key, &request.drivers).await;
            let outcome = link.state.borrow_mut().apply_lap_times(&request, result);
            link.settle("Error loading lap times", outcome);
        });
    }
}

/// Blocking notification, like the browser's own `alert`.
pub fn notify(message: &str) {
    warn!("{}", message);
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// Base URL of the data service: `?api=` on the page URL wins over the
/// build-time default.
fn api_base_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get(API_QUERY_PARAM))
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| API_BASE_URL.clone())
}

#[hook]
pub fn use_dashboard() -> DashboardHandle {
    let state = use_mut_ref(|| Dashboard::new(Season::default(), Session::default()));
    let revision = use_state(|| 0u64);
    let service = use_memo((), |_| {
        let url = api_base_url();
        info!("Using data service at {}", url);
        HttpDataService::new(url)
    });

    let link = EngineLink {
        state: state.clone(),
        service,
        revision: revision.clone(),
    };

    // Initial event list for the default season
    {
        let link = link.clone();
        use_effect_with((), move |_| {
            let request = link.state.borrow_mut().begin_load_events();
            link.fetch_events(request);
            || ()
        });
    }

    let on_season = {
        let link = link.clone();
        Callback::from(move |year: u16| {
            let outcome = link.state.borrow_mut().set_season(year);
            match outcome {
                Ok(request) => link.fetch_events(request),
                Err(err) => link.fail("Cannot change season", err),
            }
        })
    };

    let on_event = {
        let link = link.clone();
        Callback::from(move |name: String| {
            let outcome = link.state.borrow_mut().set_event(&name);
            link.settle("Cannot select race", outcome);
        })
    };

    let on_session = {
        let link = link.clone();
        Callback::from(move |session: Session| {
            let transition = link.state.borrow_mut().set_session(session);
            link.follow(transition);
        })
    };

    let on_load_drivers = {
        let link = link.clone();
        Callback::from(move |_| {
            let outcome = link.state.borrow_mut().begin_load_roster();
            match outcome {
                Ok(request) => link.fetch_roster(request),
                Err(err) => link.fail("Cannot load drivers", err),
            }
        })
    };

    let on_pick_driver = {
        let link = link.clone();
        Callback::from(move |abbreviation: String| {
            link.state.borrow_mut().set_driver_to_add(Some(abbreviation));
            link.publish();
        })
    };

    let on_add_driver = {
        let link = link.clone();
        Callback::from(move |_| {
            let outcome = link.state.borrow_mut().begin_add_pending_driver();
            match outcome {
                Ok(request) => link.fetch_telemetry(request),
                Err(err) => link.fail("Cannot add driver", err),
            }
        })
    };

    let on_remove_driver = {
        let link = link.clone();
        Callback::from(move |abbreviation: String| {
            let transition = link.state.borrow_mut().remove_driver(&abbreviation);
            link.follow(transition);
        })
    };

    DashboardHandle {
        state,
        revision: *revision,
        on_season,
        on_event,
        on_session,
        on_load_drivers,
        on_pick_driver,
        on_add_driver,
        on_remove_driver,
    }
}

/// Traces and layouts for every panel, rebuilt only when the engine's
/// revision moves.
#[derive(PartialEq)]
pub struct ChartSet {
    pub metrics: Vec<(Metric, Rc<Vec<Trace>>, Rc<Layout>)>,
    pub laps: Rc<LapChart>,
    pub lap_layout: Rc<Layout>,
}

#[hook]
pub fn use_chart_set(handle: &DashboardHandle) -> Rc<ChartSet> {
    let state = handle.state.clone();
    use_memo(handle.revision, move |_| {
        let dashboard = state.borrow();
        let selected = dashboard.selection().selected_drivers();
        let metrics = Metric::ALL
            .iter()
            .map(|&metric| {
                (
                    metric,
                    Rc::new(metric_traces(metric, selected, dashboard.telemetry())),
                    Rc::new(metric_layout(metric)),
                )
            })
            .collect();
        let laps = lap_time_chart(dashboard.lap_times());
        let layout = lap_layout(&laps.ticks);
        ChartSet {
            metrics,
            laps: Rc::new(laps),
            lap_layout: Rc::new(layout),
        }
    })
}
