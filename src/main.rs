//! F1 telemetry viewer frontend.
//! Wires the selection sidebar, the dashboard hooks, and the chart panels.

use std::rc::Rc;
use yew::prelude::*;

mod components;
mod hooks;
mod logger;

use components::{
    ChartPanel, DriverPicker, EventSelect, SeasonSelect, SelectedDrivers, SessionSelect,
};
use hooks::{use_chart_set, use_dashboard};

#[function_component]
pub fn App() -> Html {
    let handle = use_dashboard();
    let charts = use_chart_set(&handle);

    // Snapshot what the sidebar needs; the borrow ends before any callback runs.
    let (season, events, event, session, roster, selected, pending) = {
        let dashboard = handle.state.borrow();
        let selection = dashboard.selection();
        (
            selection.season(),
            Rc::new(selection.events().to_vec()),
            selection.event().map(|e| AttrValue::from(e.to_string())),
            selection.session(),
            Rc::new(selection.roster().to_vec()),
            Rc::new(selection.selected_drivers().to_vec()),
            dashboard.driver_to_add().map(|d| AttrValue::from(d.to_string())),
        )
    };

    let on_load_drivers = handle.on_load_drivers.reform(|_: MouseEvent| ());

    html! {
        <div class="app-container">
            <aside class="sidebar">
                <h1>{ "F1 Telemetry Viewer" }</h1>
                <SeasonSelect {season} onchange={handle.on_season.clone()} />
                <EventSelect {events} selected={event} onchange={handle.on_event.clone()} />
                <SessionSelect {session} onchange={handle.on_session.clone()} />
                <button class="btn-primary" onclick={on_load_drivers}>{ "Load Drivers" }</button>
                <DriverPicker
                    {roster}
                    {pending}
                    onpick={handle.on_pick_driver.clone()}
                    onadd={handle.on_add_driver.clone()}
                />
                <SelectedDrivers drivers={selected} onremove={handle.on_remove_driver.clone()} />
            </aside>

            <main class="charts">
                { charts.metrics.iter().map(|(metric, traces, layout)| html! {
                    <ChartPanel
                        key={metric.wire_key()}
                        heading={format!("{} Chart", metric.label())}
                        traces={traces.clone()}
                        layout={layout.clone()}
                    />
                }).collect::<Html>() }

                if !charts.laps.is_empty() {
                    <ChartPanel
                        heading="Lap Times Comparison"
                        traces={Rc::new(charts.laps.traces.clone())}
                        layout={charts.lap_layout.clone()}
                    />
                }
            </main>
        </div>
    }
}

/// Entry point: panic hook, console logging, then mount the app.
fn main() {
    console_error_panic_hook::set_once();
    logger::init(logger::default_level());
    log::info!("Starting F1 telemetry viewer");
    yew::Renderer::<App>::new().render();
}
