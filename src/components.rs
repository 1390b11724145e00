//! View components for the telemetry dashboard.
//!
//! Everything here renders from props; state lives in the dashboard engine
//! behind [`crate::hooks::use_dashboard`].

use f1_telemetry_viewer::{
    chart::{ChartSlot, PlotlyEngine},
    model::{Driver, Event as RaceEvent, Season, Session},
    series::{Layout, Trace},
};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::{HtmlElement, HtmlSelectElement};
use yew::prelude::*;

/// Read the chosen value from a `<select>` change event.
fn selected_value(e: &Event) -> String {
    let select: HtmlSelectElement = e.target_unchecked_into();
    select.value()
}

#[derive(Properties, PartialEq)]
pub struct SeasonSelectProps {
    pub season: Season,
    pub onchange: Callback<u16>,
}

#[function_component(SeasonSelect)]
pub fn season_select(props: &SeasonSelectProps) -> Html {
    let onchange = {
        let cb = props.onchange.clone();
        Callback::from(move |e: Event| {
            // Options only carry supported years; anything else is ignored.
            if let Ok(year) = selected_value(&e).parse::<u16>() {
                cb.emit(year);
            }
        })
    };
    html! {
        <div class="form-group">
            <label for="season">{ "Year:" }</label>
            <select id="season" {onchange}>
                { Season::all().map(|s| html! {
                    <option value={s.year().to_string()} selected={s == props.season}>
                        { s.to_string() }
                    </option>
                }).collect::<Html>() }
            </select>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct EventSelectProps {
    pub events: Rc<Vec<RaceEvent>>,
    pub selected: Option<AttrValue>,
    pub onchange: Callback<String>,
}

#[function_component(EventSelect)]
pub fn event_select(props: &EventSelectProps) -> Html {
    let onchange = props.onchange.reform(|e: Event| selected_value(&e));
    let current = props.selected.as_deref();
    html! {
        <div class="form-group">
            <label for="race">{ "Race:" }</label>
            <select id="race" {onchange} disabled={props.events.is_empty()}>
                { props.events.iter().map(|ev| html! {
                    <option key={ev.name.clone()}
                        value={ev.name.clone()}
                        selected={current == Some(ev.name.as_str())}
                    >
                        { ev.name.clone() }
                    </option>
                }).collect::<Html>() }
            </select>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SessionSelectProps {
    pub session: Session,
    pub onchange: Callback<Session>,
}

#[function_component(SessionSelect)]
pub fn session_select(props: &SessionSelectProps) -> Html {
    let onchange = {
        let cb = props.onchange.clone();
        Callback::from(move |e: Event| {
            if let Some(session) = Session::from_wire_name(&selected_value(&e)) {
                cb.emit(session);
            }
        })
    };
    html! {
        <div class="form-group">
            <label for="session">{ "Session:" }</label>
            <select id="session" {onchange}>
                { Session::ALL.iter().map(|&s| html! {
                    <option value={s.wire_name()} selected={s == props.session}>
                        { s.wire_name() }
                    </option>
                }).collect::<Html>() }
            </select>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DriverPickerProps {
    pub roster: Rc<Vec<Driver>>,
    pub pending: Option<AttrValue>,
    pub onpick: Callback<String>,
    pub onadd: Callback<()>,
}

/// Roster dropdown plus the Add button. Hidden until a roster is loaded.
#[function_component(DriverPicker)]
pub fn driver_picker(props: &DriverPickerProps) -> Html {
    if props.roster.is_empty() {
        return html! {};
    }
    let onchange = props.onpick.reform(|e: Event| selected_value(&e));
    let onclick = props.onadd.reform(|_: MouseEvent| ());
    let pending = props.pending.as_deref();
    html! {
        <div class="form-group driver-picker">
            <label for="driver">{ "Select and Add Driver:" }</label>
            <select id="driver" {onchange}>
                { props.roster.iter().map(|d| html! {
                    <option key={d.abbreviation.clone()}
                        value={d.abbreviation.clone()}
                        selected={pending == Some(d.abbreviation.as_str())}
                    >
                        { format!("{} ({})", d.full_name, d.abbreviation) }
                    </option>
                }).collect::<Html>() }
            </select>
            <button class="btn-secondary" {onclick}>{ "Add" }</button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SelectedDriversProps {
    pub drivers: Rc<Vec<String>>,
    pub onremove: Callback<String>,
}

#[function_component(SelectedDrivers)]
pub fn selected_drivers(props: &SelectedDriversProps) -> Html {
    if props.drivers.is_empty() {
        return html! {};
    }
    html! {
        <div class="selected-drivers">
            <h3>{ "Selected Drivers:" }</h3>
            <ul>
                { props.drivers.iter().map(|driver| {
                    let onclick = {
                        let cb = props.onremove.clone();
                        let driver = driver.clone();
                        Callback::from(move |_: MouseEvent| cb.emit(driver.clone()))
                    };
                    html! {
                        <li key={driver.clone()}>
                            <span>{ driver.clone() }</span>
                            <button class="btn-danger small" {onclick}>{ "Remove" }</button>
                        </li>
                    }
                }).collect::<Html>() }
            </ul>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ChartPanelProps {
    pub heading: AttrValue,
    pub traces: Rc<Vec<Trace>>,
    pub layout: Rc<Layout>,
}

/// One chart surface. The Plotly instance is created on first render,
/// updated in place while the trace set is stable, and purged on unmount.
#[function_component(ChartPanel)]
pub fn chart_panel(props: &ChartPanelProps) -> Html {
    let node = use_node_ref();
    let slot: Rc<RefCell<Option<ChartSlot<PlotlyEngine>>>> = use_mut_ref(|| None);

    {
        let node = node.clone();
        let slot = slot.clone();
        use_effect_with(
            (props.traces.clone(), props.layout.clone()),
            move |(traces, layout)| {
                let mut current = slot.borrow_mut();
                if current.is_none() {
                    if let Some(element) = node.cast::<HtmlElement>() {
                        *current = Some(ChartSlot::new(PlotlyEngine, element));
                    }
                }
                if let Some(slot) = current.as_mut() {
                    // Failures are already logged by the slot; the panel stays blank.
                    let _ = slot.render(traces, layout);
                }
                || ()
            },
        );
    }

    {
        let slot = slot.clone();
        use_effect_with((), move |_| {
            move || {
                slot.borrow_mut().take();
            }
        });
    }

    html! {
        <div class="chart-panel">
            <h2>{ props.heading.clone() }</h2>
            <div class="chart-surface" ref={node}></div>
        </div>
    }
}
