//! Boundary to the chart-drawing engine.
//!
//! A [`ChartSlot`] owns one drawing surface for as long as a panel shows it.
//! The engine is told to release the surface exactly once: before a redraw
//! with a different set of traces, or when the slot is dropped.

use crate::series::{Layout, Trace};
use log::{debug, warn};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Something that can draw traces onto a surface and free it again.
pub trait ChartEngine {
    type Surface;
    type Error: std::fmt::Display;

    /// Create the plot, or update it in place if one already exists.
    fn render(
        &self,
        surface: &Self::Surface,
        traces: &[Trace],
        layout: &Layout,
    ) -> Result<(), Self::Error>;

    fn dispose(&self, surface: &Self::Surface);
}

/// Identity of a trace set: names plus the exact sample bits.
pub fn trace_identity(traces: &[Trace]) -> u64 {
    let mut hasher = DefaultHasher::new();
    traces.len().hash(&mut hasher);
    for trace in traces {
        trace.name.hash(&mut hasher);
        trace.mode.hash(&mut hasher);
        if let Some(x) = &trace.x {
            x.len().hash(&mut hasher);
            x.iter().for_each(|v| v.to_bits().hash(&mut hasher));
        }
        trace.y.len().hash(&mut hasher);
        trace.y.iter().for_each(|v| v.to_bits().hash(&mut hasher));
    }
    hasher.finish()
}

/// One surface and the plot currently drawn on it.
pub struct ChartSlot<E: ChartEngine> {
    engine: E,
    surface: E::Surface,
    drawn: Option<u64>,
}

impl<E: ChartEngine> ChartSlot<E> {
    pub fn new(engine: E, surface: E::Surface) -> Self {
        Self {
            engine,
            surface,
            drawn: None,
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn.is_some()
    }

    pub fn render(&mut self, traces: &[Trace], layout: &Layout) -> Result<(), E::Error> {
        let identity = trace_identity(traces);
        if self.drawn.is_some_and(|current| current != identity) {
            debug!("Trace set changed, releasing previous plot");
            self.release();
        }
        match self.engine.render(&self.surface, traces, layout) {
            Ok(()) => {
                self.drawn = Some(identity);
                Ok(())
            }
            Err(err) => {
                warn!("Chart render failed: {}", err);
                Err(err)
            }
        }
    }

    /// Free the engine's resources for this surface. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.drawn.take().is_some() {
            self.engine.dispose(&self.surface);
        }
    }
}

impl<E: ChartEngine> Drop for ChartSlot<E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[wasm_bindgen(module = "/plotly_bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = renderChart, catch)]
    fn render_chart(
        element: &web_sys::HtmlElement,
        traces: JsValue,
        layout: JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = purgeChart)]
    fn purge_chart(element: &web_sys::HtmlElement);
}

/// Plotly, loaded globally by the host page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyEngine;

impl ChartEngine for PlotlyEngine {
    type Surface = web_sys::HtmlElement;
    type Error = String;

    fn render(
        &self,
        surface: &Self::Surface,
        traces: &[Trace],
        layout: &Layout,
    ) -> Result<(), String> {
        let traces = serde_wasm_bindgen::to_value(traces).map_err(|e| e.to_string())?;
        let layout = serde_wasm_bindgen::to_value(layout).map_err(|e| e.to_string())?;
        render_chart(surface, traces, layout).map_err(js_error_message)
    }

    fn dispose(&self, surface: &Self::Surface) {
        purge_chart(surface);
    }
}

/// Message of a thrown JS `Error`, or the debug form of any other value.
fn js_error_message(value: JsValue) -> String {
    match value.dyn_into::<js_sys::Error>() {
        Ok(err) => String::from(err.message()),
        Err(other) => format!("{:?}", other),
    }
}
