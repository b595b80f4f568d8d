pub mod discovery;
pub mod engine;
pub mod error;
pub mod geodesy;
pub mod gpx_types;
pub mod options;
pub mod parser;
pub mod render;
pub mod route;
pub mod writer;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::engine::{Collection, RouteEngine};
use crate::error::RouteError;
use crate::geodesy::Coord;
use crate::options::DiscoveryOptions;

/// Route editor exposed to the chart UI. Every gesture is a method call;
/// the UI re-reads `renderSources()` after each successful mutation.
#[wasm_bindgen]
pub struct RouteEditor {
    engine: RouteEngine,
}

#[wasm_bindgen]
impl RouteEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> RouteEditor {
        console_error_panic_hook::set_once();
        RouteEditor {
            engine: RouteEngine::new(),
        }
    }

    #[wasm_bindgen(js_name = startNewRoute)]
    pub fn start_new_route(&mut self) -> usize {
        self.engine.start_new_route()
    }

    #[wasm_bindgen(js_name = endRoute)]
    pub fn end_route(&mut self) -> Result<(), JsValue> {
        Ok(self.engine.end_route()?)
    }

    #[wasm_bindgen(js_name = setActive)]
    pub fn set_active(&mut self, collection: JsValue, index: usize) -> Result<(), JsValue> {
        Ok(self.engine.set_active(parse_collection(collection)?, index)?)
    }

    #[wasm_bindgen(js_name = deleteRoute)]
    pub fn delete_route(&mut self, collection: JsValue, index: usize) -> Result<(), JsValue> {
        self.engine.delete_route(parse_collection(collection)?, index)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = copyProvidedToWorking)]
    pub fn copy_provided_to_working(&mut self, index: usize) -> Result<usize, JsValue> {
        Ok(self.engine.copy_provided_to_working(index)?)
    }

    #[wasm_bindgen(js_name = toggleVisibility)]
    pub fn toggle_visibility(
        &mut self,
        collection: JsValue,
        index: usize,
    ) -> Result<bool, JsValue> {
        Ok(self.engine.toggle_visibility(parse_collection(collection)?, index)?)
    }

    #[wasm_bindgen(js_name = renameRoute)]
    pub fn rename_route(
        &mut self,
        collection: JsValue,
        index: usize,
        name: &str,
    ) -> Result<(), JsValue> {
        Ok(self.engine.rename_route(parse_collection(collection)?, index, name)?)
    }

    #[wasm_bindgen(js_name = addWaypoint)]
    pub fn add_waypoint(&mut self, lon: f64, lat: f64) -> Result<usize, JsValue> {
        Ok(self.engine.add_waypoint(Coord::new(lon, lat))?)
    }

    #[wasm_bindgen(js_name = insertNear)]
    pub fn insert_near(&mut self, lon: f64, lat: f64) -> Result<usize, JsValue> {
        Ok(self.engine.insert_near(Coord::new(lon, lat))?)
    }

    #[wasm_bindgen(js_name = deleteWaypoint)]
    pub fn delete_waypoint(&mut self, index: usize) -> Result<(), JsValue> {
        Ok(self.engine.delete_waypoint(index)?)
    }

    #[wasm_bindgen(js_name = renameWaypoint)]
    pub fn rename_waypoint(&mut self, index: usize, name: &str) -> Result<(), JsValue> {
        Ok(self.engine.rename_waypoint(index, name)?)
    }

    #[wasm_bindgen(js_name = moveWaypoint)]
    pub fn move_waypoint(&mut self, index: usize, lon: f64, lat: f64) -> Result<(), JsValue> {
        Ok(self.engine.move_waypoint(index, Coord::new(lon, lat))?)
    }

    /// `{ filename, contents }` for the active route.
    #[wasm_bindgen(js_name = exportActive)]
    pub fn export_active(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.export_active(&now_iso8601())?)
    }

    #[wasm_bindgen(js_name = exportRoute)]
    pub fn export_route(&self, collection: JsValue, index: usize) -> Result<JsValue, JsValue> {
        let collection = parse_collection(collection)?;
        to_js(&self.engine.export_route(collection, index, &now_iso8601())?)
    }

    #[wasm_bindgen(js_name = importText)]
    pub fn import_text(
        &mut self,
        gpx_text: &str,
        fallback_name: Option<String>,
    ) -> Result<usize, JsValue> {
        Ok(self.engine.import_text(gpx_text, fallback_name.as_deref())?)
    }

    /// Feed one fetched provided resource. Returns the new index, or
    /// `undefined` when the document holds no points.
    #[wasm_bindgen(js_name = ingestProvided)]
    pub fn ingest_provided(
        &mut self,
        resource_name: &str,
        gpx_text: &str,
    ) -> Result<Option<usize>, JsValue> {
        Ok(discovery::ingest_provided(&mut self.engine, resource_name, gpx_text)?)
    }

    #[wasm_bindgen(js_name = renderSources)]
    pub fn render_sources(&self) -> Result<JsValue, JsValue> {
        to_js(&render::snapshot(&self.engine))
    }

    /// Waypoint table rows of the active route.
    #[wasm_bindgen(js_name = activeLegs)]
    pub fn active_legs(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.active_legs())
    }

    #[wasm_bindgen(js_name = activeTotalLengthNm)]
    pub fn active_total_length_nm(&self) -> f64 {
        self.engine.active_route().map_or(0.0, |r| r.total_length_nm())
    }

    /// `[minLon, minLat, maxLon, maxLat]` of the active route, if any.
    #[wasm_bindgen(js_name = activeBounds)]
    pub fn active_bounds(&self) -> Option<Vec<f64>> {
        self.engine.active_route()?.bounds().map(|b| b.to_vec())
    }

    #[wasm_bindgen(js_name = routes)]
    pub fn routes(&self, collection: JsValue) -> Result<JsValue, JsValue> {
        to_js(&self.engine.summaries(parse_collection(collection)?))
    }
}

impl Default for RouteEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the provided resources to fetch, given the manifest text if the
/// host could fetch one.
#[wasm_bindgen(js_name = discoveryPlan)]
pub fn discovery_plan(
    manifest_text: Option<String>,
    options: JsValue,
) -> Result<Vec<String>, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let names = manifest_text
        .as_deref()
        .and_then(discovery::parse_manifest)
        .filter(|names| !names.is_empty())
        .unwrap_or_else(|| opts.probe_names());
    Ok(names.iter().map(|n| opts.resource_path(n)).collect())
}

/// Format a position as degrees and decimal minutes.
#[wasm_bindgen(js_name = formatDegreesMinutes)]
pub fn format_degrees_minutes(lat: f64, lon: f64) -> String {
    geodesy::format_degrees_minutes(lat, lon)
}

fn parse_options(options: JsValue) -> Result<DiscoveryOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(DiscoveryOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| RouteError::InvalidArgument(e.to_string()).into())
    }
}

fn parse_collection(collection: JsValue) -> Result<Collection, JsValue> {
    serde_wasm_bindgen::from_value(collection)
        .map_err(|e| RouteError::InvalidArgument(format!("collection: {e}")).into())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn now_iso8601() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}
