//! GeoJSON snapshots handed to the map surface.
//!
//! The renderer never reads back into the engine; it only replaces the data
//! of each source id after every mutation.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::engine::{Collection, RouteEngine};
use crate::route::Route;

/// Source id of the editor surface showing the active route.
pub const EDITOR_SOURCE_ID: &str = "route";

/// Source id for a visible route in `collection` at `index`.
pub fn route_source_id(collection: Collection, index: usize) -> String {
    let ns = match collection {
        Collection::Working => "saved",
        Collection::Provided => "provided",
    };
    format!("route-src-{ns}-{index}")
}

/// Feature data for one map source.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSource {
    pub id: String,
    pub data: FeatureCollection,
}

/// Line for two or more waypoints, plus one named point per waypoint.
pub fn route_features(route: &Route) -> FeatureCollection {
    let mut features = Vec::with_capacity(route.len() + 1);

    if route.len() >= 2 {
        let coords: Vec<Vec<f64>> = route.coords().iter().map(|c| c.position()).collect();
        features.push(feature(Value::LineString(coords), Map::new()));
    }

    for (i, wp) in route.waypoints().iter().enumerate() {
        let mut props = Map::new();
        props.insert("name".to_string(), JsonValue::String(wp.name.clone()));
        props.insert("index".to_string(), JsonValue::Number(i.into()));
        features.push(feature(Value::Point(wp.coord.position()), props));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Features of the active route; empty when nothing is active.
pub fn editor_features(engine: &RouteEngine) -> FeatureCollection {
    match engine.active_route() {
        Some(route) => route_features(route),
        None => FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        },
    }
}

/// Every source the renderer should show: the editor first, then each
/// visible route of both collections.
pub fn snapshot(engine: &RouteEngine) -> Vec<RenderSource> {
    let mut sources = vec![RenderSource {
        id: EDITOR_SOURCE_ID.to_string(),
        data: editor_features(engine),
    }];

    for collection in [Collection::Working, Collection::Provided] {
        for index in 0..engine.len(collection) {
            if !engine.is_visible(collection, index).unwrap_or(false) {
                continue;
            }
            if let Ok(route) = engine.route(collection, index) {
                sources.push(RenderSource {
                    id: route_source_id(collection, index),
                    data: route_features(route),
                });
            }
        }
    }

    sources
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Coord;

    #[test]
    fn test_single_waypoint_has_no_line() {
        let mut route = Route::new("r");
        route.append(Coord::new(1.0, 2.0));
        let fc = route_features(&route);
        assert_eq!(fc.features.len(), 1);
        let geom = fc.features[0].geometry.as_ref().unwrap();
        assert_eq!(geom.value, Value::Point(vec![1.0, 2.0]));
    }

    #[test]
    fn test_line_and_named_points() {
        let mut route = Route::new("r");
        route.append(Coord::new(0.0, 0.0));
        route.append(Coord::new(1.0, 1.0));
        route.rename(1, "Buoy").unwrap();
        let fc = route_features(&route);

        assert_eq!(fc.features.len(), 3);
        let line = fc.features[0].geometry.as_ref().unwrap();
        assert_eq!(
            line.value,
            Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]])
        );
        let props = fc.features[2].properties.as_ref().unwrap();
        assert_eq!(props["name"], "Buoy");
        assert_eq!(props["index"], 1);
    }

    #[test]
    fn test_editor_empty_without_active_route() {
        let engine = RouteEngine::new();
        assert!(editor_features(&engine).features.is_empty());
        let sources = snapshot(&engine);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "route");
    }

    #[test]
    fn test_snapshot_lists_visible_routes() {
        let mut engine = RouteEngine::new();
        let mut provided = Route::new("P");
        provided.append(Coord::new(5.0, 5.0));
        engine.add_provided(provided.clone());
        engine.add_provided(provided);
        engine.toggle_visibility(Collection::Provided, 1).unwrap();

        engine.start_new_route();
        engine.add_waypoint(Coord::new(0.0, 0.0)).unwrap();

        let ids: Vec<_> = snapshot(&engine).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["route", "route-src-saved-0", "route-src-provided-1"]);
    }

    #[test]
    fn test_snapshot_serializes_as_geojson() {
        let mut engine = RouteEngine::new();
        engine.start_new_route();
        engine.add_waypoint(Coord::new(0.0, 0.0)).unwrap();
        let json = serde_json::to_value(snapshot(&engine)).unwrap();
        assert_eq!(json[0]["data"]["type"], "FeatureCollection");
        assert_eq!(json[0]["data"]["features"][0]["geometry"]["type"], "Point");
    }
}
