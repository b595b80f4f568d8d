use crate::geodesy::Coord;
use crate::route::{Route, Waypoint};

/// Everything the codec extracts from a GPX document, in document order.
#[derive(Debug, Default)]
pub struct GpxData {
    /// `<name>` directly under the first `<rte>` that has one.
    pub route_name: Option<String>,
    /// `<name>` directly under the first `<trk>` that has one.
    pub track_name: Option<String>,
    /// `<name>` directly under `<gpx>` (GPX 1.0 style).
    pub document_name: Option<String>,
    /// Every `<rtept>` across all `<rte>` elements.
    pub route_points: Vec<GpxPoint>,
    /// Every `<trkpt>` across all tracks and segments.
    pub track_points: Vec<GpxPoint>,
}

/// A single GPX point (rtept or trkpt).
#[derive(Debug, Clone)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

impl GpxPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            name: None,
        }
    }
}

impl GpxData {
    /// Route name by priority: route, then track, then document. Empty when none.
    pub fn name(&self) -> String {
        self.route_name
            .as_ref()
            .or(self.track_name.as_ref())
            .or(self.document_name.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// Collapse into a route. Route points win over track points; track
    /// points carry no names.
    pub fn into_route(self) -> Route {
        let name = self.name();
        let waypoints = if self.route_points.is_empty() {
            self.track_points
                .into_iter()
                .map(|p| Waypoint::new(Coord::new(p.lon, p.lat), ""))
                .collect()
        } else {
            self.route_points
                .into_iter()
                .map(|p| Waypoint::new(Coord::new(p.lon, p.lat), p.name.unwrap_or_default()))
                .collect()
        };
        Route::with_waypoints(name, waypoints)
    }
}
