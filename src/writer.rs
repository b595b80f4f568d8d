use quick_xml::escape::escape;
use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::route::Route;

const CREATOR: &str = "route-engine-wasm";

/// A serialized route ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedGpx {
    pub filename: String,
    pub contents: String,
}

/// Serialize a route as GPX: a `<rte>` with named points followed by a
/// `<trk>` breadcrumb of the same coordinates.
///
/// `timestamp` goes into `<metadata><time>` verbatim and should be ISO 8601.
pub fn write_gpx(route: &Route, timestamp: &str) -> Result<String> {
    if route.is_empty() {
        return Err(RouteError::EmptyRoute);
    }

    let name = escape(route.name.as_str());
    let mut gpx = String::new();

    gpx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<gpx version="1.1" creator="{CREATOR}" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><time>{timestamp}</time></metadata>
  <rte>
    <name>{name}</name>
"#
    ));

    for (i, wp) in route.waypoints().iter().enumerate() {
        let wp_name = if wp.name.is_empty() {
            format!("WP{}", i + 1)
        } else {
            wp.name.clone()
        };
        gpx.push_str(&format!(
            r#"    <rtept lat="{:.6}" lon="{:.6}"><name>{}</name></rtept>
"#,
            wp.coord.lat,
            wp.coord.lon,
            escape(wp_name.as_str()),
        ));
    }

    gpx.push_str(&format!(
        r#"  </rte>
  <trk>
    <name>{name}</name>
    <trkseg>
"#
    ));

    for wp in route.waypoints() {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.6}" lon="{:.6}"/>
"#,
            wp.coord.lat, wp.coord.lon,
        ));
    }

    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    Ok(gpx)
}

/// Serialize a route together with its download file name.
pub fn export_route(route: &Route, timestamp: &str) -> Result<ExportedGpx> {
    Ok(ExportedGpx {
        contents: write_gpx(route, timestamp)?,
        filename: export_filename(&route.name),
    })
}

/// `<name>.gpx` with every non-alphanumeric character replaced by `_`.
pub fn export_filename(route_name: &str) -> String {
    if route_name.is_empty() {
        return "route.gpx".to_string();
    }
    let stem: String = route_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}.gpx")
}
