//! Great-circle helpers used for route legs.
//!
//! Coordinates are WGS84 longitude/latitude in degrees. Distances are
//! reported in nautical miles.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `[lon, lat]`, the GeoJSON position order.
    pub fn position(&self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for Coord {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

/// Haversine distance between two coordinates in nautical miles.
pub fn distance_nm(a: Coord, b: Coord) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_NM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial true bearing from `a` to `b` in degrees, within [0, 360).
///
/// Coincident points have no direction; they report 0.
pub fn bearing_deg(a: Coord, b: Coord) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Render a position as degrees and decimal minutes, e.g. `46°03.45'N 006°25.00'W`.
pub fn format_degrees_minutes(lat: f64, lon: f64) -> String {
    format!(
        "{} {}",
        format_axis(lat, 2, if lat >= 0.0 { 'N' } else { 'S' }),
        format_axis(lon, 3, if lon >= 0.0 { 'E' } else { 'W' }),
    )
}

fn format_axis(deg: f64, width: usize, hemisphere: char) -> String {
    // Round once on hundredths of a minute so 59.999' carries into the degree.
    let hundredths = (deg.abs() * 6000.0).round() as u64;
    let degrees = hundredths / 6000;
    let minutes = hundredths % 6000;
    format!(
        "{degrees:0width$}°{:02}.{:02}'{hemisphere}",
        minutes / 100,
        minutes % 100,
    )
}

/// Distance from `p` to the segment `v`-`w`, measured in raw degree space.
///
/// The projection parameter is clamped to [0, 1] so the closest point lies
/// on the segment itself. A degenerate segment falls back to point distance.
/// This is a planar approximation, only used to rank candidate segments when
/// inserting a waypoint; chart-scale legs are short enough for it.
pub fn project_point_onto_segment(p: Coord, v: Coord, w: Coord) -> f64 {
    let (dx, dy) = (w.lon - v.lon, w.lat - v.lat);
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return (p.lon - v.lon).hypot(p.lat - v.lat);
    }

    let t = (((p.lon - v.lon) * dx + (p.lat - v.lat) * dy) / len_sq).clamp(0.0, 1.0);
    let proj_lon = v.lon + t * dx;
    let proj_lat = v.lat + t * dy;

    (p.lon - proj_lon).hypot(p.lat - proj_lat)
}

/// Bounding box `[min_lon, min_lat, max_lon, max_lat]`, or `None` when empty.
pub fn bounds(coords: &[Coord]) -> Option<[f64; 4]> {
    let first = coords.first()?;
    let init = [first.lon, first.lat, first.lon, first.lat];

    Some(coords.iter().skip(1).fold(init, |b, c| {
        [b[0].min(c.lon), b[1].min(c.lat), b[2].max(c.lon), b[3].max(c.lat)]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lon: f64, lat: f64) -> Coord {
        Coord::new(lon, lat)
    }

    #[test]
    fn distance_same_point_is_zero() {
        let p = c(-6.0, 46.0);
        assert_eq!(distance_nm(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_sixty_nm() {
        let d = distance_nm(c(0.0, 0.0), c(0.0, 1.0));
        assert!((d - 60.04).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = c(-6.0, 46.0);
        let b = c(-5.9, 46.05);
        assert!((distance_nm(a, b) - distance_nm(b, a)).abs() < 1e-12);
        assert!((distance_nm(a, b) - 5.137).abs() < 0.01);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let o = c(0.0, 0.0);
        assert!(bearing_deg(o, c(0.0, 1.0)).abs() < 1e-9);
        assert!((bearing_deg(o, c(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(o, c(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(o, c(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_coincident_points_is_zero() {
        let p = c(12.5, -33.0);
        assert_eq!(bearing_deg(p, p), 0.0);
    }

    #[test]
    fn bearing_stays_in_range() {
        let b = bearing_deg(c(0.0, 0.0), c(-0.001, 1.0));
        assert!((0.0..360.0).contains(&b), "got {b}");
        assert!(b > 359.0);
    }

    #[test]
    fn format_example_position() {
        let lat = 46.0 + 3.45 / 60.0;
        let lon = -(6.0 + 25.0 / 60.0);
        assert_eq!(format_degrees_minutes(lat, lon), "46°03.45'N 006°25.00'W");
    }

    #[test]
    fn format_southern_eastern_hemispheres() {
        assert_eq!(format_degrees_minutes(-5.5, 151.25), "05°30.00'S 151°15.00'E");
    }

    #[test]
    fn format_carries_rounded_minutes() {
        let lat = 45.0 + 59.999 / 60.0;
        assert_eq!(format_degrees_minutes(lat, 0.0), "46°00.00'N 000°00.00'E");
    }

    #[test]
    fn projection_perpendicular_to_middle() {
        let d = project_point_onto_segment(c(0.5, 1.0), c(0.0, 0.0), c(1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn projection_clamps_to_endpoints() {
        let d = project_point_onto_segment(c(-3.0, 4.0), c(0.0, 0.0), c(1.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
        let d = project_point_onto_segment(c(4.0, 0.0), c(0.0, 0.0), c(1.0, 0.0));
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn projection_degenerate_segment() {
        let d = project_point_onto_segment(c(3.0, 4.0), c(0.0, 0.0), c(0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn finite_coordinates() {
        assert!(c(-6.0, 46.0).is_finite());
        assert!(!c(f64::NAN, 46.0).is_finite());
        assert!(!c(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn bounds_of_points() {
        assert_eq!(bounds(&[]), None);
        let b = bounds(&[c(1.0, 5.0), c(-2.0, 7.0), c(3.0, 6.0)]).unwrap();
        assert_eq!(b, [-2.0, 5.0, 3.0, 7.0]);
    }
}
