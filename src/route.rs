//! Route payload shared by working and provided routes.
//!
//! A waypoint has no identity beyond its position in the route. Coordinates
//! and names are stored together, so every mutation keeps them paired.

use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::geodesy::{self, Coord};

/// A route point with an optional (possibly empty) name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub coord: Coord,
    pub name: String,
}

impl Waypoint {
    pub fn new(coord: Coord, name: impl Into<String>) -> Self {
        Self {
            coord,
            name: name.into(),
        }
    }
}

/// One row of the waypoint table shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    /// 1-based waypoint number.
    pub number: usize,
    pub name: String,
    pub position: String,
    /// Bearing and distance from the previous waypoint; absent on the first row.
    pub bearing_deg: Option<f64>,
    pub distance_nm: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub name: String,
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            waypoints: Vec::new(),
        }
    }

    pub fn with_waypoints(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            waypoints,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn coords(&self) -> Vec<Coord> {
        self.waypoints.iter().map(|w| w.coord).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.waypoints.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn append(&mut self, coord: Coord) {
        self.waypoints.push(Waypoint::new(coord, ""));
    }

    /// Insert at `index`, which may equal the current length.
    pub fn insert_at(&mut self, index: usize, coord: Coord, name: impl Into<String>) -> Result<()> {
        if index > self.waypoints.len() {
            return Err(RouteError::index(index, self.waypoints.len()));
        }
        self.waypoints.insert(index, Waypoint::new(coord, name));
        Ok(())
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Waypoint> {
        self.check_index(index)?;
        Ok(self.waypoints.remove(index))
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.waypoints[index].name = name.into();
        Ok(())
    }

    pub fn move_to(&mut self, index: usize, coord: Coord) -> Result<()> {
        self.check_index(index)?;
        self.waypoints[index].coord = coord;
        Ok(())
    }

    /// Index at which a point clicked "on the line" should be inserted.
    ///
    /// Picks the segment closest to `coord` (first one wins on ties) and
    /// returns the index just after its start. Routes with fewer than two
    /// waypoints have no segments, so the point goes at the end.
    pub fn nearest_insert_index(&self, coord: Coord) -> usize {
        let mut best = (f64::INFINITY, self.waypoints.len());

        for (i, pair) in self.waypoints.windows(2).enumerate() {
            let dist = geodesy::project_point_onto_segment(coord, pair[0].coord, pair[1].coord);
            if dist < best.0 {
                best = (dist, i + 1);
            }
        }

        best.1
    }

    /// Distance of the segment ending at waypoint `index`.
    pub fn segment_distance(&self, index: usize) -> Result<f64> {
        let (a, b) = self.segment(index)?;
        Ok(geodesy::distance_nm(a, b))
    }

    /// Bearing of the segment ending at waypoint `index`.
    pub fn segment_bearing(&self, index: usize) -> Result<f64> {
        let (a, b) = self.segment(index)?;
        Ok(geodesy::bearing_deg(a, b))
    }

    pub fn total_length_nm(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| geodesy::distance_nm(w[0].coord, w[1].coord))
            .sum()
    }

    pub fn bounds(&self) -> Option<[f64; 4]> {
        geodesy::bounds(&self.coords())
    }

    pub fn legs(&self) -> Vec<Leg> {
        self.waypoints
            .iter()
            .enumerate()
            .map(|(i, wp)| {
                let prev = i.checked_sub(1).map(|p| self.waypoints[p].coord);
                Leg {
                    number: i + 1,
                    name: wp.name.clone(),
                    position: geodesy::format_degrees_minutes(wp.coord.lat, wp.coord.lon),
                    bearing_deg: prev.map(|p| geodesy::bearing_deg(p, wp.coord)),
                    distance_nm: prev.map(|p| geodesy::distance_nm(p, wp.coord)),
                }
            })
            .collect()
    }

    fn segment(&self, index: usize) -> Result<(Coord, Coord)> {
        if index == 0 || self.waypoints.len() < 2 {
            return Err(RouteError::InsufficientWaypoints);
        }
        self.check_index(index)?;
        Ok((self.waypoints[index - 1].coord, self.waypoints[index].coord))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.waypoints.len() {
            Ok(())
        } else {
            Err(RouteError::index(index, self.waypoints.len()))
        }
    }
}
