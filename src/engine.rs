//! Route collections and the active-route state machine.
//!
//! The engine owns every route. Working routes are user-authored and
//! editable; provided routes are loaded at startup and can only be copied
//! into the working set. At most one route across both collections is
//! active, tracked by a single [`EditState`] pointer.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::geodesy::Coord;
use crate::parser;
use crate::route::{Leg, Route};
use crate::writer::{self, ExportedGpx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Working,
    Provided,
}

/// Which route, if any, is the target of waypoint gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    NoActiveRoute,
    EditingWorkingRoute(usize),
    /// A provided route selected for inspection; edits are refused.
    EditingProvidedSelection(usize),
}

impl EditState {
    fn target(self) -> Option<(Collection, usize)> {
        match self {
            Self::NoActiveRoute => None,
            Self::EditingWorkingRoute(i) => Some((Collection::Working, i)),
            Self::EditingProvidedSelection(i) => Some((Collection::Provided, i)),
        }
    }

    fn pointing_at(collection: Collection, index: usize) -> Self {
        match collection {
            Collection::Working => Self::EditingWorkingRoute(index),
            Collection::Provided => Self::EditingProvidedSelection(index),
        }
    }
}

/// A user-authored route.
#[derive(Debug, Clone)]
pub struct WorkingRoute {
    pub route: Route,
    pub visible: bool,
}

/// A template route loaded at startup. Its payload is only reachable
/// through a shared reference.
#[derive(Debug, Clone)]
pub struct ProvidedRoute {
    route: Route,
    pub visible: bool,
}

impl ProvidedRoute {
    pub fn route(&self) -> &Route {
        &self.route
    }
}

/// Row of a route list panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub index: usize,
    pub name: String,
    pub waypoint_count: usize,
    pub total_length_nm: f64,
    pub active: bool,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct RouteEngine {
    working: Vec<WorkingRoute>,
    provided: Vec<ProvidedRoute>,
    state: EditState,
}

impl RouteEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn working(&self) -> &[WorkingRoute] {
        &self.working
    }

    pub fn provided(&self) -> &[ProvidedRoute] {
        &self.provided
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Working => self.working.len(),
            Collection::Provided => self.provided.len(),
        }
    }

    pub fn route(&self, collection: Collection, index: usize) -> Result<&Route> {
        self.check(collection, index)?;
        Ok(match collection {
            Collection::Working => &self.working[index].route,
            Collection::Provided => &self.provided[index].route,
        })
    }

    pub fn is_visible(&self, collection: Collection, index: usize) -> Result<bool> {
        self.check(collection, index)?;
        Ok(match collection {
            Collection::Working => self.working[index].visible,
            Collection::Provided => self.provided[index].visible,
        })
    }

    pub fn is_active(&self, collection: Collection, index: usize) -> bool {
        self.state.target() == Some((collection, index))
    }

    /// The route under edit or inspection.
    pub fn active_route(&self) -> Option<&Route> {
        let (collection, index) = self.state.target()?;
        self.route(collection, index).ok()
    }

    pub fn active_legs(&self) -> Vec<Leg> {
        self.active_route().map(Route::legs).unwrap_or_default()
    }

    pub fn summaries(&self, collection: Collection) -> Vec<RouteSummary> {
        (0..self.len(collection))
            .filter_map(|index| {
                let route = self.route(collection, index).ok()?;
                Some(RouteSummary {
                    index,
                    name: route.name.clone(),
                    waypoint_count: route.len(),
                    total_length_nm: route.total_length_nm(),
                    active: self.is_active(collection, index),
                    visible: self.is_visible(collection, index).unwrap_or(false),
                })
            })
            .collect()
    }

    /// Begin a new, empty working route and make it active.
    ///
    /// The name counter is the working collection length plus one, so names
    /// can repeat after a deletion.
    pub fn start_new_route(&mut self) -> usize {
        let name = format!("Route {}", self.working.len() + 1);
        tracing::debug!(%name, "starting new route");
        self.push_working(Route::new(name))
    }

    /// Finish editing. The route is kept even with fewer than two waypoints.
    pub fn end_route(&mut self) -> Result<()> {
        match self.state {
            EditState::EditingWorkingRoute(i) => {
                self.working[i].visible = true;
            }
            EditState::EditingProvidedSelection(_) => {}
            EditState::NoActiveRoute => return Err(RouteError::NoActiveRoute),
        }
        self.state = EditState::NoActiveRoute;
        Ok(())
    }

    pub fn set_active(&mut self, collection: Collection, index: usize) -> Result<()> {
        self.check(collection, index)?;
        self.state = EditState::pointing_at(collection, index);
        Ok(())
    }

    /// Remove a route. Deleting the active route activates the first route
    /// of the same collection, or clears the selection when none is left.
    pub fn delete_route(&mut self, collection: Collection, index: usize) -> Result<Route> {
        self.check(collection, index)?;
        let removed = match collection {
            Collection::Working => self.working.remove(index).route,
            Collection::Provided => self.provided.remove(index).route,
        };

        self.state = match self.state.target() {
            Some((c, i)) if c == collection && i == index => {
                if self.len(collection) > 0 {
                    EditState::pointing_at(collection, 0)
                } else {
                    EditState::NoActiveRoute
                }
            }
            Some((c, i)) if c == collection && i > index => EditState::pointing_at(c, i - 1),
            _ => self.state,
        };

        tracing::debug!(?collection, index, name = %removed.name, "deleted route");
        Ok(removed)
    }

    /// Copy a provided route into the working set as a new active route.
    pub fn copy_provided_to_working(&mut self, index: usize) -> Result<usize> {
        self.check(Collection::Provided, index)?;
        let source = &self.provided[index].route;
        let copy = Route::with_waypoints(
            format!("{} (copy - edit)", source.name),
            source.waypoints().to_vec(),
        );
        tracing::debug!(index, name = %copy.name, "copied provided route");
        Ok(self.push_working(copy))
    }

    /// Flip a route's visibility; the active pointer is untouched.
    pub fn toggle_visibility(&mut self, collection: Collection, index: usize) -> Result<bool> {
        self.check(collection, index)?;
        let visible = match collection {
            Collection::Working => &mut self.working[index].visible,
            Collection::Provided => &mut self.provided[index].visible,
        };
        *visible = !*visible;
        Ok(*visible)
    }

    pub fn rename_route(
        &mut self,
        collection: Collection,
        index: usize,
        name: impl Into<String>,
    ) -> Result<()> {
        self.check(collection, index)?;
        match collection {
            Collection::Working => {
                self.working[index].route.name = name.into();
                Ok(())
            }
            Collection::Provided => Err(RouteError::ReadOnlyRoute),
        }
    }

    /// Append a waypoint to the active route; returns its index.
    pub fn add_waypoint(&mut self, coord: Coord) -> Result<usize> {
        check_coord(coord)?;
        let route = self.active_route_mut()?;
        route.append(coord);
        Ok(route.len() - 1)
    }

    /// Insert a waypoint on the segment nearest to `coord`; returns its index.
    pub fn insert_near(&mut self, coord: Coord) -> Result<usize> {
        check_coord(coord)?;
        let route = self.active_route_mut()?;
        let index = route.nearest_insert_index(coord);
        route.insert_at(index, coord, "")?;
        Ok(index)
    }

    pub fn insert_waypoint(&mut self, index: usize, coord: Coord, name: &str) -> Result<()> {
        check_coord(coord)?;
        self.active_route_mut()?.insert_at(index, coord, name)
    }

    pub fn delete_waypoint(&mut self, index: usize) -> Result<()> {
        self.active_route_mut()?.delete_at(index).map(drop)
    }

    pub fn rename_waypoint(&mut self, index: usize, name: &str) -> Result<()> {
        self.active_route_mut()?.rename(index, name)
    }

    pub fn move_waypoint(&mut self, index: usize, coord: Coord) -> Result<()> {
        check_coord(coord)?;
        self.active_route_mut()?.move_to(index, coord)
    }

    pub fn export_active(&self, timestamp: &str) -> Result<ExportedGpx> {
        let route = self.active_route().ok_or(RouteError::NoActiveRoute)?;
        writer::export_route(route, timestamp)
    }

    pub fn export_route(
        &self,
        collection: Collection,
        index: usize,
        timestamp: &str,
    ) -> Result<ExportedGpx> {
        writer::export_route(self.route(collection, index)?, timestamp)
    }

    /// Parse GPX text into a new active working route; returns its index.
    ///
    /// Unnamed documents take `fallback_name`, then the `Route N` counter.
    pub fn import_text(&mut self, gpx_text: &str, fallback_name: Option<&str>) -> Result<usize> {
        let mut route = parser::parse_route(gpx_text)?;
        if route.name.is_empty() {
            route.name = match fallback_name.filter(|n| !n.is_empty()) {
                Some(n) => n.to_string(),
                None => format!("Route {}", self.working.len() + 1),
            };
        }
        tracing::debug!(name = %route.name, waypoints = route.len(), "imported route");
        Ok(self.push_working(route))
    }

    /// Append a provided route, hidden and inactive; returns its index.
    pub fn add_provided(&mut self, route: Route) -> usize {
        self.provided.push(ProvidedRoute {
            route,
            visible: false,
        });
        self.provided.len() - 1
    }

    fn push_working(&mut self, route: Route) -> usize {
        self.working.push(WorkingRoute {
            route,
            visible: true,
        });
        let index = self.working.len() - 1;
        self.state = EditState::EditingWorkingRoute(index);
        index
    }

    fn active_route_mut(&mut self) -> Result<&mut Route> {
        match self.state {
            EditState::EditingWorkingRoute(i) => Ok(&mut self.working[i].route),
            EditState::EditingProvidedSelection(_) => Err(RouteError::ReadOnlyRoute),
            EditState::NoActiveRoute => Err(RouteError::NoActiveRoute),
        }
    }

    fn check(&self, collection: Collection, index: usize) -> Result<()> {
        let len = self.len(collection);
        if index < len {
            Ok(())
        } else {
            Err(RouteError::index(index, len))
        }
    }
}

/// NaN or infinite positions would poison every derived leg metric.
fn check_coord(coord: Coord) -> Result<()> {
    if coord.is_finite() {
        Ok(())
    } else {
        Err(RouteError::InvalidArgument(format!(
            "non-finite coordinate ({}, {})",
            coord.lon, coord.lat
        )))
    }
}
