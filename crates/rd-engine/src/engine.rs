//! The `RouteEngine` trait and the request/query values passed through it.
//!
//! # Pluggability
//!
//! The dispatcher in `rd-dispatch` talks to route search only through
//! [`RouteEngine`], so back-ends can be swapped without touching the
//! request/synchronisation protocol.  Exactly one engine is active per
//! dispatcher; see [`build_engine`][crate::build_engine] for runtime
//! selection.

use rd_core::{EngineRouteId, MoverProfile, OwnerId, Position, Rect};

use crate::{Cell, EngineKind};

// ── Request / query values ────────────────────────────────────────────────────

/// Everything an engine needs to create a route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub mover:       MoverProfile,
    pub start:       Position,
    pub goal:        Position,
    /// The route is complete once it ends within this ground distance of
    /// `goal`.
    pub goal_radius: f32,
    pub owner:       Option<OwnerId>,
    /// `true` when the request comes from synced (deterministic) simulation
    /// code, `false` for local-only callers such as UI previews.
    pub synced:      bool,
}

/// Parameters of a "where do I go next" query against an existing route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WaypointQuery {
    pub caller_pos:   Position,
    /// Waypoints closer than this (ground distance) to `caller_pos` are
    /// considered reached and skipped.
    pub min_distance: f32,
    /// Extra re-plan attempts allowed if the route has to be recomputed.
    pub retries:      u32,
    pub owner:        Option<OwnerId>,
    pub synced:       bool,
}

/// A change to engine-owned terrain, queued like any other operation so that
/// requests submitted before it are planned on the old terrain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainEdit {
    /// Cells whose centre lies inside this area are overwritten.
    pub area: Rect,
    pub cell: Cell,
}

// ── WaypointPath ──────────────────────────────────────────────────────────────

/// Full waypoint list of a route, for inspection and debug drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaypointPath {
    /// Waypoints in travel order.
    pub points: Vec<Position>,
    /// Indices into `points` where a straight run of waypoints begins.
    /// Always starts with `0` when `points` is non-empty.
    pub segment_starts: Vec<usize>,
}

impl WaypointPath {
    /// Build a path from its points, deriving `segment_starts`.
    pub fn from_points(points: Vec<Position>) -> Self {
        let segment_starts = segment_starts(&points);
        Self { points, segment_starts }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Indices where the ground-plane heading of `points` changes.
fn segment_starts(points: &[Position]) -> Vec<usize> {
    if points.is_empty() {
        return vec![];
    }
    let mut starts = vec![0];
    for i in 1..points.len().saturating_sub(1) {
        let (a, b, c) = (points[i - 1], points[i], points[i + 1]);
        let (ux, uz) = (b.x - a.x, b.z - a.z);
        let (vx, vz) = (c.x - b.x, c.z - b.z);
        let cross = ux * vz - uz * vx;
        let scale = (ux * ux + uz * uz).sqrt() * (vx * vx + vz * vz).sqrt();
        // Normalised cross product: sin of the turn angle.
        if scale > f32::EPSILON && (cross / scale).abs() > 1e-3 {
            starts.push(i);
        }
    }
    starts
}

// ── RouteEngine ───────────────────────────────────────────────────────────────

/// Pluggable route search and waypoint tracking.
///
/// # Thread safety
///
/// The dispatcher moves its engine onto a dedicated worker thread, so
/// implementations must be `Send`.  They are never called concurrently: the
/// dispatcher serialises all access behind one lock.
///
/// # Unknown ids
///
/// Methods taking an [`EngineRouteId`] must tolerate ids the engine does not
/// (or no longer) know: return the caller's position, `false`, or an empty
/// path, and never panic.
pub trait RouteEngine: Send {
    /// Which variant this is (for logging and config echo).
    fn kind(&self) -> EngineKind;

    /// Search for a route.  Returns `None` if no route exists.
    fn create_route(&mut self, request: &RouteRequest) -> Option<EngineRouteId>;

    /// Next waypoint the caller should steer towards.  Re-plans the route
    /// first if terrain changes invalidated it.
    fn next_waypoint(&mut self, id: EngineRouteId, query: &WaypointQuery) -> Position;

    /// `true` if the route was re-planned since the last call.  Reading the
    /// flag clears it.
    fn route_updated(&mut self, id: EngineRouteId) -> bool;

    /// Re-plan the route in place from its current waypoint.  Returns `true`
    /// if a new route was found.
    fn update_route(&mut self, id: EngineRouteId, owner: Option<OwnerId>) -> bool;

    /// Release a route.  Unknown ids are ignored.
    fn delete_route(&mut self, id: EngineRouteId);

    /// Complete waypoint list of a route (empty for unknown ids).
    fn waypoint_path(&self, id: EngineRouteId) -> WaypointPath;

    /// Terrain inside `area` changed; routes crossing it must be re-planned
    /// before they are next followed.
    fn terrain_changed(&mut self, area: Rect);

    /// Apply `edit` to the terrain this engine searches and return the world
    /// area actually changed.  Engines without editable terrain return `None`.
    ///
    /// The caller follows a `Some` with [`terrain_changed`](Self::terrain_changed).
    fn edit_terrain(&mut self, edit: &TerrainEdit) -> Option<Rect> {
        let _ = edit;
        None
    }

    /// Number of routes currently held.
    fn live_routes(&self) -> usize;
}

impl<E: RouteEngine + ?Sized> RouteEngine for Box<E> {
    fn kind(&self) -> EngineKind {
        (**self).kind()
    }

    fn create_route(&mut self, request: &RouteRequest) -> Option<EngineRouteId> {
        (**self).create_route(request)
    }

    fn next_waypoint(&mut self, id: EngineRouteId, query: &WaypointQuery) -> Position {
        (**self).next_waypoint(id, query)
    }

    fn route_updated(&mut self, id: EngineRouteId) -> bool {
        (**self).route_updated(id)
    }

    fn update_route(&mut self, id: EngineRouteId, owner: Option<OwnerId>) -> bool {
        (**self).update_route(id, owner)
    }

    fn delete_route(&mut self, id: EngineRouteId) {
        (**self).delete_route(id)
    }

    fn waypoint_path(&self, id: EngineRouteId) -> WaypointPath {
        (**self).waypoint_path(id)
    }

    fn terrain_changed(&mut self, area: Rect) {
        (**self).terrain_changed(area)
    }

    fn edit_terrain(&mut self, edit: &TerrainEdit) -> Option<Rect> {
        (**self).edit_terrain(edit)
    }

    fn live_routes(&self) -> usize {
        (**self).live_routes()
    }
}
