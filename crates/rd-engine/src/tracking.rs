//! `RouteBook` — per-route waypoint tracking shared by every engine.
//!
//! Engines differ only in *how* they search; following a route, reacting to
//! terrain changes and retrying a failed re-plan is common bookkeeping and
//! lives here.  Each engine hands the book a planner closure of the form
//! `(request, from, goal_radius) -> Option<Vec<Position>>`.

use rustc_hash::FxHashMap;

use rd_core::{EngineRouteId, Position, Rect};

use crate::{RouteRequest, WaypointPath, WaypointQuery};

/// Upper bound on extra re-plan attempts per query, whatever the caller asks
/// for.  Each attempt is a full search under the engine lock.
pub const MAX_RETRIES: u32 = 8;

/// One live route.
#[derive(Clone, Debug)]
pub struct TrackedRoute {
    /// The request the route was created from.  Re-plans reuse its mover,
    /// goal and radius.
    pub request: RouteRequest,
    /// Waypoints in travel order; never empty.
    pub points:  Vec<Position>,
    /// Index of the waypoint the mover is currently heading for.
    pub cursor:  usize,
    /// Terrain under the remaining waypoints changed since the last plan.
    pub dirty:   bool,
    /// Set by a successful re-plan, cleared by [`RouteBook::take_updated`].
    pub updated: bool,
}

impl TrackedRoute {
    /// Current target waypoint.
    #[inline]
    pub fn target(&self) -> Position {
        self.points[self.cursor]
    }

    /// Waypoints not yet reached.
    #[inline]
    pub fn remaining(&self) -> &[Position] {
        &self.points[self.cursor..]
    }
}

/// Sparse `EngineRouteId → TrackedRoute` map with id allocation.
///
/// Ids are allocated sequentially from 0 and not reused, so a stale id held by
/// a racing caller can never alias a newer route.
#[derive(Default)]
pub struct RouteBook {
    routes:  FxHashMap<EngineRouteId, TrackedRoute>,
    next_id: u32,
}

impl RouteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly planned route and return its id.
    ///
    /// Returns `None` if `points` is empty (nothing to follow) or the id space
    /// is exhausted.
    pub fn insert(&mut self, request: RouteRequest, points: Vec<Position>) -> Option<EngineRouteId> {
        if points.is_empty() || self.next_id == EngineRouteId::INVALID.0 {
            return None;
        }
        let id = EngineRouteId(self.next_id);
        self.next_id += 1;
        self.routes.insert(id, TrackedRoute {
            request,
            points,
            cursor:  0,
            dirty:   false,
            updated: false,
        });
        Some(id)
    }

    pub fn get(&self, id: EngineRouteId) -> Option<&TrackedRoute> {
        self.routes.get(&id)
    }

    pub fn remove(&mut self, id: EngineRouteId) -> Option<TrackedRoute> {
        self.routes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Advance the route's cursor past every waypoint within
    /// `query.min_distance` of the caller and return the new target.
    ///
    /// A dirty route is re-planned from the caller's position first.  Unknown
    /// ids yield `query.caller_pos`.
    pub fn advance<P>(&mut self, id: EngineRouteId, query: &WaypointQuery, plan: P) -> Position
    where
        P: FnMut(&RouteRequest, Position, f32) -> Option<Vec<Position>>,
    {
        let Some(route) = self.routes.get_mut(&id) else {
            return query.caller_pos;
        };
        if route.dirty {
            replan(route, query.caller_pos, query.retries, plan);
        }
        let last = route.points.len() - 1;
        while route.cursor < last
            && query.caller_pos.distance_2d(route.points[route.cursor]) < query.min_distance
        {
            route.cursor += 1;
        }
        route.target()
    }

    /// Re-plan `id` from its current target waypoint.  Returns `true` on
    /// success; `false` for unknown ids or if no route was found.
    pub fn force_replan<P>(&mut self, id: EngineRouteId, plan: P) -> bool
    where
        P: FnMut(&RouteRequest, Position, f32) -> Option<Vec<Position>>,
    {
        let Some(route) = self.routes.get_mut(&id) else {
            return false;
        };
        let from = route.target();
        replan(route, from, 0, plan)
    }

    /// Read and clear the `updated` flag.
    pub fn take_updated(&mut self, id: EngineRouteId) -> bool {
        self.routes
            .get_mut(&id)
            .map(|r| std::mem::take(&mut r.updated))
            .unwrap_or(false)
    }

    /// Flag every route with a remaining waypoint inside `area` for re-plan.
    /// Returns how many routes were flagged.
    pub fn mark_dirty(&mut self, area: Rect) -> usize {
        let mut flagged = 0;
        for route in self.routes.values_mut() {
            if !route.dirty && route.remaining().iter().any(|&p| area.contains(p)) {
                route.dirty = true;
                flagged += 1;
            }
        }
        flagged
    }

    /// Full waypoint list for inspection.
    pub fn path(&self, id: EngineRouteId) -> WaypointPath {
        self.routes
            .get(&id)
            .map(|r| WaypointPath::from_points(r.points.clone()))
            .unwrap_or_default()
    }
}

/// Re-plan `route` from `from`.  Attempt `k` (0-based, up to `retries`
/// extra, capped at [`MAX_RETRIES`]) searches with the goal radius doubled
/// `k` times.  On failure the old waypoints are kept.
fn replan<P>(route: &mut TrackedRoute, from: Position, retries: u32, mut plan: P) -> bool
where
    P: FnMut(&RouteRequest, Position, f32) -> Option<Vec<Position>>,
{
    route.dirty = false;
    let base = route.request.goal_radius;
    for attempt in 0..=retries.min(MAX_RETRIES) {
        let radius = if attempt == 0 {
            base
        } else {
            base.max(1.0) * 2f32.powi(attempt as i32)
        };
        match plan(&route.request, from, radius) {
            Some(points) if !points.is_empty() => {
                route.points  = points;
                route.cursor  = 0;
                route.updated = true;
                return true;
            }
            _ => {}
        }
    }
    false
}
