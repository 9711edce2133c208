//! Operations flowing through the dispatcher.
//!
//! [`PendingOperation`]s travel simulation thread → worker through the request
//! queue; [`CompletedOperation`]s travel worker → barrier through the result
//! buffer.  Both are plain values: nothing in them borrows from either side.

use rd_core::{EngineRouteId, OwnerId, Position, Rect, RouteHandle};
use rd_engine::{RouteRequest, TerrainEdit, WaypointQuery};

/// A queued request awaiting the worker.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingOperation {
    RequestRoute { handle: RouteHandle, request: RouteRequest },
    NextWaypoint { handle: RouteHandle, query: WaypointQuery },
    NotifyUpdated { handle: RouteHandle },
    ForceUpdate { handle: RouteHandle, owner: Option<OwnerId> },
    DeleteRoute { handle: RouteHandle },
    /// Terrain inside `area` changed.  Not tied to a handle; ordered with the
    /// rest of the queue like any other operation.
    TerrainChanged { area: Rect },
    /// Overwrite engine-owned terrain, then flag the changed area like
    /// `TerrainChanged`.
    EditTerrain { edit: TerrainEdit },
}

impl PendingOperation {
    /// The handle this operation targets, if any.
    pub fn handle(&self) -> Option<RouteHandle> {
        match *self {
            PendingOperation::RequestRoute { handle, .. }
            | PendingOperation::NextWaypoint { handle, .. }
            | PendingOperation::NotifyUpdated { handle }
            | PendingOperation::ForceUpdate { handle, .. }
            | PendingOperation::DeleteRoute { handle } => Some(handle),
            PendingOperation::TerrainChanged { .. }
            | PendingOperation::EditTerrain { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PendingOperation::RequestRoute { .. }   => "request-route",
            PendingOperation::NextWaypoint { .. }   => "next-waypoint",
            PendingOperation::NotifyUpdated { .. }  => "notify-updated",
            PendingOperation::ForceUpdate { .. }    => "force-update",
            PendingOperation::DeleteRoute { .. }    => "delete-route",
            PendingOperation::TerrainChanged { .. } => "terrain-changed",
            PendingOperation::EditTerrain { .. }    => "edit-terrain",
        }
    }
}

/// The outcome of one pending operation, applied to the client table by the
/// barrier.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CompletedOperation {
    /// The engine created the route.
    Resolved(EngineRouteId),
    /// The engine found no route.
    Failed,
    Waypoint(Position),
    Updated(bool),
    /// The route was released; drop the handle's state.
    Deleted,
}
