//! Client-side bookkeeping: per-handle route state, the per-window
//! resolution cache, and the ordered result buffer.
//!
//! | Type               | Written by                   | Read by                      |
//! |--------------------|------------------------------|------------------------------|
//! | `ClientTable`      | barrier (threaded) / inline  | enqueue API, worker (lookup) |
//! | `ResolutionCache`  | worker                       | worker, `waypoints()`        |
//! | `ResultBuffer`     | worker                       | barrier                      |

use std::collections::BTreeMap;
use std::mem;

use rd_core::{EngineRouteId, Position, RouteHandle};
use rustc_hash::FxHashMap;

use crate::CompletedOperation;

// ── RouteState ────────────────────────────────────────────────────────────────

/// What the simulation thread knows about one route.
///
/// In threaded mode this is a snapshot as of the last barrier.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteState {
    /// Engine route id, `None` until creation has been applied (or forever,
    /// if creation failed).
    pub engine_id:     Option<EngineRouteId>,
    /// Last waypoint the engine handed out; the start position until then.
    pub last_waypoint: Position,
    pub updated:       bool,
    /// The engine reported that no route exists.
    pub failed:        bool,
}

impl RouteState {
    pub fn new(start: Position) -> Self {
        Self { engine_id: None, last_waypoint: start, updated: false, failed: false }
    }

    pub fn is_resolved(&self) -> bool {
        self.engine_id.is_some()
    }

    /// Apply one completed operation.  `Deleted` is handled by the table,
    /// not here.
    pub(crate) fn apply(&mut self, op: CompletedOperation) {
        match op {
            CompletedOperation::Resolved(id) => {
                self.engine_id = Some(id);
                self.failed = false;
            }
            CompletedOperation::Failed      => self.failed = true,
            CompletedOperation::Waypoint(p) => self.last_waypoint = p,
            CompletedOperation::Updated(u)  => self.updated = u,
            CompletedOperation::Deleted     => {}
        }
    }
}

// ── ClientTable ───────────────────────────────────────────────────────────────

/// Handle allocator plus handle → [`RouteState`] map.
#[derive(Debug, Default)]
pub(crate) struct ClientTable {
    /// Last handle handed out; `0` means none yet.
    last_handle: u64,
    routes:      FxHashMap<RouteHandle, RouteState>,
}

impl ClientTable {
    /// Allocate the next handle and record fresh state for it.
    pub fn allocate(&mut self, start: Position) -> RouteHandle {
        self.last_handle += 1;
        let handle = RouteHandle(self.last_handle);
        self.routes.insert(handle, RouteState::new(start));
        handle
    }

    pub fn get(&self, handle: RouteHandle) -> Option<&RouteState> {
        self.routes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: RouteHandle) -> Option<&mut RouteState> {
        self.routes.get_mut(&handle)
    }

    pub fn engine_id(&self, handle: RouteHandle) -> Option<EngineRouteId> {
        self.routes.get(&handle).and_then(|s| s.engine_id)
    }

    /// Returns `true` if the handle was present.
    pub fn remove(&mut self, handle: RouteHandle) -> bool {
        self.routes.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Sorted copy of every entry, for comparing runs.
    pub fn snapshot(&self) -> Vec<(RouteHandle, RouteState)> {
        let mut out: Vec<_> = self.routes.iter().map(|(&h, &s)| (h, s)).collect();
        out.sort_by_key(|&(h, _)| h);
        out
    }
}

// ── ResolutionCache ───────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved(EngineRouteId),
    /// Deleted earlier in this window; the table entry is stale.
    Released,
}

/// Handle resolutions made by the worker since the last barrier.
///
/// The client table only learns engine ids at the barrier, so later
/// operations in the same window resolve through here first.
#[derive(Debug, Default)]
pub(crate) struct ResolutionCache {
    entries: FxHashMap<RouteHandle, Resolution>,
}

impl ResolutionCache {
    pub fn record(&mut self, handle: RouteHandle, id: EngineRouteId) {
        self.entries.insert(handle, Resolution::Resolved(id));
    }

    pub fn release(&mut self, handle: RouteHandle) {
        self.entries.insert(handle, Resolution::Released);
    }

    /// Resolve `handle`: cache first, then the table.
    pub fn resolve(&self, handle: RouteHandle, table: &ClientTable) -> Option<EngineRouteId> {
        match self.entries.get(&handle) {
            Some(Resolution::Resolved(id)) => Some(*id),
            Some(Resolution::Released)     => None,
            None                           => table.engine_id(handle),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ── ResultBuffer ──────────────────────────────────────────────────────────────

/// Completed operations keyed by handle.  Iteration is in handle order, and
/// each handle's operations stay in the order they completed.
#[derive(Debug, Default)]
pub(crate) struct ResultBuffer {
    by_handle: BTreeMap<RouteHandle, Vec<CompletedOperation>>,
}

impl ResultBuffer {
    pub fn push(&mut self, handle: RouteHandle, op: CompletedOperation) {
        self.by_handle.entry(handle).or_default().push(op);
    }

    /// Move everything in `other` to the end of this buffer.
    pub fn absorb(&mut self, other: &mut ResultBuffer) {
        if self.by_handle.is_empty() {
            mem::swap(&mut self.by_handle, &mut other.by_handle);
            return;
        }
        for (handle, mut ops) in mem::take(&mut other.by_handle) {
            self.by_handle.entry(handle).or_default().append(&mut ops);
        }
    }

    pub fn take(&mut self) -> BTreeMap<RouteHandle, Vec<CompletedOperation>> {
        mem::take(&mut self.by_handle)
    }

    /// Total number of buffered operations.
    pub fn len(&self) -> usize {
        self.by_handle.values().map(Vec::len).sum()
    }
}
