//! `RouteDispatcher` — the simulation thread's front door to route search.
//!
//! # Per-tick protocol (threaded mode)
//!
//! ```text
//! tick N:  request_route / next_waypoint / … ──▶ queued, answers are tick N-1 state
//!          synchronize()                       ──▶ wait for worker, apply results
//! tick N+1: answers now reflect everything submitted during tick N
//! ```
//!
//! Enqueue calls never wait on route computation; only [`RouteDispatcher::waypoints`]
//! and [`RouteDispatcher::synchronize`] may block.  What the simulation
//! observes after each barrier depends only on the sequence of calls, never
//! on how the worker happened to batch them.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info};
use parking_lot::{Mutex, MutexGuard};
use rd_core::{OwnerId, Position, Rect, RouteHandle, Tick};
use rd_engine::{
    Cell, EngineKind, EngineWorld, RouteEngine, RouteRequest, TerrainEdit, WaypointPath, WaypointQuery,
    build_engine,
};

use crate::table::RouteState;
use crate::worker::{self, Shared, SharedState};
use crate::{CompletedOperation, DispatchConfig, DispatchError, DispatchResult, DispatcherBuilder, ExecutionMode, PendingOperation};

/// What one barrier did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Barrier count after this call (the first barrier reports `T1`).
    pub tick:    Tick,
    /// Completed operations applied to the client table.
    pub applied: usize,
    /// Handles whose state was removed by a delete.
    pub removed: usize,
}

/// Asynchronous route-request dispatcher over a [`RouteEngine`].
///
/// Built with [`DispatcherBuilder`] or [`RouteDispatcher::from_config`].  The
/// worker thread (threaded mode) is stopped and joined on drop.
pub struct RouteDispatcher<E: RouteEngine + 'static> {
    mode:   ExecutionMode,
    kind:   EngineKind,
    shared: Arc<Shared>,
    engine: Arc<Mutex<E>>,
    worker: Option<JoinHandle<()>>,
    synced: Tick,
}

impl RouteDispatcher<Box<dyn RouteEngine>> {
    /// Build the configured engine over `world` and start a dispatcher for it.
    ///
    /// An unknown or unusable engine kind is an error; there is no fallback
    /// engine.
    pub fn from_config(config: &DispatchConfig, world: &EngineWorld) -> DispatchResult<Self> {
        config.validate()?;
        let engine = build_engine(config.engine, world)?;
        DispatcherBuilder::new(engine)
            .mode(config.mode)
            .worker_name(config.worker_name.clone())
            .build()
    }
}

impl<E: RouteEngine + 'static> RouteDispatcher<E> {
    pub(crate) fn start(engine: E, mode: ExecutionMode, worker_name: String) -> DispatchResult<Self> {
        let kind = engine.kind();
        let shared = Arc::new(Shared::default());
        let engine = Arc::new(Mutex::new(engine));

        let worker = match mode {
            ExecutionMode::Threaded => {
                let handle = worker::spawn(worker_name, Arc::clone(&shared), Arc::clone(&engine))
                    .map_err(DispatchError::WorkerSpawn)?;
                Some(handle)
            }
            ExecutionMode::Synchronous => None,
        };
        info!("route dispatcher ready: {kind} engine, {mode} mode");

        Ok(Self { mode, kind, shared, engine, worker, synced: Tick::ZERO })
    }

    // ── Enqueue side ──────────────────────────────────────────────────────

    /// Submit a route request and return its handle at once.
    ///
    /// Threaded: the route is created by the worker and its engine id becomes
    /// visible after the next [`synchronize`](Self::synchronize).
    /// Synchronous: the engine runs now.
    pub fn request_route(&self, request: RouteRequest) -> RouteHandle {
        match self.mode {
            ExecutionMode::Threaded => {
                let mut state = self.shared.state.lock();
                let handle = state.table.allocate(request.start);
                state.queue.push(PendingOperation::RequestRoute { handle, request });
                drop(state);
                self.shared.work.notify_one();
                handle
            }
            ExecutionMode::Synchronous => {
                let id = self.engine.lock().create_route(&request);
                let mut state = self.shared.state.lock();
                let handle = state.table.allocate(request.start);
                if let Some(route) = state.table.get_mut(handle) {
                    route.apply(match id {
                        Some(id) => CompletedOperation::Resolved(id),
                        None     => CompletedOperation::Failed,
                    });
                }
                handle
            }
        }
    }

    /// Next waypoint for `handle`.
    ///
    /// Threaded: queues the query and returns the waypoint known as of the
    /// last barrier, or `query.caller_pos` if the handle is not resolved yet.
    pub fn next_waypoint(&self, handle: RouteHandle, query: WaypointQuery) -> Position {
        match self.mode {
            ExecutionMode::Threaded => {
                let mut state = self.shared.state.lock();
                let known = state.table.get(handle).filter(|r| r.is_resolved()).map(|r| r.last_waypoint);
                state.queue.push(PendingOperation::NextWaypoint { handle, query });
                drop(state);
                self.shared.work.notify_one();
                known.unwrap_or(query.caller_pos)
            }
            ExecutionMode::Synchronous => {
                let mut state = self.shared.state.lock();
                let Some(id) = state.table.engine_id(handle) else {
                    return query.caller_pos;
                };
                let wp = self.engine.lock().next_waypoint(id, &query);
                if let Some(route) = state.table.get_mut(handle) {
                    route.apply(CompletedOperation::Waypoint(wp));
                }
                wp
            }
        }
    }

    /// Whether the route was re-planned.
    ///
    /// Threaded: queues a fresh read and returns the flag as of the last
    /// barrier (`false` while unresolved).
    pub fn notify_updated(&self, handle: RouteHandle) -> bool {
        match self.mode {
            ExecutionMode::Threaded => {
                let mut state = self.shared.state.lock();
                let known = state.table.get(handle).is_some_and(|r| r.is_resolved() && r.updated);
                state.queue.push(PendingOperation::NotifyUpdated { handle });
                drop(state);
                self.shared.work.notify_one();
                known
            }
            ExecutionMode::Synchronous => {
                let mut state = self.shared.state.lock();
                let Some(id) = state.table.engine_id(handle) else {
                    return false;
                };
                let updated = self.engine.lock().route_updated(id);
                if let Some(route) = state.table.get_mut(handle) {
                    route.apply(CompletedOperation::Updated(updated));
                }
                updated
            }
        }
    }

    /// Ask the engine to re-plan the route in place.
    pub fn force_update(&self, handle: RouteHandle, owner: Option<OwnerId>) {
        match self.mode {
            ExecutionMode::Threaded => self.shared.enqueue(PendingOperation::ForceUpdate { handle, owner }),
            ExecutionMode::Synchronous => {
                let mut state = self.shared.state.lock();
                let Some(id) = state.table.engine_id(handle) else {
                    return;
                };
                let updated = self.engine.lock().update_route(id, owner);
                if let Some(route) = state.table.get_mut(handle) {
                    route.apply(CompletedOperation::Updated(updated));
                }
            }
        }
    }

    /// Release a route.  Deleting an unknown or already deleted handle is a
    /// no-op.
    ///
    /// Threaded: the handle's state stays readable until the barrier that
    /// applies the delete.
    pub fn delete_route(&self, handle: RouteHandle) {
        match self.mode {
            ExecutionMode::Threaded => self.shared.enqueue(PendingOperation::DeleteRoute { handle }),
            ExecutionMode::Synchronous => {
                let mut state = self.shared.state.lock();
                if let Some(id) = state.table.engine_id(handle) {
                    self.engine.lock().delete_route(id);
                }
                state.table.remove(handle);
            }
        }
    }

    /// Tell the engine that terrain inside `area` changed.
    ///
    /// Only the notification is queued.  If the terrain itself was edited
    /// outside the engine, do that right after [`synchronize`](Self::synchronize)
    /// so no queued request can observe it early; otherwise use
    /// [`edit_terrain`](Self::edit_terrain).
    pub fn terrain_changed(&self, area: Rect) {
        match self.mode {
            ExecutionMode::Threaded => self.shared.enqueue(PendingOperation::TerrainChanged { area }),
            ExecutionMode::Synchronous => self.engine.lock().terrain_changed(area),
        }
    }

    /// Overwrite the engine's terrain inside `area` with `cell`, then flag
    /// routes crossing the changed cells for re-plan.
    ///
    /// The edit is applied in submission order: requests submitted before
    /// this call are planned on the old terrain, later ones on the new.
    /// Engines without editable terrain log a warning and ignore it.
    pub fn edit_terrain(&self, area: Rect, cell: Cell) {
        let edit = TerrainEdit { area, cell };
        match self.mode {
            ExecutionMode::Threaded => self.shared.enqueue(PendingOperation::EditTerrain { edit }),
            ExecutionMode::Synchronous => worker::apply_edit(&mut *self.engine.lock(), &edit),
        }
    }

    // ── Blocking queries ──────────────────────────────────────────────────

    /// Full waypoint list of a route, straight from the engine.
    ///
    /// Blocks until the worker has drained the queue and holds the dispatcher
    /// lock while the engine answers, so nothing can be queued meanwhile.
    /// Unresolved handles yield an empty path.
    pub fn waypoints(&self, handle: RouteHandle) -> DispatchResult<WaypointPath> {
        let mut state = self.shared.state.lock();
        if self.mode == ExecutionMode::Threaded {
            self.wait_idle(&mut state)?;
        }
        Ok(match state.resolve(handle) {
            Some(id) => self.engine.lock().waypoint_path(id),
            None     => WaypointPath::default(),
        })
    }

    /// The synchronisation barrier.  Call once per simulation tick.
    ///
    /// Threaded: waits until every queued operation has been processed, then
    /// applies all results to the client table in handle order (and, per
    /// handle, in submission order).  Synchronous: only advances the tick.
    pub fn synchronize(&mut self) -> DispatchResult<SyncReport> {
        let tick = self.synced.next();
        let mut report = SyncReport { tick, ..SyncReport::default() };

        if self.mode == ExecutionMode::Threaded {
            let mut state = self.shared.state.lock();
            self.wait_idle(&mut state)?;

            debug!(
                "{tick}: applying {} results, {} cached resolutions",
                state.results.len(),
                state.cache.len()
            );
            let results = state.results.take();
            for (handle, ops) in results {
                for op in ops {
                    report.applied += 1;
                    if op == CompletedOperation::Deleted {
                        if state.table.remove(handle) {
                            report.removed += 1;
                        }
                        continue;
                    }
                    match state.table.get_mut(handle) {
                        Some(route) => route.apply(op),
                        None => error!("{tick}: dropping {op:?} for unknown route {handle}"),
                    }
                }
            }
            state.cache.clear();
        }

        self.synced = tick;
        Ok(report)
    }

    /// Block until the worker is idle with an empty queue.
    fn wait_idle(&self, state: &mut MutexGuard<'_, SharedState>) -> DispatchResult<()> {
        while !state.is_idle() {
            if state.worker_exited {
                return Err(DispatchError::WorkerGone);
            }
            self.shared.idle.wait(state);
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Client-side state of `handle` (as of the last barrier in threaded mode).
    pub fn route_state(&self, handle: RouteHandle) -> Option<RouteState> {
        self.shared.state.lock().table.get(handle).copied()
    }

    /// Number of handles with state in the client table.
    pub fn live_routes(&self) -> usize {
        self.shared.state.lock().table.len()
    }

    /// Operations waiting for the worker.
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.kind
    }

    /// Number of barriers passed.
    pub fn synced_ticks(&self) -> Tick {
        self.synced
    }

    /// Sorted copy of the client table.
    pub fn snapshot(&self) -> Vec<(RouteHandle, RouteState)> {
        self.shared.state.lock().table.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn cached_resolutions(&self) -> usize {
        self.shared.state.lock().cache.len()
    }

    /// Run `f` against the engine once the worker is idle.
    ///
    /// `f` must not call back into this dispatcher.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> DispatchResult<R> {
        let mut state = self.shared.state.lock();
        if self.mode == ExecutionMode::Threaded {
            self.wait_idle(&mut state)?;
        }
        let mut engine = self.engine.lock();
        Ok(f(&mut engine))
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Stop the worker after it has drained the queue, and join it.
    ///
    /// Results of the drained operations are applied by a following
    /// [`synchronize`](Self::synchronize).  Calling this more than once, or in
    /// synchronous mode, is a no-op.
    pub fn shutdown(&mut self) -> DispatchResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.shared.state.lock().stop = true;
        self.shared.work.notify_all();
        worker.join().map_err(|_| DispatchError::WorkerPanicked)
    }
}

impl<E: RouteEngine + 'static> Drop for RouteDispatcher<E> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("route dispatcher shutdown failed: {e}");
        }
    }
}
