//! The route worker: shared state and the background loop.
//!
//! # Handoff
//!
//! ```text
//!  sim thread ──push──▶ queue ──swap──▶ batch ──engine──▶ local results
//!                                                              │
//!  barrier ◀──take── shared results ◀──fold (between batches)──┘
//! ```
//!
//! The engine lock is held for a whole batch, the state lock only for O(1)
//! bookkeeping.  The worker never holds the state lock while it waits for
//! the engine lock.

use std::io;
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use rd_core::{EngineRouteId, RouteHandle};
use rd_engine::{RouteEngine, TerrainEdit};

use crate::table::{ClientTable, ResolutionCache, ResultBuffer};
use crate::{CompletedOperation, PendingOperation};

// ── Shared state ──────────────────────────────────────────────────────────────

/// Everything guarded by the dispatcher's single coarse lock.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    pub queue:         Vec<PendingOperation>,
    pub table:         ClientTable,
    pub cache:         ResolutionCache,
    pub results:       ResultBuffer,
    /// The worker is processing a batch.
    pub busy:          bool,
    pub stop:          bool,
    pub worker_exited: bool,
}

impl SharedState {
    /// Nothing queued and nothing in flight.
    pub fn is_idle(&self) -> bool {
        !self.busy && self.queue.is_empty()
    }

    pub fn resolve(&self, handle: RouteHandle) -> Option<EngineRouteId> {
        self.cache.resolve(handle, &self.table)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub state: Mutex<SharedState>,
    /// Signalled when work is queued or `stop` is set.
    pub work:  Condvar,
    /// Signalled when the worker runs out of work or exits.
    pub idle:  Condvar,
}

impl Shared {
    /// Push an operation and wake the worker.
    pub fn enqueue(&self, op: PendingOperation) {
        self.state.lock().queue.push(op);
        self.work.notify_one();
    }
}

// ── Worker thread ─────────────────────────────────────────────────────────────

pub(crate) fn spawn<E>(
    name: String,
    shared: Arc<Shared>,
    engine: Arc<Mutex<E>>,
) -> io::Result<JoinHandle<()>>
where
    E: RouteEngine + 'static,
{
    thread::Builder::new().name(name).spawn(move || run(&shared, &engine))
}

/// Marks the worker as gone however `run` ends, so the barrier never waits
/// on a thread that will not answer.
struct ExitGuard<'a>(&'a Shared);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock();
        state.worker_exited = true;
        state.busy = false;
        drop(state);
        self.0.idle.notify_all();
    }
}

fn run<E: RouteEngine>(shared: &Shared, engine: &Mutex<E>) {
    let _exit = ExitGuard(shared);
    let name = thread::current().name().unwrap_or("route-worker").to_owned();
    info!("{name}: started");

    let mut batch: Vec<PendingOperation> = Vec::new();
    let mut completed = ResultBuffer::default();
    let mut batches = 0u64;

    loop {
        {
            let mut state = shared.state.lock();
            state.results.absorb(&mut completed);
            while state.queue.is_empty() {
                state.busy = false;
                shared.idle.notify_all();
                if state.stop {
                    info!("{name}: stopping after {batches} batches");
                    return;
                }
                shared.work.wait(&mut state);
            }
            state.busy = true;
            mem::swap(&mut state.queue, &mut batch);
        }

        batches += 1;
        debug!("{name}: batch {batches} with {} operations", batch.len());

        let mut eng = engine.lock();
        for op in batch.drain(..) {
            process(op, &mut *eng, shared, &mut completed);
        }
    }
}

/// Run one operation against the engine, appending its outcome to `out`.
///
/// Operations on handles that do not resolve are dropped without a result.
fn process<E: RouteEngine + ?Sized>(
    op: PendingOperation,
    engine: &mut E,
    shared: &Shared,
    out: &mut ResultBuffer,
) {
    let resolve = |handle| shared.state.lock().resolve(handle);

    match op {
        PendingOperation::RequestRoute { handle, request } => match engine.create_route(&request) {
            Some(id) => {
                shared.state.lock().cache.record(handle, id);
                out.push(handle, CompletedOperation::Resolved(id));
            }
            None => out.push(handle, CompletedOperation::Failed),
        },
        PendingOperation::NextWaypoint { handle, query } => {
            if let Some(id) = resolve(handle) {
                let wp = engine.next_waypoint(id, &query);
                out.push(handle, CompletedOperation::Waypoint(wp));
            }
        }
        PendingOperation::NotifyUpdated { handle } => {
            if let Some(id) = resolve(handle) {
                out.push(handle, CompletedOperation::Updated(engine.route_updated(id)));
            }
        }
        PendingOperation::ForceUpdate { handle, owner } => {
            if let Some(id) = resolve(handle) {
                out.push(handle, CompletedOperation::Updated(engine.update_route(id, owner)));
            }
        }
        PendingOperation::DeleteRoute { handle } => {
            if let Some(id) = resolve(handle) {
                engine.delete_route(id);
            }
            out.push(handle, CompletedOperation::Deleted);
            shared.state.lock().cache.release(handle);
        }
        PendingOperation::TerrainChanged { area } => engine.terrain_changed(area),
        PendingOperation::EditTerrain { edit } => apply_edit(engine, &edit),
    }
}

/// Apply a terrain edit and flag the routes it touches.
pub(crate) fn apply_edit<E: RouteEngine + ?Sized>(engine: &mut E, edit: &TerrainEdit) {
    match engine.edit_terrain(edit) {
        Some(changed) => engine.terrain_changed(changed),
        None => warn!("{} engine has no editable terrain; edit of {:?} ignored", engine.kind(), edit.area),
    }
}
