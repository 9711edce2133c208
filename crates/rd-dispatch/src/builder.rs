use rd_engine::RouteEngine;

use crate::config::DEFAULT_WORKER_NAME;
use crate::{DispatchResult, ExecutionMode, RouteDispatcher};

/// Fluent builder for [`RouteDispatcher`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use parking_lot::RwLock;
/// use rd_dispatch::{DispatcherBuilder, ExecutionMode};
/// use rd_engine::{GridEngine, TerrainGrid};
///
/// let grid = Arc::new(RwLock::new(TerrainGrid::new(64, 64, 8.0)));
/// let dispatcher = DispatcherBuilder::new(GridEngine::new(grid))
///     .mode(ExecutionMode::Threaded)
///     .worker_name("pathing")
///     .build()
///     .unwrap();
/// assert_eq!(dispatcher.live_routes(), 0);
/// ```
pub struct DispatcherBuilder<E: RouteEngine + 'static> {
    engine:      E,
    mode:        ExecutionMode,
    worker_name: String,
}

impl<E: RouteEngine + 'static> DispatcherBuilder<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            mode:        ExecutionMode::default(),
            worker_name: DEFAULT_WORKER_NAME.to_owned(),
        }
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Thread name for the worker (threaded mode only).
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Start the dispatcher.  In threaded mode this spawns the worker.
    pub fn build(self) -> DispatchResult<RouteDispatcher<E>> {
        RouteDispatcher::start(self.engine, self.mode, self.worker_name)
    }
}
