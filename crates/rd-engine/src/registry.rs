//! Engine selection: `EngineKind` and the `build_engine` factory.
//!
//! The engine variant is chosen once, from configuration, when a dispatcher
//! is composed.  Nothing in the request path ever branches on the kind.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{EngineError, EngineResult, GraphEngine, GridEngine, NavGraph, RouteEngine, TerrainGrid};

/// The available route engine implementations.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    /// Dijkstra over a navigation graph ([`GraphEngine`]).
    #[default]
    Graph,
    /// A* over a terrain grid ([`GridEngine`]).
    Grid,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Graph => "graph",
            EngineKind::Grid  => "grid",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(EngineKind::Graph),
            "grid"  => Ok(EngineKind::Grid),
            _       => Err(EngineError::UnknownKind(s.to_owned())),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EngineKind> for String {
    fn from(kind: EngineKind) -> String {
        kind.as_str().to_owned()
    }
}

// ── EngineWorld ───────────────────────────────────────────────────────────────

/// World data the engines search over.  Only the data for the selected kind
/// has to be present.
#[derive(Clone, Default)]
pub struct EngineWorld {
    pub graph: Option<Arc<NavGraph>>,
    pub grid:  Option<Arc<RwLock<TerrainGrid>>>,
}

impl EngineWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(mut self, graph: Arc<NavGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_grid(mut self, grid: Arc<RwLock<TerrainGrid>>) -> Self {
        self.grid = Some(grid);
        self
    }
}

/// Construct the engine for `kind`.
///
/// # Errors
///
/// [`EngineError::MissingWorld`] if `world` lacks the data `kind` needs.
pub fn build_engine(kind: EngineKind, world: &EngineWorld) -> EngineResult<Box<dyn RouteEngine>> {
    let engine: Box<dyn RouteEngine> = match kind {
        EngineKind::Graph => {
            let graph = world
                .graph
                .clone()
                .ok_or(EngineError::MissingWorld { kind, what: "navigation graph" })?;
            Box::new(GraphEngine::new(graph))
        }
        EngineKind::Grid => {
            let grid = world
                .grid
                .clone()
                .ok_or(EngineError::MissingWorld { kind, what: "terrain grid" })?;
            Box::new(GridEngine::new(grid))
        }
    };
    log::info!("using {kind} route engine");
    Ok(engine)
}
