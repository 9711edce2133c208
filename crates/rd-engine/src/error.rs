//! Route-engine error type.

use thiserror::Error;

use crate::EngineKind;

/// Errors produced while selecting or building a route engine.
///
/// Route *search* failures are not errors: an engine that cannot find a path
/// returns `None` from [`RouteEngine::create_route`][crate::RouteEngine::create_route].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown route engine kind {0:?} (expected \"graph\" or \"grid\")")]
    UnknownKind(String),

    #[error("{kind} engine selected but no {what} was supplied")]
    MissingWorld { kind: EngineKind, what: &'static str },

    #[error("terrain grid {width}x{height} needs {expected} cells, got {got}")]
    GridSize {
        width:    u32,
        height:   u32,
        expected: usize,
        got:      usize,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
