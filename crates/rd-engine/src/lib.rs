//! `rd-engine` — route engines behind a single pluggable trait.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`engine`]     | `RouteEngine` trait, `RouteRequest`, `WaypointQuery`, `TerrainEdit`, `WaypointPath` |
//! | [`tracking`]   | `RouteBook`: waypoint cursor, dirty flags, re-plan retries |
//! | [`network`]    | `NavGraph` (CSR + R-tree), `NavGraphBuilder`              |
//! | [`graph`]      | `GraphEngine`: Dijkstra over a `NavGraph`                 |
//! | [`grid`]       | `TerrainGrid`, `GridEngine`: A* over land/water cells      |
//! | [`registry`]   | `EngineKind`, `EngineWorld`, `build_engine`               |
//! | [`error`]      | `EngineError`, `EngineResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `rd-core` value types.  |

pub mod engine;
pub mod error;
pub mod graph;
pub mod grid;
pub mod network;
pub mod registry;
pub mod tracking;

#[cfg(test)]
mod tests;

pub use engine::{RouteEngine, RouteRequest, TerrainEdit, WaypointPath, WaypointQuery};
pub use error::{EngineError, EngineResult};
pub use graph::GraphEngine;
pub use grid::{Cell, GridEngine, TerrainClass, TerrainGrid};
pub use network::{NavGraph, NavGraphBuilder};
pub use registry::{EngineKind, EngineWorld, build_engine};
pub use tracking::{MAX_RETRIES, RouteBook, TrackedRoute};
