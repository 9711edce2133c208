//! `rd-core` — foundational types for the `route_dispatch` workspace.
//!
//! This crate is a dependency of every other `rd-*` crate.  It intentionally
//! has no `rd-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `RouteHandle`, `EngineRouteId`, `OwnerId`, `MoverId`, …   |
//! | [`geo`]     | `Position`, `Rect`                                        |
//! | [`mover`]   | `MoverKind`, `MoverProfile`                               |
//! | [`time`]    | `Tick`                                                    |
//! | [`error`]   | `CoreError`                                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod mover;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::CoreError;
pub use geo::{Position, Rect};
pub use ids::{EdgeId, EngineRouteId, MoverId, NodeId, OwnerId, RouteHandle};
pub use mover::{MoverKind, MoverProfile};
pub use time::Tick;
