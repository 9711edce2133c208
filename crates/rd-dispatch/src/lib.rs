//! `rd-dispatch` — asynchronous route requests with a per-tick barrier.
//!
//! The simulation thread submits route operations without waiting; a single
//! worker thread runs them against the configured [`RouteEngine`]; once per
//! tick the simulation calls [`RouteDispatcher::synchronize`] and every result
//! becomes visible at once, in a fixed order.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`dispatcher`] | `RouteDispatcher`, `SyncReport`                           |
//! | [`builder`]    | `DispatcherBuilder`                                       |
//! | [`config`]     | `DispatchConfig`, `ExecutionMode` (TOML-loadable)         |
//! | [`ops`]        | `PendingOperation`, `CompletedOperation`                  |
//! | [`table`]      | `RouteState`, client table, resolution cache, results     |
//! | `worker`       | shared state, background loop                             |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                      |
//!
//! [`RouteEngine`]: rd_engine::RouteEngine

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ops;
pub mod table;
mod worker;


pub use builder::DispatcherBuilder;
pub use config::{DispatchConfig, ExecutionMode};
pub use dispatcher::{RouteDispatcher, SyncReport};
pub use error::{DispatchError, DispatchResult};
pub use ops::{CompletedOperation, PendingOperation};
pub use table::RouteState;
