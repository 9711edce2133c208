//! Dispatcher configuration, loadable from TOML.
//!
//! ```toml
//! mode        = "threaded"     # or "synchronous"
//! engine      = "grid"         # or "graph"
//! worker_name = "route-worker"
//! ```
//!
//! Every key is optional; missing keys take the [`Default`] values.

use std::fmt;
use std::path::Path;

use rd_core::CoreError;
use rd_engine::EngineKind;
use serde::{Deserialize, Serialize};

use crate::DispatchResult;

/// Whether requests go through the worker thread or run inline.
///
/// Fixed for the lifetime of a dispatcher.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Requests are queued and processed by a background worker; results
    /// become visible at [`synchronize`][crate::RouteDispatcher::synchronize].
    #[default]
    Threaded,
    /// Every call runs the engine inline and its effect is visible
    /// immediately.
    Synchronous,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Threaded    => "threaded",
            ExecutionMode::Synchronous => "synchronous",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_WORKER_NAME: &str = "route-worker";

/// Everything needed to compose a dispatcher besides the world data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode:        ExecutionMode,
    pub engine:      EngineKind,
    /// Name given to the worker thread (visible in debuggers and panics).
    pub worker_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode:        ExecutionMode::default(),
            engine:      EngineKind::default(),
            worker_name: DEFAULT_WORKER_NAME.to_owned(),
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> DispatchResult<Self> {
        let config: DispatchConfig =
            toml::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(CoreError::Io)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.worker_name.trim().is_empty() {
            return Err(CoreError::Config("worker_name must not be empty".into()).into());
        }
        if self.worker_name.contains('\0') {
            return Err(CoreError::Config("worker_name must not contain NUL bytes".into()).into());
        }
        Ok(())
    }
}
