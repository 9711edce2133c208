use rd_core::CoreError;
use rd_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("dispatcher configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("failed to spawn route worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("route worker thread has exited; queued operations will never complete")]
    WorkerGone,

    #[error("route worker thread panicked")]
    WorkerPanicked,
}

pub type DispatchResult<T> = Result<T, DispatchError>;
