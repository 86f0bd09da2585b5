use circuit_court_core::ConfigError;
use circuit_court_scene::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read events from {path}: {source}")]
    Events {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("render engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("courtroom bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("courtroom still loading after {0:?}")]
    LoadTimeout(std::time::Duration),
}
