//! # Worker Error Types
//!
//! Crate-level error rollup. Each module owns its structured error enum;
//! this type exists so the binary and the consumer loop can propagate any
//! of them with `?`.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::messaging::MessagingError;
use crate::simulation::SimulationError;
use crate::worker::WorkspaceError;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
