//! # Simulation Adapter
//!
//! The seam to the external numerical engine. The worker never looks inside
//! the engine; it hands over a version tag, the derived configuration, and
//! the calculation id, and gets back either a payload with a status message
//! or a classified error. Every error variant maps to a 500 result at the
//! processor; none of them crashes the worker.

mod engine;

pub use engine::EngineProcessAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Input to one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub version: String,
    pub calculation_id: String,
    /// Derived engine configuration (model tags and workspace path already
    /// injected). The originating job body is never handed to the engine.
    pub data: Value,
}

/// What a successful engine invocation reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub data: Value,
    #[serde(default)]
    pub message: String,
}

/// Classified engine faults. The taxonomy matters for operators reading
/// logs; the result shape published downstream is a 500 in every case.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid engine configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Engine failure: {message}")]
    EngineFailure { message: String },

    #[error("Engine output unreadable: {message}")]
    OutputUnreadable { message: String },
}

impl SimulationError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn engine_failure(message: impl Into<String>) -> Self {
        Self::EngineFailure {
            message: message.into(),
        }
    }

    pub fn output_unreadable(message: impl Into<String>) -> Self {
        Self::OutputUnreadable {
            message: message.into(),
        }
    }

    /// Stable tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::EngineFailure { .. } => "engine_failure",
            Self::OutputUnreadable { .. } => "output_unreadable",
        }
    }
}

/// Contract of the external simulation engine.
#[async_trait]
pub trait SimulationAdapter: Send + Sync {
    async fn run(&self, request: SimulationRequest) -> Result<SimulationOutput, SimulationError>;
}

#[async_trait]
impl<S: SimulationAdapter + ?Sized> SimulationAdapter for std::sync::Arc<S> {
    async fn run(&self, request: SimulationRequest) -> Result<SimulationOutput, SimulationError> {
        (**self).run(request).await
    }
}
