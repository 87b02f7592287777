//! Subprocess-based engine adapter.
//!
//! The engine runs as an external command: the request is written as JSON
//! to its stdin, and it answers with a `{"data": ..., "message": ...}`
//! JSON document on stdout. A non-zero exit is an engine failure; stdout
//! that does not parse is an unreadable-output failure.

use std::env;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{SimulationAdapter, SimulationError, SimulationOutput, SimulationRequest};

const ENV_ENGINE_COMMAND: &str = "FLOPY_ENGINE_COMMAND";
const DEFAULT_ENGINE_COMMAND: &str = "flopy-calculation-engine";

/// Invokes the engine executable once per calculation.
#[derive(Debug, Clone)]
pub struct EngineProcessAdapter {
    command: String,
}

impl EngineProcessAdapter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Command from `FLOPY_ENGINE_COMMAND`, falling back to the default
    /// executable name on the PATH.
    pub fn from_env() -> Self {
        let command = env::var(ENV_ENGINE_COMMAND)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_COMMAND.to_string());
        Self::new(command)
    }
}

#[async_trait::async_trait]
impl SimulationAdapter for EngineProcessAdapter {
    async fn run(&self, request: SimulationRequest) -> Result<SimulationOutput, SimulationError> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| SimulationError::invalid_configuration(e.to_string()))?;

        debug!(
            command = %self.command,
            calculation_id = %request.calculation_id,
            version = %request.version,
            "Launching simulation engine"
        );

        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SimulationError::engine_failure(format!(
                    "failed to launch '{}': {e}",
                    self.command
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await.map_err(|e| {
                SimulationError::engine_failure(format!("failed to write engine input: {e}"))
            })?;
        }

        let output = child.wait_with_output().await.map_err(|e| {
            SimulationError::engine_failure(format!("failed to wait for engine: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("").trim().to_string();
            return Err(SimulationError::engine_failure(format!(
                "engine exited with {}: {detail}",
                output.status
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| SimulationError::output_unreadable(e.to_string()))
    }
}
