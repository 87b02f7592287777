//! # Job Processor
//!
//! The per-job state transition: decode the body, stage the workspace,
//! derive the engine configuration, invoke the simulation adapter, and
//! build exactly one result record. Every fault past decoding maps to a
//! structured 500 result; only an undecodable body is rejected outright.

use serde_json::{json, Value};
use std::path::Path;
use tracing::{error, info, warn};

use crate::constants::{FLOW_MODEL_NAME, TRANSPORT_MODEL_NAME};
use crate::messaging::{CalculationJob, CalculationResult, MessagingError};
use crate::simulation::{SimulationAdapter, SimulationError, SimulationRequest};
use crate::worker::workspace::WorkspaceManager;

/// What the consumer should do with the inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDisposition {
    /// Message decoded; it is consumed regardless of the outcome.
    Ack,
    /// Undecodable body; dead-letter it.
    Reject,
}

/// Outcome of handling one raw message body.
#[derive(Debug)]
pub struct Handled {
    pub disposition: AckDisposition,
    pub result: Option<CalculationResult>,
}

/// Processes decoded calculation jobs against a simulation adapter.
pub struct JobProcessor<S> {
    workspace: WorkspaceManager,
    adapter: S,
}

impl<S: SimulationAdapter> JobProcessor<S> {
    pub fn new(workspace: WorkspaceManager, adapter: S) -> Self {
        Self { workspace, adapter }
    }

    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    /// Decode a raw body into a job. The consumer rejects on failure; this
    /// worker never crashes on untrusted input.
    pub fn decode(&self, body: &Value) -> Result<CalculationJob, MessagingError> {
        let job: CalculationJob = serde_json::from_value(body.clone())
            .map_err(|e| MessagingError::message_deserialization(e.to_string()))?;

        info!(
            author = %job.author,
            project = %job.project,
            model_id = %job.model_id,
            calculation_id = %job.calculation_id,
            job_type = %job.job_type,
            version = %job.version,
            "Received calculation job"
        );
        Ok(job)
    }

    /// Run a decoded job to its terminal result. `original_body` is the
    /// body as received; it is persisted verbatim and never mutated.
    pub async fn process(&self, job: &CalculationJob, original_body: &Value) -> CalculationResult {
        if !job.is_flopy_calculation() {
            warn!(
                calculation_id = %job.calculation_id,
                job_type = %job.job_type,
                "Unsupported job type"
            );
            return CalculationResult::unsupported_type(job);
        }

        if let Err(e) = WorkspaceManager::validate_calculation_id(&job.calculation_id) {
            warn!(calculation_id = %job.calculation_id, error = %e, "Rejecting unsafe calculation id");
            return CalculationResult::invalid_job(job, e.to_string());
        }

        let directory = match self.workspace.stage(&job.calculation_id, original_body) {
            Ok(dir) => dir,
            Err(e) => {
                error!(calculation_id = %job.calculation_id, error = %e, "Workspace staging failed");
                return CalculationResult::simulation_failure(job, e.to_string());
            }
        };

        let engine_config = match derive_engine_config(&job.data, &directory) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    calculation_id = %job.calculation_id,
                    error_kind = e.kind(),
                    error = %e,
                    "Engine configuration could not be derived"
                );
                return CalculationResult::simulation_failure(job, e.to_string());
            }
        };

        info!(
            calculation_id = %job.calculation_id,
            model_id = %job.model_id,
            directory = %directory.display(),
            "Running flopy calculation"
        );

        let request = SimulationRequest {
            version: job.version.clone(),
            calculation_id: job.calculation_id.clone(),
            data: engine_config,
        };

        match self.adapter.run(request).await {
            Ok(output) => CalculationResult::success(job, output.data, output.message),
            Err(e) => {
                error!(
                    calculation_id = %job.calculation_id,
                    error_kind = e.kind(),
                    error = %e,
                    "Simulation failed"
                );
                CalculationResult::simulation_failure(job, e.to_string())
            }
        }
    }

    /// Combined decode-and-process contract over one raw message body.
    pub async fn handle(&self, body: &Value) -> Handled {
        match self.decode(body) {
            Ok(job) => Handled {
                disposition: AckDisposition::Ack,
                result: Some(self.process(&job, body).await),
            },
            Err(e) => {
                warn!(error = %e, "Undecodable message body");
                Handled {
                    disposition: AckDisposition::Reject,
                    result: None,
                }
            }
        }
    }
}

/// Derive the configuration handed to the engine: a deep copy of the job's
/// `data` with the fixed model name and the staged workspace path injected
/// into the flow sub-configuration, and into the transport sub-configuration
/// when present. The job body itself is left untouched.
pub fn derive_engine_config(data: &Value, workspace: &Path) -> Result<Value, SimulationError> {
    let mut config = data.clone();
    let workspace = workspace.to_string_lossy().into_owned();

    inject_model_settings(&mut config, FLOW_MODEL_NAME, &workspace, true)?;
    inject_model_settings(&mut config, TRANSPORT_MODEL_NAME, &workspace, false)?;

    Ok(config)
}

fn inject_model_settings(
    config: &mut Value,
    tag: &str,
    workspace: &str,
    required: bool,
) -> Result<(), SimulationError> {
    let root = config.as_object_mut().ok_or_else(|| {
        SimulationError::invalid_configuration("'data' is not a JSON object")
    })?;

    let Some(section) = root.get_mut(tag) else {
        return if required {
            Err(SimulationError::invalid_configuration(format!(
                "missing '{tag}' sub-configuration"
            )))
        } else {
            Ok(())
        };
    };

    let nested = section
        .get_mut(tag)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            SimulationError::invalid_configuration(format!(
                "'{tag}.{tag}' is not a JSON object"
            ))
        })?;

    nested.insert("modelname".to_string(), json!(tag));
    nested.insert("model_ws".to_string(), json!(workspace));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn derives_flow_settings_without_touching_input() {
        let data = json!({"mf": {"mf": {"nlay": 3}}});
        let derived = derive_engine_config(&data, &PathBuf::from("/data/c1")).expect("derive");

        assert_eq!(derived["mf"]["mf"]["modelname"], "mf");
        assert_eq!(derived["mf"]["mf"]["model_ws"], "/data/c1");
        assert_eq!(derived["mf"]["mf"]["nlay"], 3);
        // Input must stay pristine.
        assert_eq!(data, json!({"mf": {"mf": {"nlay": 3}}}));
    }

    #[test]
    fn transport_section_is_optional_but_injected_when_present() {
        let without = json!({"mf": {"mf": {}}});
        let derived = derive_engine_config(&without, &PathBuf::from("/d/c")).expect("derive");
        assert!(derived.get("mt").is_none());

        let with = json!({"mf": {"mf": {}}, "mt": {"mt": {}}});
        let derived = derive_engine_config(&with, &PathBuf::from("/d/c")).expect("derive");
        assert_eq!(derived["mt"]["mt"]["modelname"], "mt");
        assert_eq!(derived["mt"]["mt"]["model_ws"], "/d/c");
    }

    #[test]
    fn malformed_sections_are_classified() {
        for data in [
            json!(null),
            json!({}),
            json!({"mf": {"mf": 42}}),
            json!({"mf": {}}),
            json!({"mf": {"mf": {}}, "mt": {"mt": []}}),
        ] {
            let err = derive_engine_config(&data, &PathBuf::from("/d/c"))
                .expect_err("malformed data must not reach the engine");
            assert_eq!(err.kind(), "invalid_configuration");
        }
    }
}
