//! # Message Structures
//!
//! Inbound calculation jobs and the three outbound result shapes. All
//! shapes serialize through serde; `status_code` is uniformly a string so
//! downstream consumers see one schema regardless of outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{STATUS_ERROR, STATUS_OK, UNSUPPORTED_TYPE_MESSAGE};

/// A calculation job as delivered on the input queue.
///
/// `author` and `project` are informational and may be absent; `data`
/// carries the nested engine configuration (at least an `mf` flow
/// sub-configuration, optionally an `mt` transport sub-configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationJob {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub project: String,
    /// Unique identifier, also used as the workspace directory name.
    pub calculation_id: String,
    pub model_id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub data: Value,
}

impl CalculationJob {
    pub fn is_flopy_calculation(&self) -> bool {
        self.job_type == crate::constants::FLOPY_CALCULATION_TYPE
    }
}

/// Result record published to the finished queue.
///
/// `data` is present only for successful calculations; failure shapes carry
/// a diagnostic `message` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub status_code: String,
    pub model_id: String,
    pub calculation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub message: String,
}

impl CalculationResult {
    /// Successful calculation: engine payload plus its status message.
    pub fn success(job: &CalculationJob, data: Value, message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK.to_string(),
            model_id: job.model_id.clone(),
            calculation_id: job.calculation_id.clone(),
            data: Some(data),
            message: message.into(),
        }
    }

    /// Engine invocation failed; `message` is the top-level error
    /// description only.
    pub fn simulation_failure(job: &CalculationJob, message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_ERROR.to_string(),
            model_id: job.model_id.clone(),
            calculation_id: job.calculation_id.clone(),
            data: None,
            message: message.into(),
        }
    }

    /// Job type is not `flopy_calculation`; fixed diagnostic.
    pub fn unsupported_type(job: &CalculationJob) -> Self {
        Self {
            status_code: STATUS_ERROR.to_string(),
            model_id: job.model_id.clone(),
            calculation_id: job.calculation_id.clone(),
            data: None,
            message: UNSUPPORTED_TYPE_MESSAGE.to_string(),
        }
    }

    /// The job's `calculation_id` is unusable as a path segment.
    pub fn invalid_job(job: &CalculationJob, reason: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_ERROR.to_string(),
            model_id: job.model_id.clone(),
            calculation_id: job.calculation_id.clone(),
            data: None,
            message: format!("Invalid calculation job: {}", reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> CalculationJob {
        serde_json::from_value(json!({
            "calculation_id": "c1",
            "model_id": "m1",
            "type": "flopy_calculation",
            "version": "3.2.6",
            "data": {"mf": {"mf": {}}}
        }))
        .expect("job should decode")
    }

    #[test]
    fn job_decodes_without_author_and_project() {
        let job = job();
        assert_eq!(job.author, "");
        assert_eq!(job.project, "");
        assert!(job.is_flopy_calculation());
    }

    #[test]
    fn success_result_carries_payload() {
        let result = CalculationResult::success(&job(), json!({"heads": [1.0]}), "ok");
        assert!(result.is_success());
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["status_code"], "200");
        assert_eq!(value["model_id"], "m1");
        assert_eq!(value["calculation_id"], "c1");
        assert_eq!(value["data"], json!({"heads": [1.0]}));
        assert_eq!(value["message"], "ok");
    }

    #[test]
    fn failure_shapes_omit_data() {
        for result in [
            CalculationResult::simulation_failure(&job(), "engine exploded"),
            CalculationResult::unsupported_type(&job()),
            CalculationResult::invalid_job(&job(), "bad id"),
        ] {
            assert!(!result.is_success());
            let value = serde_json::to_value(&result).expect("serialize");
            assert_eq!(value["status_code"], "500");
            assert!(value.get("data").is_none(), "failure must not carry data");
            assert!(
                !value["message"].as_str().unwrap_or_default().is_empty(),
                "failure message must be non-empty"
            );
        }
    }

    #[test]
    fn payload_with_quotes_survives_serialization() {
        let payload = json!({"note": "aquifer \"A\" converged"});
        let result = CalculationResult::success(&job(), payload.clone(), "ok");
        let text = serde_json::to_string(&result).expect("serialize");
        let back: CalculationResult = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back.data, Some(payload));
    }
}
