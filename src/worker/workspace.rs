//! # Workspace Manager
//!
//! Maps a calculation id to its staging directory under the data root,
//! creates it on demand, and persists the unmutated job body as
//! `configuration.json`. Staging is idempotent: an existing directory is
//! not an error and a prior snapshot is overwritten unconditionally.
//! Workspace directories are never cleaned up by this worker.

use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::constants::{CONFIGURATION_FILE_NAME, MAX_CALCULATION_ID_LEN, UNDELIVERABLE_DIR_NAME};
use crate::messaging::CalculationResult;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Invalid calculation id '{calculation_id}': {reason}")]
    InvalidCalculationId {
        calculation_id: String,
        reason: String,
    },

    #[error("Workspace I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkspaceError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Per-job filesystem staging under a single data root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    data_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// A calculation id becomes a single path component, so it is held to a
    /// restricted character set before any filesystem access. Broker input
    /// is not trusted.
    pub fn validate_calculation_id(calculation_id: &str) -> Result<(), WorkspaceError> {
        let invalid = |reason: &str| WorkspaceError::InvalidCalculationId {
            calculation_id: calculation_id.to_string(),
            reason: reason.to_string(),
        };

        if calculation_id.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if calculation_id.len() > MAX_CALCULATION_ID_LEN {
            return Err(invalid("exceeds maximum length"));
        }
        if calculation_id.starts_with('.') {
            return Err(invalid("must not start with a dot"));
        }
        if !calculation_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(invalid(
                "may only contain ASCII letters, digits, '.', '_' and '-'",
            ));
        }
        Ok(())
    }

    /// Directory for a (validated) calculation id.
    pub fn workspace_path(&self, calculation_id: &str) -> PathBuf {
        self.data_root.join(calculation_id)
    }

    /// Stage a job: create the workspace directory (and parents) and write
    /// the original, unmutated body as the configuration snapshot. Returns
    /// the workspace directory path.
    pub fn stage(&self, calculation_id: &str, body: &Value) -> Result<PathBuf, WorkspaceError> {
        Self::validate_calculation_id(calculation_id)?;

        let directory = self.workspace_path(calculation_id);
        fs::create_dir_all(&directory).map_err(|e| WorkspaceError::io(&directory, e))?;

        let snapshot = directory.join(CONFIGURATION_FILE_NAME);
        let bytes = serde_json::to_vec(body)?;
        fs::write(&snapshot, bytes).map_err(|e| WorkspaceError::io(&snapshot, e))?;

        debug!(
            calculation_id = %calculation_id,
            directory = %directory.display(),
            "Staged calculation workspace"
        );
        Ok(directory)
    }

    /// Last-resort persistence for a result the queue would not take. Lands
    /// in the job's workspace when one exists, otherwise in a shared
    /// `undeliverable/` directory under the data root.
    pub fn persist_undeliverable(
        &self,
        result: &CalculationResult,
    ) -> Result<PathBuf, WorkspaceError> {
        let directory = match Self::validate_calculation_id(&result.calculation_id) {
            Ok(()) => self.workspace_path(&result.calculation_id),
            Err(_) => self.data_root.join(UNDELIVERABLE_DIR_NAME),
        };
        fs::create_dir_all(&directory).map_err(|e| WorkspaceError::io(&directory, e))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let path = directory.join(format!("result.undeliverable.{timestamp}.json"));
        let bytes = serde_json::to_vec(result)?;
        fs::write(&path, bytes).map_err(|e| WorkspaceError::io(&path, e))?;
        Ok(path)
    }
}
