//! Job payload carried to the workflow endpoint.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{CLASSES, DispatchConfig};
use crate::error::{Error, Result};

/// Identifying and parameterizing data for one CI job run.
///
/// Field order is part of the wire contract: `jobId`, `commitHash`,
/// `classes`, `pullRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    /// Unique identifier for this job (UUID v4, hyphenated).
    pub job_id: String,
    /// Commit under test.
    pub commit_hash: String,
    /// Test classes to run, in input order.
    pub classes: Vec<String>,
    /// Pull request number.
    pub pull_request: String,
}

impl JobPayload {
    /// Creates a payload with an explicit job ID.
    #[must_use]
    pub fn new(
        job_id: impl Into<String>,
        commit_hash: impl Into<String>,
        classes: Vec<String>,
        pull_request: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            commit_hash: commit_hash.into(),
            classes,
            pull_request: pull_request.into(),
        }
    }

    /// Builds the payload for `config` with a freshly generated job ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured class list is blank.
    pub fn build(config: &DispatchConfig) -> Result<Self> {
        let classes = parse_classes(&config.classes)?;
        let blank = classes.iter().filter(|class| class.is_empty()).count();
        if blank > 0 {
            tracing::warn!(blank, classes = %config.classes, "class list contains empty entries");
        }

        Ok(Self::new(
            generate_job_id(),
            config.commit_hash.clone(),
            classes,
            config.pull_request.clone(),
        ))
    }

    /// Serializes the payload to compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::serialization(e.to_string()))
    }
}

/// Generates a random job identifier.
#[must_use]
pub fn generate_job_id() -> String {
    Uuid::new_v4().to_string()
}

/// Splits a comma-separated class list and trims each entry.
///
/// Order and count are preserved, so `"A,B,"` gives `["A", "B", ""]`.
/// Re-trimming the output is a no-op.
///
/// # Errors
///
/// Returns an error if the input is blank.
pub fn parse_classes(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Err(Error::invalid_variable(CLASSES, "no classes given"));
    }

    Ok(raw.split(',').map(|class| class.trim().to_string()).collect())
}
