//! Request/response bodies for the inward surfaces.
//!
//! The transport (HTTP, WS, stdio) is an implementation detail elsewhere;
//! these are the typed bodies it carries. The status-code mapping is fixed:
//! a blocked admission is 422 with the verdict under `details`, a
//! proceed-with-warning is 200 with `warnings` populated, infrastructure
//! failures are 500 with an [`ErrorResponse`].

use crate::types::{
    AdmissionVerdict, DocType, EnforcementMode, OnDocFailure, ProjectId, Step,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Single-document admission
// ============================================================================

/// Query for a single-document admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionQuery {
    pub project_id: ProjectId,
    pub doc_type: DocType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<EnforcementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_override: Option<bool>,
}

/// Body returned when admission is granted (with or without warnings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionGranted {
    pub verdict: AdmissionVerdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Body returned when admission is blocked (HTTP 422).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionBlocked {
    pub error: String,
    pub details: AdmissionVerdict,
}

/// Generic infrastructure error body (HTTP 500).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ============================================================================
// Plan submission
// ============================================================================

/// Executor policy knobs carried with a plan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutionPolicy {
    #[serde(default)]
    pub on_doc_failure: OnDocFailure,
    #[serde(default)]
    pub gate_after_final_step: bool,
    /// Gate timeout in seconds; absent means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_timeout_secs: Option<u64>,
}

impl ExecutionPolicy {
    pub fn decision_timeout(&self) -> Option<Duration> {
        self.decision_timeout_secs.map(Duration::from_secs)
    }
}

/// Submission of a multi-step generation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub project_id: ProjectId,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<EnforcementMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ExecutionPolicy>,
}

/// One unresolved admission gap found during plan validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFailure {
    /// 1-based step index.
    pub step_index: usize,
    pub doc_type: DocType,
    pub missing_required: Vec<DocType>,
    pub error_message: String,
}

/// Full validation report, returned synchronously before any generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanValidation {
    pub ok: bool,
    pub failures: Vec<PlanFailure>,
}

impl PlanValidation {
    pub fn passed() -> Self {
        Self {
            ok: true,
            failures: Vec::new(),
        }
    }

    pub fn failed(failures: Vec<PlanFailure>) -> Self {
        Self {
            ok: failures.is_empty(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy: ExecutionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.on_doc_failure, OnDocFailure::AbortStep);
        assert!(!policy.gate_after_final_step);
        assert_eq!(policy.decision_timeout(), None);
    }

    #[test]
    fn plan_request_minimal() {
        let json = r#"{
            "project_id": 1,
            "steps": [
                {"docs": [{"type": "stakeholder-register", "message": "kickoff"}]}
            ]
        }"#;
        let request: PlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.project_id, ProjectId::new(1));
        assert_eq!(request.steps.len(), 1);
        assert!(request.mode.is_none());
    }

    #[test]
    fn validation_failed_with_empty_list_is_ok() {
        assert!(PlanValidation::failed(Vec::new()).ok);
    }
}
