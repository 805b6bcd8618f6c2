//! Run events and user decisions for the streaming plan session.
//!
//! Both sets are closed; strict enum tagging keeps exhaustiveness checkable
//! and the wire schema stable. Step indices are 1-based in every payload.

use crate::types::{AdmissionVerdict, ArtifactId, DocType};
use serde::{Deserialize, Serialize};

/// Events emitted by the plan executor, in strict emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A step began executing.
    StepStart { index: usize, total: usize },
    /// A doc within the current step is about to be admitted and generated.
    DocStart {
        doc_type: DocType,
        display_name: String,
    },
    /// Generator progress for the doc currently in flight.
    DocProgress { doc_type: DocType, percent: u8 },
    /// The doc was generated and merged into the available set.
    DocCompleted {
        doc_type: DocType,
        artifact_id: ArtifactId,
        storage_path: String,
    },
    /// Admission denial or generator failure for one doc.
    DocFailed {
        doc_type: DocType,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        verdict: Option<Box<AdmissionVerdict>>,
    },
    /// Every doc of the step succeeded.
    StepCompleted { index: usize },
    /// At least one doc of the step failed.
    StepFailed { index: usize, summary: String },
    /// The run is gated on a user decision before the given step.
    AwaitDecision { next_index: usize },
    /// Terminal: all steps processed.
    RunCompleted,
    /// Terminal: the user stopped the run at a gate (or a gate timed out).
    RunStopped,
    /// Terminal: the session was cancelled externally.
    RunCancelled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Terminal: infrastructure or protocol failure.
    RunFailed { reason: String },
}

impl RunEvent {
    /// True for the four events that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::RunCompleted
                | RunEvent::RunStopped
                | RunEvent::RunCancelled { .. }
                | RunEvent::RunFailed { .. }
        )
    }
}

/// Decisions received on the channel while the executor waits at a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Advance to the next step.
    Continue,
    /// End the run gracefully.
    Stop,
    /// Re-run one doc of the most recent step in place.
    Retry { doc_type: DocType },
    /// Advance past the next step without generating it.
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tagging_is_snake_case() {
        let event = RunEvent::StepStart { index: 1, total: 3 };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"step_start","index":1,"total":3}"#);

        let event = RunEvent::AwaitDecision { next_index: 2 };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"await_decision","next_index":2}"#);
    }

    #[test]
    fn decision_round_trip() {
        let decision: Decision = serde_json::from_str(r#"{"type":"continue"}"#).unwrap();
        assert_eq!(decision, Decision::Continue);

        let decision: Decision =
            serde_json::from_str(r#"{"type":"retry","doc_type":"uiux-wireframe"}"#).unwrap();
        assert_eq!(
            decision,
            Decision::Retry {
                doc_type: DocType::new("uiux-wireframe")
            }
        );
    }

    #[test]
    fn terminal_classification() {
        assert!(RunEvent::RunCompleted.is_terminal());
        assert!(RunEvent::RunCancelled { reason: None }.is_terminal());
        assert!(!RunEvent::StepCompleted { index: 1 }.is_terminal());
    }
}
