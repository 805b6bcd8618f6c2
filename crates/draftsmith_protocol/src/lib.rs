//! Shared types for the Draftsmith orchestrator.
//!
//! Everything that crosses a component boundary lives here: document type
//! identifiers, admission verdicts, plan records, run events and user
//! decisions, and the API response envelopes. All types use serde with
//! strict enum tagging so clients (CLI, MCP, a future HTTP surface) speak
//! one schema.

pub mod api;
pub mod defaults;
pub mod events;
pub mod types;

// Re-export the working set for convenience
pub use types::{
    AdmissionVerdict,
    ArtifactId,
    ArtifactOrigin,
    Category,
    DocType,
    DocTypeError,
    EnforcementMode,
    ExtractedDocRange,
    OnDocFailure,
    Plan,
    PlannedDoc,
    ProjectFile,
    ProjectId,
    ProjectIdError,
    Step,
    Suggestion,
    SuggestionAction,
};

pub use events::{Decision, RunEvent};

pub use api::{
    AdmissionBlocked, AdmissionGranted, AdmissionQuery, ErrorResponse, ExecutionPolicy,
    PlanFailure, PlanRequest, PlanValidation,
};
