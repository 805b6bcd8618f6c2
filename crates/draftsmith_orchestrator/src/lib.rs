//! Draftsmith orchestration core.
//!
//! Ties the constraint catalog to live projects: single-document admission,
//! up-front plan validation, and gated stepwise plan execution over a
//! session channel. The admission evaluator and plan validator are pure;
//! the only suspension points are project inspection, generator dispatch,
//! and the decision gate.

pub mod admission;
pub mod cancel;
pub mod channel;
pub mod config;
pub mod executor;
pub mod generate;
pub mod inspect;
pub mod plan;

pub use admission::{evaluate, evaluate_project, EvaluateOptions};
pub use cancel::CancelToken;
pub use channel::{session_pair, ChannelError, MpscSessionChannel, Received, SessionChannel, SessionClient};
pub use config::OrchestratorConfig;
pub use executor::{
    DocRunState, DocStatus, ExecuteError, ExecutorPolicy, PlanExecutor, PlanRunState, RunOutcome,
    RunReport, StepRunState, StepStatus,
};
pub use generate::{DocGenerator, GenerateError, GeneratedArtifact, GenerationRequest};
pub use inspect::{
    InspectError, ManifestInspector, ProjectInspector, ProjectManifest, ProjectState,
};
pub use plan::{validate, validate_project};
