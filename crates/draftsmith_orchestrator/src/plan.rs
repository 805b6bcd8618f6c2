//! Up-front plan validation with forward simulation.
//!
//! Validation walks the whole plan before any generation happens so the user
//! sees every structural problem at once instead of a drip of errors after
//! partial work.

use crate::admission::{evaluate, EvaluateOptions};
use crate::inspect::{InspectError, ProjectInspector, ProjectState};
use draftsmith_catalog::ConstraintCatalog;
use draftsmith_protocol::{EnforcementMode, Plan, PlanFailure, PlanValidation, ProjectId};

/// Validate a plan against a project snapshot.
///
/// Each step's doc types are unioned into the simulated available set after
/// the step is walked, whether or not any single doc failed: that reflects
/// "if we were to run this step, these would become available", and keeps
/// later steps' reports about their own gaps rather than cascading noise.
///
/// Overrides are interactive, not plan-level, so evaluation runs with
/// `allow_override = false`; under Guided this blocks exactly the docs that
/// would block at execution time.
pub fn validate(
    catalog: &ConstraintCatalog,
    plan: &Plan,
    state: &ProjectState,
    mode: EnforcementMode,
) -> PlanValidation {
    let mut generated_so_far = state.docs.clone();
    let mut failures = Vec::new();

    for (step_idx, step) in plan.steps.iter().enumerate() {
        for doc in &step.docs {
            let opts = EvaluateOptions {
                mode,
                additional_available: generated_so_far.clone(),
                allow_override: false,
            };
            let verdict = evaluate(catalog, &doc.doc_type, state, &opts);
            if !verdict.admits(false) {
                failures.push(PlanFailure {
                    step_index: step_idx + 1,
                    doc_type: doc.doc_type.clone(),
                    missing_required: verdict.missing_required.clone(),
                    error_message: verdict
                        .error_message
                        .unwrap_or_else(|| format!("Cannot generate {}", verdict.display_name)),
                });
            }
        }
        for doc in &step.docs {
            generated_so_far.insert(doc.doc_type.clone());
        }
    }

    PlanValidation::failed(failures)
}

/// Inspect the project, then validate.
pub async fn validate_project<I: ProjectInspector + ?Sized>(
    catalog: &ConstraintCatalog,
    inspector: &I,
    project: ProjectId,
    plan: &Plan,
    mode: EnforcementMode,
) -> Result<PlanValidation, InspectError> {
    let state = inspector.inspect(project).await?;
    Ok(validate(catalog, plan, &state, mode))
}
