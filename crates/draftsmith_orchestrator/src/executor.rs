//! Stepwise execution of validated plans.
//!
//! One executor drives one run end-to-end: per step it re-admits and
//! generates each doc in declaration order, emits progress over the session
//! channel, and gates on a user decision between steps. Event emission is
//! strictly serialized; the channel is closed exactly once, here, on run
//! end.

use crate::admission::{evaluate, EvaluateOptions};
use crate::cancel::CancelToken;
use crate::channel::{ChannelError, Received, SessionChannel};
use crate::generate::{DocGenerator, GeneratedArtifact, GenerationRequest};
use crate::inspect::{InspectError, ProjectInspector};
use draftsmith_catalog::ConstraintCatalog;
use draftsmith_protocol::api::ExecutionPolicy;
use draftsmith_protocol::defaults;
use draftsmith_protocol::{
    Decision, DocType, EnforcementMode, OnDocFailure, Plan, PlannedDoc, ProjectId, RunEvent,
};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Behaviour knobs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorPolicy {
    pub on_doc_failure: OnDocFailure,
    pub gate_after_final_step: bool,
    /// How long to wait at a decision gate; `None` waits indefinitely.
    /// A timeout resolves the gate as Stop.
    pub decision_timeout: Option<Duration>,
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self {
            on_doc_failure: defaults::DEFAULT_ON_DOC_FAILURE,
            gate_after_final_step: defaults::DEFAULT_GATE_AFTER_FINAL_STEP,
            decision_timeout: None,
        }
    }
}

impl From<ExecutionPolicy> for ExecutorPolicy {
    fn from(policy: ExecutionPolicy) -> Self {
        Self {
            on_doc_failure: policy.on_doc_failure,
            gate_after_final_step: policy.gate_after_final_step,
            decision_timeout: policy.decision_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct DocRunState {
    pub doc_type: DocType,
    pub status: DocStatus,
    pub artifact: Option<GeneratedArtifact>,
}

#[derive(Debug, Clone)]
pub struct StepRunState {
    pub status: StepStatus,
    pub docs: Vec<DocRunState>,
}

/// Live state of one plan execution. Owned exclusively by the executor for
/// the duration of the run, returned with the report afterwards.
#[derive(Debug, Clone)]
pub struct PlanRunState {
    pub steps: Vec<StepRunState>,
    /// Doc types produced by earlier steps of this run.
    pub generated_so_far: BTreeSet<DocType>,
}

impl PlanRunState {
    fn new(plan: &Plan) -> Self {
        Self {
            steps: plan
                .steps
                .iter()
                .map(|step| StepRunState {
                    status: StepStatus::Pending,
                    docs: step
                        .docs
                        .iter()
                        .map(|doc| DocRunState {
                            doc_type: doc.doc_type.clone(),
                            status: DocStatus::Pending,
                            artifact: None,
                        })
                        .collect(),
                })
                .collect(),
            generated_so_far: BTreeSet::new(),
        }
    }

    fn doc_mut(&mut self, step_idx: usize, doc_type: &DocType) -> Option<&mut DocRunState> {
        self.steps[step_idx]
            .docs
            .iter_mut()
            .find(|doc| &doc.doc_type == doc_type)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Cancelled,
    Failed { reason: String },
}

/// Final report: outcome plus the full run state.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub state: PlanRunState,
}

/// Infrastructure failures that abort a run. Admission denials and generator
/// failures are per-doc events, never errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("session channel failed: {0}")]
    Channel(#[from] ChannelError),
    #[error("project inspection failed: {0}")]
    Inspect(#[from] InspectError),
}

enum StepFlow {
    Done,
    Cancelled,
}

enum DocFlow {
    Completed,
    Failed,
    Cancelled,
}

/// Drives validated plans for one (catalog, inspector, generator) triple.
pub struct PlanExecutor<'a, I, G> {
    catalog: &'a ConstraintCatalog,
    inspector: &'a I,
    generator: &'a G,
    mode: EnforcementMode,
    policy: ExecutorPolicy,
    min_prerequisite_content_length: usize,
}

impl<'a, I, G> PlanExecutor<'a, I, G>
where
    I: ProjectInspector,
    G: DocGenerator,
{
    pub fn new(catalog: &'a ConstraintCatalog, inspector: &'a I, generator: &'a G) -> Self {
        Self {
            catalog,
            inspector,
            generator,
            mode: defaults::DEFAULT_ENFORCEMENT_MODE,
            policy: ExecutorPolicy::default(),
            min_prerequisite_content_length: defaults::DEFAULT_MIN_PREREQUISITE_CONTENT_LENGTH,
        }
    }

    pub fn with_mode(mut self, mode: EnforcementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: ExecutorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_min_prerequisite_content_length(mut self, length: usize) -> Self {
        self.min_prerequisite_content_length = length;
        self
    }

    /// Execute the plan. The plan must have passed validation; admission is
    /// still re-checked per doc because the project can change underneath a
    /// long run.
    ///
    /// Emits exactly one terminal event and closes the channel on every
    /// path, including infrastructure errors (best effort there).
    pub async fn run<C: SessionChannel>(
        &self,
        plan: &Plan,
        project: ProjectId,
        channel: &mut C,
        cancel: &CancelToken,
    ) -> Result<RunReport, ExecuteError> {
        let mut state = PlanRunState::new(plan);
        info!(%project, steps = plan.steps.len(), docs = plan.doc_count(), "plan run starting");

        match self.drive(plan, project, channel, cancel, &mut state).await {
            Ok(outcome) => {
                let terminal = terminal_event(&outcome);
                let sent = channel.send(terminal).await;
                channel.close();
                sent?;
                info!(?outcome, "plan run finished");
                Ok(RunReport { outcome, state })
            }
            Err(err) => {
                // Best effort: the channel itself may be what failed.
                let _ = channel
                    .send(RunEvent::RunFailed {
                        reason: err.to_string(),
                    })
                    .await;
                channel.close();
                Err(err)
            }
        }
    }

    async fn drive<C: SessionChannel>(
        &self,
        plan: &Plan,
        project: ProjectId,
        channel: &mut C,
        cancel: &CancelToken,
        state: &mut PlanRunState,
    ) -> Result<RunOutcome, ExecuteError> {
        let total = plan.steps.len();
        let mut step_idx = 0usize;

        while step_idx < total {
            if cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            let docs = &plan.steps[step_idx].docs;
            match self
                .execute_step(step_idx, total, docs, project, channel, cancel, state)
                .await?
            {
                StepFlow::Cancelled => return Ok(RunOutcome::Cancelled),
                StepFlow::Done => {}
            }

            let next_idx = step_idx + 1;
            if next_idx >= total && !self.policy.gate_after_final_step {
                break;
            }

            // Decision gate. Retry re-opens the current step and loops back
            // here, so the gate is re-emitted after every retry.
            loop {
                channel
                    .send(RunEvent::AwaitDecision {
                        next_index: next_idx + 1,
                    })
                    .await?;

                let received = tokio::select! {
                    _ = cancel.cancelled() => return Ok(RunOutcome::Cancelled),
                    received = channel.receive(self.policy.decision_timeout) => received,
                };

                match received {
                    Received::Decision(Decision::Continue) => {
                        step_idx = next_idx;
                        break;
                    }
                    Received::Decision(Decision::Stop) => {
                        return Ok(RunOutcome::Stopped);
                    }
                    Received::Decision(Decision::Skip) => {
                        if next_idx < total {
                            state.steps[next_idx].status = StepStatus::Skipped;
                            info!(step = next_idx + 1, "step skipped by user");
                        }
                        step_idx = next_idx + 1;
                        break;
                    }
                    Received::Decision(Decision::Retry { doc_type }) => {
                        let retryable: Vec<PlannedDoc> = plan.steps[step_idx]
                            .docs
                            .iter()
                            .filter(|doc| doc.doc_type == doc_type)
                            .cloned()
                            .collect();
                        if retryable.is_empty() {
                            warn!(%doc_type, "retry requested for doc outside the most recent step");
                            return Ok(RunOutcome::Failed {
                                reason: "invalid decision".to_string(),
                            });
                        }
                        match self
                            .execute_step(
                                step_idx, total, &retryable, project, channel, cancel, state,
                            )
                            .await?
                        {
                            StepFlow::Cancelled => return Ok(RunOutcome::Cancelled),
                            StepFlow::Done => {}
                        }
                    }
                    Received::TimedOut => {
                        info!("decision gate timed out; stopping run");
                        return Ok(RunOutcome::Stopped);
                    }
                    Received::Closed => {
                        return Ok(RunOutcome::Failed {
                            reason: "decision channel closed".to_string(),
                        });
                    }
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_step<C: SessionChannel>(
        &self,
        step_idx: usize,
        total: usize,
        docs: &[PlannedDoc],
        project: ProjectId,
        channel: &mut C,
        cancel: &CancelToken,
        state: &mut PlanRunState,
    ) -> Result<StepFlow, ExecuteError> {
        channel
            .send(RunEvent::StepStart {
                index: step_idx + 1,
                total,
            })
            .await?;
        state.steps[step_idx].status = StepStatus::Running;

        for doc in docs {
            if cancel.is_cancelled() {
                return Ok(StepFlow::Cancelled);
            }
            match self
                .execute_doc(step_idx, doc, project, channel, cancel, state)
                .await?
            {
                DocFlow::Completed => {}
                DocFlow::Failed => {
                    if self.policy.on_doc_failure == OnDocFailure::AbortStep {
                        debug!(step = step_idx + 1, "aborting step after doc failure");
                        break;
                    }
                }
                DocFlow::Cancelled => return Ok(StepFlow::Cancelled),
            }
        }

        let step_state = &mut state.steps[step_idx];
        let incomplete: Vec<&DocRunState> = step_state
            .docs
            .iter()
            .filter(|doc| doc.status != DocStatus::Completed)
            .collect();
        if incomplete.is_empty() {
            step_state.status = StepStatus::Completed;
            channel
                .send(RunEvent::StepCompleted {
                    index: step_idx + 1,
                })
                .await?;
        } else {
            let summary = format!(
                "{} of {} docs did not complete: {}",
                incomplete.len(),
                step_state.docs.len(),
                incomplete
                    .iter()
                    .map(|doc| doc.doc_type.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            step_state.status = StepStatus::Failed;
            channel
                .send(RunEvent::StepFailed {
                    index: step_idx + 1,
                    summary,
                })
                .await?;
        }
        Ok(StepFlow::Done)
    }

    async fn execute_doc<C: SessionChannel>(
        &self,
        step_idx: usize,
        doc: &PlannedDoc,
        project: ProjectId,
        channel: &mut C,
        cancel: &CancelToken,
        state: &mut PlanRunState,
    ) -> Result<DocFlow, ExecuteError> {
        let doc_type = &doc.doc_type;
        let display_name = self.catalog.display_name(doc_type);
        channel
            .send(RunEvent::DocStart {
                doc_type: doc_type.clone(),
                display_name: display_name.clone(),
            })
            .await?;
        if let Some(doc_state) = state.doc_mut(step_idx, doc_type) {
            doc_state.status = DocStatus::Running;
            doc_state.artifact = None;
        }

        // Defensive re-admission: a concurrent upload may have changed the
        // project since validation.
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => return Ok(DocFlow::Cancelled),
            result = self.inspector.inspect(project) => result?,
        };
        let opts = EvaluateOptions {
            mode: self.mode,
            additional_available: state.generated_so_far.clone(),
            allow_override: false,
        };
        let verdict = evaluate(self.catalog, doc_type, &snapshot, &opts);
        if !verdict.admits(false) {
            let reason = verdict
                .error_message
                .clone()
                .unwrap_or_else(|| format!("Admission denied for {display_name}"));
            warn!(%doc_type, "admission denied during execution");
            channel
                .send(RunEvent::DocFailed {
                    doc_type: doc_type.clone(),
                    reason,
                    verdict: Some(Box::new(verdict)),
                })
                .await?;
            if let Some(doc_state) = state.doc_mut(step_idx, doc_type) {
                doc_state.status = DocStatus::Failed;
            }
            return Ok(DocFlow::Failed);
        }
        if !verdict.satisfied {
            warn!(
                %doc_type,
                missing = ?verdict.missing_required,
                "proceeding despite missing required prerequisites"
            );
        }

        let request = GenerationRequest {
            project,
            doc_type: doc_type.clone(),
            display_name,
            context_paths: verdict.context_paths.clone(),
            message: doc.message.clone(),
            min_prerequisite_content_length: self.min_prerequisite_content_length,
        };

        let (progress_tx, mut progress_rx) = mpsc::channel::<u8>(16);
        let generation = self.generator.generate(&request, progress_tx, cancel);
        tokio::pin!(generation);

        let result = loop {
            tokio::select! {
                result = &mut generation => break result,
                Some(percent) = progress_rx.recv() => {
                    channel
                        .send(RunEvent::DocProgress {
                            doc_type: doc_type.clone(),
                            percent: percent.min(100),
                        })
                        .await?;
                }
                _ = cancel.cancelled() => {
                    // Dropping the in-flight generation future aborts the
                    // call; the generator also observes the shared token.
                    return Ok(DocFlow::Cancelled);
                }
            }
        };

        // Progress the generator flushed right before finishing.
        while let Ok(percent) = progress_rx.try_recv() {
            channel
                .send(RunEvent::DocProgress {
                    doc_type: doc_type.clone(),
                    percent: percent.min(100),
                })
                .await?;
        }

        match result {
            Ok(artifact) => {
                state.generated_so_far.insert(doc_type.clone());
                channel
                    .send(RunEvent::DocCompleted {
                        doc_type: doc_type.clone(),
                        artifact_id: artifact.artifact_id,
                        storage_path: artifact.storage_path.clone(),
                    })
                    .await?;
                if let Some(doc_state) = state.doc_mut(step_idx, doc_type) {
                    doc_state.status = DocStatus::Completed;
                    doc_state.artifact = Some(artifact);
                }
                Ok(DocFlow::Completed)
            }
            Err(err) => {
                info!(%doc_type, error = %err, "generation failed");
                channel
                    .send(RunEvent::DocFailed {
                        doc_type: doc_type.clone(),
                        reason: err.to_string(),
                        verdict: None,
                    })
                    .await?;
                if let Some(doc_state) = state.doc_mut(step_idx, doc_type) {
                    doc_state.status = DocStatus::Failed;
                }
                Ok(DocFlow::Failed)
            }
        }
    }
}

fn terminal_event(outcome: &RunOutcome) -> RunEvent {
    match outcome {
        RunOutcome::Completed => RunEvent::RunCompleted,
        RunOutcome::Stopped => RunEvent::RunStopped,
        RunOutcome::Cancelled => RunEvent::RunCancelled {
            reason: Some(defaults::CANCELLED_BY_USER_MESSAGE.to_string()),
        },
        RunOutcome::Failed { reason } => RunEvent::RunFailed {
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_protocol::{PlannedDoc, Step};

    #[test]
    fn wire_policy_converts_with_defaults() {
        let policy: ExecutionPolicy = serde_json::from_str("{}").unwrap();
        let policy: ExecutorPolicy = policy.into();
        assert_eq!(policy, ExecutorPolicy::default());

        let policy: ExecutionPolicy = serde_json::from_str(
            r#"{"on_doc_failure":"continue-step","gate_after_final_step":true,"decision_timeout_secs":30}"#,
        )
        .unwrap();
        let policy: ExecutorPolicy = policy.into();
        assert_eq!(policy.on_doc_failure, OnDocFailure::ContinueStep);
        assert!(policy.gate_after_final_step);
        assert_eq!(policy.decision_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn run_state_starts_pending_and_empty() {
        let plan = Plan {
            steps: vec![Step {
                docs: vec![PlannedDoc {
                    doc_type: DocType::new("srs"),
                    message: String::new(),
                }],
            }],
        };
        let state = PlanRunState::new(&plan);
        assert_eq!(state.steps.len(), 1);
        assert_eq!(state.steps[0].status, StepStatus::Pending);
        assert_eq!(state.steps[0].docs[0].status, DocStatus::Pending);
        assert!(state.generated_so_far.is_empty());
    }
}
