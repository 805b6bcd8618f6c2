//! In-memory collaborators for exercising the orchestrator without real
//! storage, a real generator, or a real transport.

use async_trait::async_trait;
use draftsmith_orchestrator::{
    CancelToken, ChannelError, DocGenerator, GenerateError, GeneratedArtifact, GenerationRequest,
    InspectError, ProjectInspector, ProjectState, Received, SessionChannel,
};
use draftsmith_protocol::{ArtifactId, Decision, DocType, ProjectId, RunEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Inspector
// ============================================================================

/// Inspector over a fixed in-memory state, updatable mid-test to simulate
/// concurrent uploads.
#[derive(Default)]
pub struct MemoryInspector {
    states: Mutex<HashMap<ProjectId, ProjectState>>,
    fail_io: Mutex<bool>,
}

impl MemoryInspector {
    pub fn new(project: ProjectId, state: ProjectState) -> Self {
        let inspector = Self::default();
        inspector.set_state(project, state);
        inspector
    }

    /// Build a state from `(doc_type, path)` pairs.
    pub fn with_docs(project: ProjectId, docs: &[(&str, &str)]) -> Self {
        let mut state = ProjectState::default();
        for (doc_type, path) in docs {
            let doc_type = DocType::new(*doc_type);
            state.docs.insert(doc_type.clone());
            state.paths.insert(doc_type, path.to_string());
        }
        Self::new(project, state)
    }

    pub fn set_state(&self, project: ProjectId, state: ProjectState) {
        self.states.lock().unwrap().insert(project, state);
    }

    /// Make every subsequent inspect fail with an I/O error.
    pub fn fail_with_io(&self, fail: bool) {
        *self.fail_io.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ProjectInspector for MemoryInspector {
    async fn inspect(&self, project: ProjectId) -> Result<ProjectState, InspectError> {
        if *self.fail_io.lock().unwrap() {
            return Err(InspectError::Io {
                path: "<memory>".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            });
        }
        self.states
            .lock()
            .unwrap()
            .get(&project)
            .cloned()
            .ok_or(InspectError::UnknownProject(project))
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Per-doc behavior of the [`MockGenerator`].
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Emit the given progress percentages, then succeed.
    Succeed { progress: Vec<u8> },
    /// Fail with the given reason.
    Fail(String),
    /// Fail the next `n` attempts, then succeed. Exercises retry.
    FailTimes(u32),
    /// Park until the run is cancelled.
    HangUntilCancelled,
}

impl Default for MockBehavior {
    fn default() -> Self {
        MockBehavior::Succeed {
            progress: Vec::new(),
        }
    }
}

/// Scriptable generator; records every request it receives.
#[derive(Default)]
pub struct MockGenerator {
    behaviors: Mutex<HashMap<DocType, MockBehavior>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behave(&self, doc_type: &str, behavior: MockBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(DocType::new(doc_type), behavior);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocGenerator for MockGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: tokio::sync::mpsc::Sender<u8>,
        cancel: &CancelToken,
    ) -> Result<GeneratedArtifact, GenerateError> {
        self.requests.lock().unwrap().push(request.clone());
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&request.doc_type)
            .cloned()
            .unwrap_or_default();

        match behavior {
            MockBehavior::Succeed { progress: steps } => {
                for percent in steps {
                    // Receiver lag is not a test failure.
                    let _ = progress.send(percent).await;
                    tokio::task::yield_now().await;
                }
                Ok(GeneratedArtifact {
                    artifact_id: ArtifactId::generate(),
                    storage_path: format!("/generated/{}.md", request.doc_type),
                })
            }
            MockBehavior::Fail(reason) => Err(GenerateError::Failed(reason)),
            MockBehavior::FailTimes(remaining) => {
                if remaining > 0 {
                    self.behaviors.lock().unwrap().insert(
                        request.doc_type.clone(),
                        MockBehavior::FailTimes(remaining - 1),
                    );
                    Err(GenerateError::Failed(format!(
                        "transient failure ({remaining} left)"
                    )))
                } else {
                    Ok(GeneratedArtifact {
                        artifact_id: ArtifactId::generate(),
                        storage_path: format!("/generated/{}.md", request.doc_type),
                    })
                }
            }
            MockBehavior::HangUntilCancelled => {
                cancel.cancelled().await;
                Err(GenerateError::Cancelled)
            }
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// What the scripted channel replies at each decision gate.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Decision(Decision),
    TimedOut,
    Closed,
}

/// Channel that records events and replays a fixed decision script.
/// When the script runs dry, further receives report closure.
#[derive(Default)]
pub struct ScriptedChannel {
    pub events: Vec<RunEvent>,
    script: VecDeque<ScriptedReply>,
    pub closed: bool,
    pub close_count: usize,
}

impl ScriptedChannel {
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            events: Vec::new(),
            script: script.into(),
            closed: false,
            close_count: 0,
        }
    }

    pub fn replying(decisions: Vec<Decision>) -> Self {
        Self::new(decisions.into_iter().map(ScriptedReply::Decision).collect())
    }

    /// The emitted event type tags, in order. Convenient for asserting the
    /// event grammar without matching payloads.
    pub fn event_tags(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .map(|event| match event {
                RunEvent::StepStart { .. } => "step_start",
                RunEvent::DocStart { .. } => "doc_start",
                RunEvent::DocProgress { .. } => "doc_progress",
                RunEvent::DocCompleted { .. } => "doc_completed",
                RunEvent::DocFailed { .. } => "doc_failed",
                RunEvent::StepCompleted { .. } => "step_completed",
                RunEvent::StepFailed { .. } => "step_failed",
                RunEvent::AwaitDecision { .. } => "await_decision",
                RunEvent::RunCompleted => "run_completed",
                RunEvent::RunStopped => "run_stopped",
                RunEvent::RunCancelled { .. } => "run_cancelled",
                RunEvent::RunFailed { .. } => "run_failed",
            })
            .collect()
    }
}

#[async_trait]
impl SessionChannel for ScriptedChannel {
    async fn send(&mut self, event: RunEvent) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.events.push(event);
        Ok(())
    }

    async fn receive(&mut self, _timeout: Option<Duration>) -> Received {
        match self.script.pop_front() {
            Some(ScriptedReply::Decision(decision)) => Received::Decision(decision),
            Some(ScriptedReply::TimedOut) => Received::TimedOut,
            Some(ScriptedReply::Closed) | None => Received::Closed,
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.close_count += 1;
    }
}
