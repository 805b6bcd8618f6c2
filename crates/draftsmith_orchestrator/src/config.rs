//! Orchestrator-wide configuration.

use crate::executor::ExecutorPolicy;
use draftsmith_protocol::defaults;
use draftsmith_protocol::EnforcementMode;

/// Process-wide settings; per-request options override these.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub enforcement_mode: EnforcementMode,
    pub allow_override: bool,
    /// Advisory threshold handed to generators, never enforced here.
    pub min_prerequisite_content_length: usize,
    pub policy: ExecutorPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enforcement_mode: defaults::DEFAULT_ENFORCEMENT_MODE,
            allow_override: defaults::DEFAULT_ALLOW_OVERRIDE,
            min_prerequisite_content_length: defaults::DEFAULT_MIN_PREREQUISITE_CONTENT_LENGTH,
            policy: ExecutorPolicy::default(),
        }
    }
}
