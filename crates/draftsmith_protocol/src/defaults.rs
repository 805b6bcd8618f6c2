//! Canonical default values shared across the workspace.

use crate::types::{EnforcementMode, OnDocFailure};

pub const DEFAULT_ENFORCEMENT_MODE: EnforcementMode = EnforcementMode::Guided;
pub const DEFAULT_ALLOW_OVERRIDE: bool = true;
pub const DEFAULT_ON_DOC_FAILURE: OnDocFailure = OnDocFailure::AbortStep;
pub const DEFAULT_GATE_AFTER_FINAL_STEP: bool = false;

/// Advisory minimum content length (bytes) a prerequisite document should
/// have to be useful as generator context. Exposed to generators, never
/// enforced by the core.
pub const DEFAULT_MIN_PREREQUISITE_CONTENT_LENGTH: usize = 100;

/// Extraction writes this start value when it could not locate a section;
/// such ranges must not contribute their doc type.
pub const SENTINEL_RANGE_START: i64 = -1;

pub const CANCELLED_BY_USER_MESSAGE: &str = "Cancelled by user";
