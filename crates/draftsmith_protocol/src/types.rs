//! Core value types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Canonical project identifier across the system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProjectId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ProjectId {
    type Err = ProjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|_| ProjectIdError::Parse(s.to_string()))?;
        Ok(ProjectId::new(value))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectIdError {
    #[error("invalid project id: {0}")]
    Parse(String),
}

/// Identifier of a stored or generated artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Document types
// ============================================================================

/// Opaque document type identifier (lowercase, hyphenated, e.g. `hld-arch`).
///
/// The value itself is open; membership in the closed set is decided by the
/// constraint catalog. `DocType::new` normalizes to lowercase so lookups are
/// case-insensitive at the edges; `DocType::parse` additionally rejects
/// identifiers outside `[a-z0-9-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DocType(String);

impl DocType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    pub fn parse(value: &str) -> Result<Self, DocTypeError> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(DocTypeError::Empty);
        }
        if !normalized
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
        {
            return Err(DocTypeError::InvalidChars(value.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocType {
    type Err = DocTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocType::parse(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocTypeError {
    #[error("doc type cannot be empty")]
    Empty,
    #[error("doc type may only contain [a-z0-9-]: {0:?}")]
    InvalidChars(String),
}

/// Document category - the CANONICAL closed set, used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Planning,
    Analysis,
    Design,
    Srs,
    Diagram,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Planning => "planning",
            Category::Analysis => "analysis",
            Category::Design => "design",
            Category::Srs => "srs",
            Category::Diagram => "diagram",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Enforcement
// ============================================================================

/// Strictness applied to missing required prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnforcementMode {
    /// Admit only when all required prerequisites are present.
    Strict,
    /// Admit when satisfied, or when the caller explicitly overrides.
    #[default]
    Guided,
    /// Always admit; violations are logged, never blocked.
    Permissive,
}

impl EnforcementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementMode::Strict => "STRICT",
            EnforcementMode::Guided => "GUIDED",
            EnforcementMode::Permissive => "PERMISSIVE",
        }
    }
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRICT" => Ok(EnforcementMode::Strict),
            "GUIDED" => Ok(EnforcementMode::Guided),
            "PERMISSIVE" => Ok(EnforcementMode::Permissive),
            other => Err(format!("unknown enforcement mode: {other}")),
        }
    }
}

/// What the executor does when a single doc fails within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OnDocFailure {
    /// Stop processing the remaining docs of the step (default).
    #[default]
    AbortStep,
    /// Keep processing the remaining docs; the step still ends failed.
    ContinueStep,
}

impl FromStr for OnDocFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort-step" => Ok(OnDocFailure::AbortStep),
            "continue-step" => Ok(OnDocFailure::ContinueStep),
            other => Err(format!("unknown doc-failure policy: {other}")),
        }
    }
}

// ============================================================================
// Project files (as the inspector sees them)
// ============================================================================

/// A doc type extracted from an uploaded file with its line range.
///
/// The range is a trust signal: extraction writes `start = -1` when it could
/// not locate the section, and such entries must not contribute the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocRange {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub start: i64,
    pub end: i64,
}

impl ExtractedDocRange {
    pub fn is_trusted(&self) -> bool {
        self.start != crate::defaults::SENTINEL_RANGE_START
    }
}

/// Where a stored file came from, with the origin-specific doc type evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "kebab-case")]
pub enum ArtifactOrigin {
    /// Produced by the generator; the doc type is authoritative.
    AiGenerated { doc_type: DocType },
    /// Uploaded by a user; doc types come from extraction metadata,
    /// bare declared types, and legacy manual tags.
    UserUploaded {
        #[serde(default)]
        extracted: Vec<ExtractedDocRange>,
        #[serde(default)]
        declared: Vec<DocType>,
        #[serde(default)]
        manual_tags: Vec<DocType>,
    },
}

/// A stored file associated with a project, as reported by external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub file_id: Uuid,
    pub project_id: ProjectId,
    #[serde(flatten)]
    pub origin: ArtifactOrigin,
    pub storage_path: String,
    /// Markdown-rendered copy, preferred for generator context when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ProjectFile {
    /// The path fed to generators: rendered markdown when available.
    pub fn preferred_path(&self) -> &str {
        self.rendered_path.as_deref().unwrap_or(&self.storage_path)
    }
}

// ============================================================================
// Plans
// ============================================================================

/// One doc to generate within a step, with its user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDoc {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    #[serde(default)]
    pub message: String,
}

/// An ordered group of docs produced together before the next gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub docs: Vec<PlannedDoc>,
}

/// An ordered sequence of steps. Session-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(|step| step.docs.is_empty())
    }

    /// Total number of docs across all steps.
    pub fn doc_count(&self) -> usize {
        self.steps.iter().map(|step| step.docs.len()).sum()
    }
}

// ============================================================================
// Admission verdicts
// ============================================================================

/// Actionable hint presented to the user alongside a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionAction {
    Generate,
    Upload,
    Override,
}

/// One suggestion derived from a missing prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub action: SuggestionAction,
    pub doc_type: DocType,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_hint: Option<String>,
    pub description: String,
}

/// The pure outcome of a single-document admission evaluation.
///
/// Immutable once returned. Whether generation proceeds is decided by
/// [`AdmissionVerdict::admits`], never by mutating the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionVerdict {
    pub doc_type: DocType,
    pub display_name: String,
    pub satisfied: bool,
    pub mode: EnforcementMode,
    pub missing_required: Vec<DocType>,
    pub missing_recommended: Vec<DocType>,
    pub available_docs: Vec<DocType>,
    pub context_paths: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

impl AdmissionVerdict {
    /// The admission rule: turns a verdict into a proceed/block decision.
    ///
    /// Strict admits iff satisfied; Guided admits when satisfied or when the
    /// caller overrides; Permissive always admits.
    pub fn admits(&self, allow_override: bool) -> bool {
        match self.mode {
            EnforcementMode::Strict => self.satisfied,
            EnforcementMode::Guided => self.satisfied || allow_override,
            EnforcementMode::Permissive => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_type_normalizes_case() {
        assert_eq!(DocType::new(" HLD-Arch "), DocType::new("hld-arch"));
    }

    #[test]
    fn doc_type_parse_rejects_bad_chars() {
        assert!(DocType::parse("srs").is_ok());
        assert!(DocType::parse("uiux-mockup").is_ok());
        assert!(matches!(
            DocType::parse("has space"),
            Err(DocTypeError::InvalidChars(_))
        ));
        assert!(matches!(DocType::parse("  "), Err(DocTypeError::Empty)));
    }

    #[test]
    fn enforcement_mode_wire_format_is_uppercase() {
        let json = serde_json::to_string(&EnforcementMode::Guided).unwrap();
        assert_eq!(json, "\"GUIDED\"");
        let parsed: EnforcementMode = serde_json::from_str("\"STRICT\"").unwrap();
        assert_eq!(parsed, EnforcementMode::Strict);
    }

    #[test]
    fn extracted_range_trust() {
        let trusted = ExtractedDocRange {
            doc_type: DocType::new("srs"),
            start: 10,
            end: 42,
        };
        let sentinel = ExtractedDocRange {
            doc_type: DocType::new("srs"),
            start: -1,
            end: -1,
        };
        assert!(trusted.is_trusted());
        assert!(!sentinel.is_trusted());
    }

    #[test]
    fn origin_round_trips_with_tag() {
        let origin = ArtifactOrigin::AiGenerated {
            doc_type: DocType::new("brd"),
        };
        let json = serde_json::to_string(&origin).unwrap();
        assert!(json.contains("\"origin\":\"ai-generated\""));
        let back: ArtifactOrigin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, origin);
    }

    #[test]
    fn admits_per_mode() {
        let mut verdict = AdmissionVerdict {
            doc_type: DocType::new("srs"),
            display_name: "Software Requirements Specification".to_string(),
            satisfied: false,
            mode: EnforcementMode::Strict,
            missing_required: vec![DocType::new("functional-requirements")],
            missing_recommended: vec![],
            available_docs: vec![],
            context_paths: vec![],
            suggestions: vec![],
            error_message: None,
            warning_message: None,
        };
        assert!(!verdict.admits(true));

        verdict.mode = EnforcementMode::Guided;
        assert!(verdict.admits(true));
        assert!(!verdict.admits(false));

        verdict.mode = EnforcementMode::Permissive;
        assert!(verdict.admits(false));

        verdict.satisfied = true;
        verdict.mode = EnforcementMode::Strict;
        assert!(verdict.admits(false));
    }
}
