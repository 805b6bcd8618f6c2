//! The generator seam: the external collaborator that actually produces
//! documents. The core only dispatches and observes.

use crate::cancel::CancelToken;
use async_trait::async_trait;
use draftsmith_protocol::{ArtifactId, DocType, ProjectId};
use thiserror::Error;
use tokio::sync::mpsc;

/// Everything a generator needs for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub project: ProjectId,
    pub doc_type: DocType,
    pub display_name: String,
    /// Prerequisite storage paths assembled by the admission evaluator.
    pub context_paths: Vec<String>,
    /// The user's message for this doc.
    pub message: String,
    /// Advisory: prerequisites shorter than this are probably placeholders.
    pub min_prerequisite_content_length: usize,
}

/// A successfully produced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub artifact_id: ArtifactId,
    pub storage_path: String,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation cancelled")]
    Cancelled,
    #[error("generator failed: {0}")]
    Failed(String),
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// External document generator.
///
/// Implementations should report coarse progress (0..=100) through
/// `progress` and observe `cancel` between units of work; the executor may
/// also drop the future outright on cancellation.
#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: mpsc::Sender<u8>,
        cancel: &CancelToken,
    ) -> Result<GeneratedArtifact, GenerateError>;
}
