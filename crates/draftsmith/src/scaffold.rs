//! Offline document generator that renders markdown skeletons.
//!
//! The production deployment points the generator seam at an LLM service;
//! this implementation lets `plan run` work end-to-end without one, and its
//! output doubles as a starting template for manual authoring.

use async_trait::async_trait;
use draftsmith_catalog::ConstraintCatalog;
use draftsmith_orchestrator::{
    CancelToken, DocGenerator, GenerateError, GeneratedArtifact, GenerationRequest,
};
use draftsmith_protocol::{ArtifactId, Category};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;

/// Writes one markdown skeleton per request into the output directory.
pub struct ScaffoldGenerator {
    out_dir: PathBuf,
    catalog: ConstraintCatalog,
}

impl ScaffoldGenerator {
    pub fn new(out_dir: impl Into<PathBuf>, catalog: ConstraintCatalog) -> Self {
        Self {
            out_dir: out_dir.into(),
            catalog,
        }
    }

    fn render(&self, request: &GenerationRequest) -> String {
        let mut doc = String::new();
        doc.push_str(&format!("# {}\n\n", request.display_name));
        doc.push_str(&format!(
            "- Project: {}\n- Generated: {}\n- Type: `{}`\n\n",
            request.project,
            chrono::Utc::now().to_rfc3339(),
            request.doc_type,
        ));
        if !request.message.is_empty() {
            doc.push_str(&format!("> {}\n\n", request.message));
        }
        if !request.context_paths.is_empty() {
            doc.push_str("## Source Context\n\n");
            for path in &request.context_paths {
                doc.push_str(&format!("- `{path}`\n"));
            }
            doc.push('\n');
        }
        for section in self.sections(request) {
            doc.push_str(&format!("## {section}\n\n_TBD_\n\n"));
        }
        doc
    }

    fn sections(&self, request: &GenerationRequest) -> &'static [&'static str] {
        let category = self
            .catalog
            .lookup(&request.doc_type)
            .map(|constraint| constraint.category);
        match category {
            Some(Category::Planning) => {
                &["Purpose", "Scope", "Stakeholders", "Milestones", "Risks"]
            }
            Some(Category::Analysis) => {
                &["Overview", "Current State", "Findings", "Recommendations"]
            }
            Some(Category::Design) => &["Overview", "Decisions", "Structure", "Open Questions"],
            Some(Category::Srs) => &[
                "Introduction",
                "Overall Description",
                "Specific Requirements",
                "Acceptance Criteria",
            ],
            Some(Category::Diagram) => &["Diagram", "Legend", "Notes"],
            None => &["Content"],
        }
    }
}

#[async_trait]
impl DocGenerator for ScaffoldGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        progress: mpsc::Sender<u8>,
        cancel: &CancelToken,
    ) -> Result<GeneratedArtifact, GenerateError> {
        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        let _ = progress.send(10).await;

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let artifact_id = ArtifactId::generate();
        let file_name = format!("{}-{artifact_id}.md", request.doc_type);
        let path = self.out_dir.join(file_name);

        let body = self.render(request);
        let _ = progress.send(60).await;

        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        tokio::fs::write(&path, body).await?;
        let _ = progress.send(100).await;
        debug!(doc_type = %request.doc_type, path = %path.display(), "scaffold written");

        Ok(GeneratedArtifact {
            artifact_id,
            storage_path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_catalog::CatalogVariant;
    use draftsmith_protocol::{DocType, ProjectId};

    #[tokio::test]
    async fn writes_a_skeleton_with_context_listing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScaffoldGenerator::new(
            dir.path(),
            ConstraintCatalog::builtin(CatalogVariant::Legacy),
        );
        let request = GenerationRequest {
            project: ProjectId::new(3),
            doc_type: DocType::new("srs"),
            display_name: "Software Requirements Specification".to_string(),
            context_paths: vec!["/files/fr.md".to_string()],
            message: "cover the billing flows".to_string(),
            min_prerequisite_content_length: 100,
        };
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancelToken::new();

        let artifact = generator.generate(&request, tx, &cancel).await.unwrap();
        let body = std::fs::read_to_string(&artifact.storage_path).unwrap();
        assert!(body.starts_with("# Software Requirements Specification"));
        assert!(body.contains("/files/fr.md"));
        assert!(body.contains("## Specific Requirements"));
        assert!(body.contains("cover the billing flows"));

        let mut last = 0;
        while let Ok(percent) = rx.try_recv() {
            assert!(percent >= last);
            last = percent;
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn cancelled_before_start_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScaffoldGenerator::new(
            dir.path(),
            ConstraintCatalog::builtin(CatalogVariant::Legacy),
        );
        let request = GenerationRequest {
            project: ProjectId::new(3),
            doc_type: DocType::new("brd"),
            display_name: "Business Requirements Document".to_string(),
            context_paths: vec![],
            message: String::new(),
            min_prerequisite_content_length: 100,
        };
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = generator.generate(&request, tx, &cancel).await.unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
