//! Project inspection: which document types a project already has.
//!
//! The derivation from stored file records is pure and shared by every
//! inspector implementation; only fetching the records touches I/O.

use async_trait::async_trait;
use draftsmith_catalog::ConstraintCatalog;
use draftsmith_protocol::{ArtifactOrigin, DocType, ProjectFile, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Derived snapshot of a project: the doc types present and, per type, the
/// storage path preferred for generator context.
///
/// Short-lived by design: recompute per admission or validation call, never
/// cache across calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectState {
    pub docs: BTreeSet<DocType>,
    pub paths: BTreeMap<DocType, String>,
}

impl ProjectState {
    /// Apply the trust rules to raw file records.
    ///
    /// - inactive files are skipped;
    /// - AI-generated files contribute their declared doc type;
    /// - uploads contribute extracted types with a non-sentinel range, bare
    ///   declared types, and legacy manual tags;
    /// - types unknown to the catalog are dropped silently.
    ///
    /// Path choice per type: the most recently created AI-generated file
    /// wins; otherwise the most recent trusted upload. Within the chosen
    /// file, the markdown-rendered path is preferred over the original.
    pub fn from_files(catalog: &ConstraintCatalog, files: &[ProjectFile]) -> Self {
        let mut ranked: Vec<&ProjectFile> = files.iter().filter(|file| file.active).collect();
        // AI-generated first, then newest first; input order breaks ties.
        ranked.sort_by(|a, b| {
            let a_ai = matches!(a.origin, ArtifactOrigin::AiGenerated { .. });
            let b_ai = matches!(b.origin, ArtifactOrigin::AiGenerated { .. });
            b_ai.cmp(&a_ai).then(b.created_at.cmp(&a.created_at))
        });

        let mut state = ProjectState::default();
        for file in ranked {
            for doc_type in contributed_types(file) {
                if !catalog.contains(&doc_type) {
                    continue;
                }
                state
                    .paths
                    .entry(doc_type.clone())
                    .or_insert_with(|| file.preferred_path().to_string());
                state.docs.insert(doc_type);
            }
        }
        state
    }

    pub fn contains(&self, doc_type: &DocType) -> bool {
        self.docs.contains(doc_type)
    }

    pub fn path_for(&self, doc_type: &DocType) -> Option<&str> {
        self.paths.get(doc_type).map(String::as_str)
    }
}

fn contributed_types(file: &ProjectFile) -> Vec<DocType> {
    match &file.origin {
        ArtifactOrigin::AiGenerated { doc_type } => vec![doc_type.clone()],
        ArtifactOrigin::UserUploaded {
            extracted,
            declared,
            manual_tags,
        } => {
            let mut types: Vec<DocType> = extracted
                .iter()
                .filter(|range| range.is_trusted())
                .map(|range| range.doc_type.clone())
                .collect();
            types.extend(declared.iter().cloned());
            types.extend(manual_tags.iter().cloned());
            types
        }
    }
}

/// Why a project could not be inspected. Infrastructure-level: callers must
/// surface these distinctly from admission outcomes, never as "missing
/// prerequisites".
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to read project store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project store {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),
}

/// Narrow seam to external storage.
#[async_trait]
pub trait ProjectInspector: Send + Sync {
    async fn inspect(&self, project: ProjectId) -> Result<ProjectState, InspectError>;
}

/// JSON manifest on disk, listing a project's stored files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project_id: ProjectId,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
}

/// Inspector over a [`ProjectManifest`] file. Used by the CLI and tests; a
/// deployment backs this seam with its real document store instead.
pub struct ManifestInspector {
    path: PathBuf,
    catalog: ConstraintCatalog,
}

impl ManifestInspector {
    pub fn new(path: impl Into<PathBuf>, catalog: ConstraintCatalog) -> Self {
        Self {
            path: path.into(),
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProjectInspector for ManifestInspector {
    async fn inspect(&self, project: ProjectId) -> Result<ProjectState, InspectError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| InspectError::Io {
                path: self.path.clone(),
                source,
            })?;
        let manifest: ProjectManifest =
            serde_json::from_slice(&raw).map_err(|source| InspectError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        if manifest.project_id != project {
            return Err(InspectError::UnknownProject(project));
        }
        Ok(ProjectState::from_files(&self.catalog, &manifest.files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use draftsmith_catalog::CatalogVariant;
    use draftsmith_protocol::ExtractedDocRange;
    use uuid::Uuid;

    fn catalog() -> ConstraintCatalog {
        ConstraintCatalog::builtin(CatalogVariant::Legacy)
    }

    fn ai_file(doc_type: &str, path: &str, at: i64) -> ProjectFile {
        ProjectFile {
            file_id: Uuid::new_v4(),
            project_id: ProjectId::new(1),
            origin: ArtifactOrigin::AiGenerated {
                doc_type: DocType::new(doc_type),
            },
            storage_path: path.to_string(),
            rendered_path: None,
            created_at: Utc.timestamp_opt(at, 0).unwrap(),
            active: true,
        }
    }

    fn upload(
        extracted: Vec<ExtractedDocRange>,
        declared: Vec<&str>,
        manual: Vec<&str>,
        path: &str,
        at: i64,
    ) -> ProjectFile {
        ProjectFile {
            file_id: Uuid::new_v4(),
            project_id: ProjectId::new(1),
            origin: ArtifactOrigin::UserUploaded {
                extracted,
                declared: declared.into_iter().map(DocType::new).collect(),
                manual_tags: manual.into_iter().map(DocType::new).collect(),
            },
            storage_path: path.to_string(),
            rendered_path: None,
            created_at: Utc.timestamp_opt(at, 0).unwrap(),
            active: true,
        }
    }

    fn range(doc_type: &str, start: i64) -> ExtractedDocRange {
        ExtractedDocRange {
            doc_type: DocType::new(doc_type),
            start,
            end: start + 10,
        }
    }

    #[test]
    fn sentinel_ranges_are_untrusted() {
        let files = vec![upload(
            vec![range("srs", -1), range("brd", 5)],
            vec![],
            vec![],
            "/u/mixed.docx",
            100,
        )];
        let state = ProjectState::from_files(&catalog(), &files);
        assert!(!state.contains(&DocType::new("srs")));
        assert!(state.contains(&DocType::new("brd")));
    }

    #[test]
    fn declared_and_manual_tags_are_accepted() {
        let files = vec![upload(
            vec![],
            vec!["business-case"],
            vec!["user-personas"],
            "/u/notes.md",
            100,
        )];
        let state = ProjectState::from_files(&catalog(), &files);
        assert!(state.contains(&DocType::new("business-case")));
        assert!(state.contains(&DocType::new("user-personas")));
    }

    #[test]
    fn unknown_types_are_dropped_silently() {
        let files = vec![upload(
            vec![range("mystery-doc", 3)],
            vec!["another-unknown"],
            vec![],
            "/u/odd.pdf",
            100,
        )];
        let state = ProjectState::from_files(&catalog(), &files);
        assert!(state.docs.is_empty());
        assert!(state.paths.is_empty());
    }

    #[test]
    fn inactive_files_are_skipped() {
        let mut file = ai_file("srs", "/g/srs.md", 100);
        file.active = false;
        let state = ProjectState::from_files(&catalog(), &[file]);
        assert!(state.docs.is_empty());
    }

    #[test]
    fn ai_generated_beats_newer_upload_for_path_choice() {
        let files = vec![
            upload(vec![range("srs", 1)], vec![], vec![], "/u/newer.docx", 200),
            ai_file("srs", "/g/older-ai.md", 100),
        ];
        let state = ProjectState::from_files(&catalog(), &files);
        assert_eq!(state.path_for(&DocType::new("srs")), Some("/g/older-ai.md"));
    }

    #[test]
    fn most_recent_ai_file_wins() {
        let files = vec![
            ai_file("srs", "/g/old.md", 100),
            ai_file("srs", "/g/new.md", 300),
        ];
        let state = ProjectState::from_files(&catalog(), &files);
        assert_eq!(state.path_for(&DocType::new("srs")), Some("/g/new.md"));
    }

    #[test]
    fn rendered_path_preferred_within_chosen_file() {
        let mut file = ai_file("brd", "/g/brd.json", 100);
        file.rendered_path = Some("/g/brd.md".to_string());
        let state = ProjectState::from_files(&catalog(), &[file]);
        assert_eq!(state.path_for(&DocType::new("brd")), Some("/g/brd.md"));
    }

    #[tokio::test]
    async fn manifest_inspector_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let manifest = ProjectManifest {
            project_id: ProjectId::new(7),
            files: vec![ai_file("stakeholder-register", "/g/sr.md", 50)],
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();

        let inspector = ManifestInspector::new(&path, catalog());
        let state = inspector.inspect(ProjectId::new(7)).await.unwrap();
        assert!(state.contains(&DocType::new("stakeholder-register")));

        let err = inspector.inspect(ProjectId::new(8)).await.unwrap_err();
        assert!(matches!(err, InspectError::UnknownProject(_)));
    }
}
