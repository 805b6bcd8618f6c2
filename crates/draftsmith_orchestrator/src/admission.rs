//! Single-document admission evaluation.
//!
//! [`evaluate`] is a pure function of the catalog, a project snapshot, and
//! the options; the only suspension lives in [`evaluate_project`], which
//! fetches the snapshot first. Verdicts are values: missing prerequisites
//! never surface as errors, and applying a verdict is
//! [`AdmissionVerdict::admits`].

use crate::inspect::{InspectError, ProjectInspector, ProjectState};
use draftsmith_catalog::{Constraint, ConstraintCatalog};
use draftsmith_protocol::{
    AdmissionVerdict, DocType, EnforcementMode, ProjectId, Suggestion, SuggestionAction,
};
use std::collections::BTreeSet;

/// Options carried by one evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    pub mode: EnforcementMode,
    /// Doc types to treat as present beyond the project snapshot. The plan
    /// validator and executor feed in-plan productions through this.
    pub additional_available: BTreeSet<DocType>,
    pub allow_override: bool,
}

impl EvaluateOptions {
    pub fn with_mode(mode: EnforcementMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Evaluate admission for one document type against a project snapshot.
pub fn evaluate(
    catalog: &ConstraintCatalog,
    doc_type: &DocType,
    state: &ProjectState,
    opts: &EvaluateOptions,
) -> AdmissionVerdict {
    let display_name = catalog.display_name(doc_type);

    let constraint = match catalog.lookup(doc_type) {
        Some(constraint) => constraint,
        None => {
            // Unknown types are permissive: no prerequisites to enforce.
            return AdmissionVerdict {
                doc_type: doc_type.clone(),
                display_name,
                satisfied: true,
                mode: opts.mode,
                missing_required: Vec::new(),
                missing_recommended: Vec::new(),
                available_docs: available_docs(state, opts),
                context_paths: Vec::new(),
                suggestions: Vec::new(),
                error_message: None,
                warning_message: Some(format!(
                    "No constraints defined for '{doc_type}'; proceeding without prerequisite checks"
                )),
            };
        }
    };

    let available: BTreeSet<&DocType> = state
        .docs
        .iter()
        .chain(opts.additional_available.iter())
        .collect();

    let missing_required: Vec<DocType> = constraint
        .required
        .iter()
        .filter(|dep| !available.contains(dep))
        .cloned()
        .collect();
    let missing_recommended: Vec<DocType> = constraint
        .recommended
        .iter()
        .filter(|dep| !available.contains(dep))
        .cloned()
        .collect();

    let satisfied = missing_required.is_empty();

    let error_message = (!missing_required.is_empty()).then(|| {
        format!(
            "Cannot generate {display_name}. Required prerequisites missing: {}",
            join_display_names(catalog, &missing_required)
        )
    });
    let warning_message = (!missing_recommended.is_empty()).then(|| {
        format!(
            "Generating {display_name} without recommended prerequisites: {}. \
             Output quality may be affected.",
            join_display_names(catalog, &missing_recommended)
        )
    });

    let suggestions = build_suggestions(catalog, &missing_required, &missing_recommended);
    let context_paths = assemble_context_paths(constraint, state, &available);

    AdmissionVerdict {
        doc_type: doc_type.clone(),
        display_name,
        satisfied,
        mode: opts.mode,
        missing_required,
        missing_recommended,
        available_docs: available.into_iter().cloned().collect(),
        context_paths,
        suggestions,
        error_message,
        warning_message,
    }
}

/// Inspect the project, then evaluate. The one suspending admission path.
pub async fn evaluate_project<I: ProjectInspector + ?Sized>(
    catalog: &ConstraintCatalog,
    inspector: &I,
    project: ProjectId,
    doc_type: &DocType,
    opts: &EvaluateOptions,
) -> Result<AdmissionVerdict, InspectError> {
    let state = inspector.inspect(project).await?;
    Ok(evaluate(catalog, doc_type, &state, opts))
}

fn available_docs(state: &ProjectState, opts: &EvaluateOptions) -> Vec<DocType> {
    state
        .docs
        .iter()
        .chain(opts.additional_available.iter())
        .cloned()
        .collect::<BTreeSet<DocType>>()
        .into_iter()
        .collect()
}

fn join_display_names(catalog: &ConstraintCatalog, doc_types: &[DocType]) -> String {
    doc_types
        .iter()
        .map(|doc_type| catalog.display_name(doc_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One Generate and one Upload suggestion per missing required prerequisite,
/// one Generate per missing recommended; required first, declaration order
/// within each group.
fn build_suggestions(
    catalog: &ConstraintCatalog,
    missing_required: &[DocType],
    missing_recommended: &[DocType],
) -> Vec<Suggestion> {
    let mut suggestions = Vec::with_capacity(missing_required.len() * 2 + missing_recommended.len());

    for doc_type in missing_required {
        let display_name = catalog.display_name(doc_type);
        suggestions.push(Suggestion {
            action: SuggestionAction::Generate,
            doc_type: doc_type.clone(),
            display_name: display_name.clone(),
            endpoint_hint: endpoint_hint(catalog, doc_type),
            description: format!("Generate {display_name} first"),
        });
        suggestions.push(Suggestion {
            action: SuggestionAction::Upload,
            doc_type: doc_type.clone(),
            display_name: display_name.clone(),
            endpoint_hint: None,
            description: format!("Upload an existing {display_name}"),
        });
    }

    for doc_type in missing_recommended {
        let display_name = catalog.display_name(doc_type);
        suggestions.push(Suggestion {
            action: SuggestionAction::Generate,
            doc_type: doc_type.clone(),
            display_name: display_name.clone(),
            endpoint_hint: endpoint_hint(catalog, doc_type),
            description: format!("Generate {display_name} to improve output quality"),
        });
    }

    suggestions
}

fn endpoint_hint(catalog: &ConstraintCatalog, doc_type: &DocType) -> Option<String> {
    catalog
        .lookup(doc_type)
        .map(|constraint| format!("/generate/{}", constraint.category.as_str()))
}

/// Storage paths for every prerequisite (required, recommended, enhancing)
/// that the project already has, in that discovery order, deduplicated.
/// `enhances` participates here and nowhere else.
fn assemble_context_paths(
    constraint: &Constraint,
    state: &ProjectState,
    available: &BTreeSet<&DocType>,
) -> Vec<String> {
    let mut paths = Vec::new();
    let mut seen = BTreeSet::new();
    for doc_type in constraint
        .required
        .iter()
        .chain(constraint.recommended.iter())
        .chain(constraint.enhances.iter())
    {
        if !available.contains(doc_type) {
            continue;
        }
        if let Some(path) = state.path_for(doc_type) {
            if seen.insert(path.to_string()) {
                paths.push(path.to_string());
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_catalog::CatalogVariant;

    fn catalog() -> ConstraintCatalog {
        ConstraintCatalog::builtin(CatalogVariant::Legacy)
    }

    fn state_with(docs: &[(&str, &str)]) -> ProjectState {
        let mut state = ProjectState::default();
        for (doc_type, path) in docs {
            let doc_type = DocType::new(*doc_type);
            state.docs.insert(doc_type.clone());
            state.paths.insert(doc_type, path.to_string());
        }
        state
    }

    #[test]
    fn unknown_doc_type_is_permissive_with_warning() {
        let catalog = catalog();
        let verdict = evaluate(
            &catalog,
            &DocType::new("mystery-doc"),
            &ProjectState::default(),
            &EvaluateOptions::default(),
        );
        assert!(verdict.satisfied);
        assert!(verdict.missing_required.is_empty());
        assert!(verdict.suggestions.is_empty());
        let warning = verdict.warning_message.clone().unwrap();
        assert!(warning.to_ascii_lowercase().contains("no constraints defined"));
        assert!(verdict.admits(false));
    }

    #[test]
    fn missing_required_composes_error_and_suggestions() {
        let catalog = catalog();
        let verdict = evaluate(
            &catalog,
            &DocType::new("srs"),
            &state_with(&[("functional-requirements", "/g/fr.md")]),
            &EvaluateOptions::with_mode(EnforcementMode::Strict),
        );
        assert!(!verdict.satisfied);
        assert_eq!(verdict.missing_required, vec![DocType::new("nfr-spec")]);
        let error = verdict.error_message.as_deref().unwrap();
        assert!(error.contains("Cannot generate Software Requirements Specification"));
        assert!(error.contains("Non-Functional Requirements Specification"));

        // generate + upload for the required gap, then generate for each
        // missing recommended, in declaration order.
        let actions: Vec<(SuggestionAction, &str)> = verdict
            .suggestions
            .iter()
            .map(|s| (s.action, s.doc_type.as_str()))
            .collect();
        assert_eq!(
            actions,
            vec![
                (SuggestionAction::Generate, "nfr-spec"),
                (SuggestionAction::Upload, "nfr-spec"),
                (SuggestionAction::Generate, "use-case-model"),
            ]
        );
        assert_eq!(
            verdict.suggestions[0].endpoint_hint.as_deref(),
            Some("/generate/srs")
        );
    }

    #[test]
    fn additional_available_simulates_in_plan_productions() {
        let catalog = catalog();
        let mut opts = EvaluateOptions::with_mode(EnforcementMode::Strict);
        opts.additional_available
            .insert(DocType::new("functional-requirements"));
        opts.additional_available.insert(DocType::new("nfr-spec"));
        // Duplicates are idempotent.
        opts.additional_available.insert(DocType::new("nfr-spec"));

        let verdict = evaluate(&catalog, &DocType::new("srs"), &ProjectState::default(), &opts);
        assert!(verdict.satisfied);
        assert!(verdict.error_message.is_none());
    }

    #[test]
    fn enhances_contributes_context_but_never_blocks() {
        let catalog = catalog();
        // uiux-wireframe: required hlr, recommended user-personas,
        // enhances user-stories.
        let state = state_with(&[
            ("high-level-requirements", "/g/hlr.md"),
            ("user-personas", "/g/personas.md"),
            ("user-stories", "/g/stories.md"),
        ]);
        let verdict = evaluate(
            &catalog,
            &DocType::new("uiux-wireframe"),
            &state,
            &EvaluateOptions::default(),
        );
        assert!(verdict.satisfied);
        assert!(verdict.warning_message.is_none());
        assert_eq!(
            verdict.context_paths,
            vec![
                "/g/hlr.md".to_string(),
                "/g/personas.md".to_string(),
                "/g/stories.md".to_string(),
            ]
        );

        // Remove the enhancing doc: nothing blocks, nothing warns.
        let state = state_with(&[
            ("high-level-requirements", "/g/hlr.md"),
            ("user-personas", "/g/personas.md"),
        ]);
        let verdict = evaluate(
            &catalog,
            &DocType::new("uiux-wireframe"),
            &state,
            &EvaluateOptions::default(),
        );
        assert!(verdict.satisfied);
        assert!(verdict.warning_message.is_none());
        assert_eq!(verdict.context_paths.len(), 2);
    }

    #[test]
    fn context_paths_deduplicate_shared_files() {
        let catalog = catalog();
        // Both prerequisites extracted from the same uploaded file.
        let state = state_with(&[
            ("functional-requirements", "/u/combined.md"),
            ("nfr-spec", "/u/combined.md"),
        ]);
        let verdict = evaluate(
            &catalog,
            &DocType::new("srs"),
            &state,
            &EvaluateOptions::default(),
        );
        assert_eq!(verdict.context_paths, vec!["/u/combined.md".to_string()]);
    }

    #[test]
    fn determinism_verdicts_are_byte_identical() {
        let catalog = catalog();
        let state = state_with(&[("high-level-requirements", "/g/hlr.md")]);
        let opts = EvaluateOptions::with_mode(EnforcementMode::Strict);
        let a = evaluate(&catalog, &DocType::new("uiux-mockup"), &state, &opts);
        let b = evaluate(&catalog, &DocType::new("uiux-mockup"), &state, &opts);
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn monotonicity_growing_availability_never_unsatisfies() {
        let catalog = catalog();
        let small = state_with(&[("uiux-wireframe", "/g/wf.md")]);
        let mut big = small.clone();
        big.docs.insert(DocType::new("hld-arch"));
        big.paths
            .insert(DocType::new("hld-arch"), "/g/hld.md".to_string());

        let opts = EvaluateOptions::with_mode(EnforcementMode::Strict);
        for doc_type in catalog.doc_types() {
            let before = evaluate(&catalog, doc_type, &small, &opts);
            let after = evaluate(&catalog, doc_type, &big, &opts);
            if before.satisfied {
                assert!(after.satisfied, "monotonicity violated for {doc_type}");
            }
            assert!(
                after.missing_required.len() <= before.missing_required.len(),
                "missing_required grew for {doc_type}"
            );
        }
    }
}
