//! End-to-end: manifest on disk, validation, then a gated run producing
//! real scaffold files.

use draftsmith::scaffold::ScaffoldGenerator;
use draftsmith_catalog::{CatalogVariant, ConstraintCatalog};
use draftsmith_orchestrator::{
    session_pair, validate_project, CancelToken, ManifestInspector, PlanExecutor, ProjectManifest,
    RunOutcome,
};
use draftsmith_protocol::{
    ArtifactOrigin, Decision, DocType, EnforcementMode, Plan, PlannedDoc, ProjectFile, ProjectId,
    RunEvent, Step,
};
use uuid::Uuid;

fn manifest_with_hlr(project: ProjectId, dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("project.json");
    let manifest = ProjectManifest {
        project_id: project,
        files: vec![ProjectFile {
            file_id: Uuid::new_v4(),
            project_id: project,
            origin: ArtifactOrigin::AiGenerated {
                doc_type: DocType::new("high-level-requirements"),
            },
            storage_path: dir.join("hlr.md").display().to_string(),
            rendered_path: None,
            created_at: chrono::Utc::now(),
            active: true,
        }],
    };
    std::fs::write(&path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();
    path
}

fn two_step_plan() -> Plan {
    Plan {
        steps: vec![
            Step {
                docs: vec![PlannedDoc {
                    doc_type: DocType::new("user-stories"),
                    message: "focus on the onboarding journey".to_string(),
                }],
            },
            Step {
                docs: vec![PlannedDoc {
                    doc_type: DocType::new("uiux-wireframe"),
                    message: String::new(),
                }],
            },
        ],
    }
}

#[tokio::test]
async fn validated_plan_runs_to_completion_and_writes_scaffolds() {
    let project = ProjectId::new(42);
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let manifest_path = manifest_with_hlr(project, dir.path());

    let catalog = ConstraintCatalog::builtin(CatalogVariant::Legacy);
    let inspector = ManifestInspector::new(&manifest_path, catalog.clone());
    let plan = two_step_plan();

    let report = validate_project(&catalog, &inspector, project, &plan, EnforcementMode::Guided)
        .await
        .unwrap();
    assert!(report.ok, "{:?}", report.failures);

    let generator = ScaffoldGenerator::new(&out_dir, catalog.clone());
    let executor = PlanExecutor::new(&catalog, &inspector, &generator);
    let cancel = CancelToken::new();
    let (mut channel, mut client) = session_pair(32);

    // Client side: consume events, continue at every gate, record the lot.
    let client_task = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = client.next_event().await {
            if matches!(event, RunEvent::AwaitDecision { .. }) {
                assert!(client.decide(Decision::Continue).await);
            }
            events.push(event);
        }
        events
    });

    let report = executor
        .run(&plan, project, &mut channel, &cancel)
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);

    let events = client_task.await.unwrap();
    assert!(matches!(events.last(), Some(RunEvent::RunCompleted)));

    // Both scaffolds exist and the wireframe saw its prerequisite context.
    let completed: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            RunEvent::DocCompleted { storage_path, .. } => Some(storage_path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 2);
    for path in &completed {
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("# "));
    }
    let wireframe = completed
        .iter()
        .find(|path| path.contains("uiux-wireframe"))
        .unwrap();
    let body = std::fs::read_to_string(wireframe).unwrap();
    assert!(body.contains("hlr.md"), "wireframe scaffold should cite its context");
}

#[tokio::test]
async fn reversed_plan_is_rejected_before_any_generation() {
    let project = ProjectId::new(42);
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = manifest_with_hlr(project, dir.path());

    let catalog = ConstraintCatalog::builtin(CatalogVariant::Legacy);
    let inspector = ManifestInspector::new(&manifest_path, catalog.clone());

    let mut plan = two_step_plan();
    plan.steps.reverse();
    // user-stories is satisfied by the manifest, but the wireframe's own
    // required set is fine too (hlr present) - craft a real gap instead.
    plan.steps[0].docs[0].doc_type = DocType::new("uiux-mockup");

    let report = validate_project(&catalog, &inspector, project, &plan, EnforcementMode::Guided)
        .await
        .unwrap();
    assert!(!report.ok);
    assert_eq!(report.failures[0].step_index, 1);
    assert_eq!(report.failures[0].doc_type, DocType::new("uiux-mockup"));
    assert_eq!(
        report.failures[0].missing_required,
        vec![DocType::new("uiux-wireframe")]
    );
}
