//! Check command - single-document admission against a project manifest.

use anyhow::{Context, Result};
use clap::Args;
use draftsmith_catalog::{CatalogVariant, ConstraintCatalog};
use draftsmith_orchestrator::{evaluate_project, EvaluateOptions, ManifestInspector};
use draftsmith_protocol::api::{AdmissionBlocked, AdmissionGranted};
use draftsmith_protocol::defaults;
use draftsmith_protocol::{DocType, EnforcementMode, ProjectId};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Document type to check (e.g. uiux-mockup)
    pub doc_type: String,

    /// Project manifest JSON path
    #[arg(short = 'p', long)]
    pub project: PathBuf,

    /// Project id; defaults to the manifest's id
    #[arg(long)]
    pub project_id: Option<u64>,

    /// Enforcement mode (STRICT/GUIDED/PERMISSIVE)
    #[arg(long, env = "DRAFTSMITH_MODE", value_parser = EnforcementMode::from_str, default_value = "GUIDED")]
    pub mode: EnforcementMode,

    /// Allow proceeding past missing required prerequisites under GUIDED
    #[arg(long, default_value_t = defaults::DEFAULT_ALLOW_OVERRIDE)]
    pub allow_override: bool,

    /// Output the verdict envelope as JSON
    #[arg(long)]
    pub json: bool,
}

/// Exit codes mirror the HTTP mapping: 0 admitted (200), 2 blocked (422),
/// 1 infrastructure failure (500, via the error return).
pub async fn run(args: CheckArgs, variant: CatalogVariant) -> Result<i32> {
    let catalog = ConstraintCatalog::builtin(variant);
    let doc_type = DocType::parse(&args.doc_type)?;
    let project = resolve_project_id(&args)?;
    let inspector = ManifestInspector::new(&args.project, catalog.clone());

    let opts = EvaluateOptions {
        mode: args.mode,
        additional_available: Default::default(),
        allow_override: args.allow_override,
    };
    let verdict = evaluate_project(&catalog, &inspector, project, &doc_type, &opts)
        .await
        .context("project inspection failed")?;

    let admitted = verdict.admits(args.allow_override);
    if admitted {
        let warnings: Vec<String> = verdict.warning_message.iter().cloned().collect();
        if args.json {
            let body = AdmissionGranted { verdict, warnings };
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("ADMITTED: {} ({})", verdict.display_name, verdict.doc_type);
            for warning in &warnings {
                println!("  warning: {warning}");
            }
            if !verdict.context_paths.is_empty() {
                println!("  context:");
                for path in &verdict.context_paths {
                    println!("    {path}");
                }
            }
        }
        Ok(0)
    } else {
        if args.json {
            let body = AdmissionBlocked {
                error: "prerequisites_missing".to_string(),
                details: verdict,
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("BLOCKED: {} ({})", verdict.display_name, verdict.doc_type);
            if let Some(error) = &verdict.error_message {
                println!("  {error}");
            }
            for suggestion in &verdict.suggestions {
                println!(
                    "  suggestion: {:?} {} - {}",
                    suggestion.action, suggestion.doc_type, suggestion.description
                );
            }
        }
        Ok(2)
    }
}

pub(crate) fn resolve_project_id_from(path: &PathBuf, explicit: Option<u64>) -> Result<ProjectId> {
    if let Some(id) = explicit {
        return Ok(ProjectId::new(id));
    }
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read project manifest: {}", path.display()))?;
    let manifest: draftsmith_orchestrator::ProjectManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("malformed project manifest: {}", path.display()))?;
    Ok(manifest.project_id)
}

fn resolve_project_id(args: &CheckArgs) -> Result<ProjectId> {
    resolve_project_id_from(&args.project, args.project_id)
}
