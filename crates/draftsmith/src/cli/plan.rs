//! Plan commands - validate and execute multi-step generation plans.

use crate::scaffold::ScaffoldGenerator;
use crate::session::StdioSessionChannel;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use draftsmith_catalog::{CatalogVariant, ConstraintCatalog};
use draftsmith_orchestrator::{
    validate_project, CancelToken, ExecutorPolicy, ManifestInspector, PlanExecutor, RunOutcome,
};
use draftsmith_protocol::{EnforcementMode, OnDocFailure, Plan};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Subcommand, Debug, Clone)]
pub enum PlanAction {
    /// Validate a plan without generating anything
    Validate(ValidateArgs),
    /// Validate, then execute a plan with the scaffold generator
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Plan JSON path ({"steps": [{"docs": [{"type": ..., "message": ...}]}]})
    pub plan: PathBuf,

    /// Project manifest JSON path
    #[arg(short = 'p', long)]
    pub project: PathBuf,

    /// Project id; defaults to the manifest's id
    #[arg(long)]
    pub project_id: Option<u64>,

    /// Enforcement mode (STRICT/GUIDED/PERMISSIVE)
    #[arg(long, env = "DRAFTSMITH_MODE", value_parser = EnforcementMode::from_str, default_value = "GUIDED")]
    pub mode: EnforcementMode,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub validate: ValidateArgs,

    /// Directory for generated scaffolds
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Auto-continue every decision gate
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Gate once more after the final step
    #[arg(long)]
    pub gate_final: bool,

    /// Seconds to wait at each gate before stopping the run
    #[arg(long)]
    pub decision_timeout: Option<u64>,

    /// What to do when one doc fails (abort-step/continue-step)
    #[arg(long, value_parser = OnDocFailure::from_str, default_value = "abort-step")]
    pub on_doc_failure: OnDocFailure,
}

pub async fn run(action: PlanAction, variant: CatalogVariant) -> Result<i32> {
    match action {
        PlanAction::Validate(args) => validate(args, variant).await,
        PlanAction::Run(args) => execute(args, variant).await,
    }
}

fn load_plan(path: &PathBuf) -> Result<Plan> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read plan: {}", path.display()))?;
    let plan: Plan = serde_json::from_slice(&raw)
        .with_context(|| format!("malformed plan: {}", path.display()))?;
    Ok(plan)
}

async fn validate(args: ValidateArgs, variant: CatalogVariant) -> Result<i32> {
    let catalog = ConstraintCatalog::builtin(variant);
    let plan = load_plan(&args.plan)?;
    let project = super::check::resolve_project_id_from(&args.project, args.project_id)?;
    let inspector = ManifestInspector::new(&args.project, catalog.clone());

    let report = validate_project(&catalog, &inspector, project, &plan, args.mode)
        .await
        .context("project inspection failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.ok {
        println!(
            "OK: {} steps, {} docs, no unresolved prerequisites",
            plan.steps.len(),
            plan.doc_count()
        );
    } else {
        println!("FAILED: {} unresolved prerequisites", report.failures.len());
        for failure in &report.failures {
            println!(
                "  step {}: {} - {}",
                failure.step_index, failure.doc_type, failure.error_message
            );
        }
    }
    Ok(if report.ok { 0 } else { 2 })
}

async fn execute(args: RunArgs, variant: CatalogVariant) -> Result<i32> {
    let catalog = ConstraintCatalog::builtin(variant);
    let plan = load_plan(&args.validate.plan)?;
    let project =
        super::check::resolve_project_id_from(&args.validate.project, args.validate.project_id)?;
    let inspector = ManifestInspector::new(&args.validate.project, catalog.clone());

    // Up-front validation; execution only starts on a clean report.
    let report = validate_project(&catalog, &inspector, project, &plan, args.validate.mode)
        .await
        .context("project inspection failed")?;
    if !report.ok {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(2);
    }

    let generator = ScaffoldGenerator::new(&args.out, catalog.clone());
    let policy = ExecutorPolicy {
        on_doc_failure: args.on_doc_failure,
        gate_after_final_step: args.gate_final,
        decision_timeout: args.decision_timeout.map(Duration::from_secs),
    };
    let executor = PlanExecutor::new(&catalog, &inspector, &generator)
        .with_mode(args.validate.mode)
        .with_policy(policy);

    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling run");
            canceller.cancel();
        }
    });

    let mut channel = StdioSessionChannel::new(args.yes);
    let report = executor.run(&plan, project, &mut channel, &cancel).await?;

    Ok(match report.outcome {
        RunOutcome::Completed | RunOutcome::Stopped => 0,
        RunOutcome::Cancelled => 130,
        RunOutcome::Failed { .. } => 1,
    })
}
