//! CLI for Draftsmith.
//!
//! `catalog` inspects the constraint tables, `check` answers single-document
//! admission, `plan` validates and executes multi-step generation plans.

pub mod catalog;
pub mod check;
pub mod plan;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use draftsmith_catalog::CatalogVariant;

#[derive(Parser, Debug)]
#[command(
    name = "draftsmith",
    about = "Document constraint & generation orchestrator",
    version
)]
pub struct Cli {
    /// Verbose console logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Which edition of the dependency tables to load
    #[arg(long, global = true, value_enum, default_value_t = VariantArg::Legacy)]
    pub variant: VariantArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Legacy,
    Current,
}

impl From<VariantArg> for CatalogVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Legacy => CatalogVariant::Legacy,
            VariantArg::Current => CatalogVariant::Current,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect the constraint catalog
    Catalog {
        #[command(subcommand)]
        action: catalog::CatalogAction,
    },
    /// Check admission for a single document type
    Check(check::CheckArgs),
    /// Validate or execute multi-step generation plans
    Plan {
        #[command(subcommand)]
        action: plan::PlanAction,
    },
}

/// Dispatch a parsed command line. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let variant: CatalogVariant = cli.variant.into();
    match cli.command {
        Commands::Catalog { action } => catalog::run(action, variant),
        Commands::Check(args) => check::run(args, variant).await,
        Commands::Plan { action } => plan::run(action, variant).await,
    }
}
