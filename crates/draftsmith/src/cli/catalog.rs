//! Catalog command - inspect the constraint tables.

use anyhow::{bail, Result};
use clap::Subcommand;
use draftsmith_catalog::{CatalogVariant, ConstraintCatalog};
use draftsmith_protocol::{Category, DocType};

#[derive(Subcommand, Debug, Clone)]
pub enum CatalogAction {
    /// List every document type
    List {
        /// Filter by SDLC phase (1..=9)
        #[arg(long)]
        phase: Option<u8>,
        /// Filter by category (planning/analysis/design/srs/diagram)
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one document type with its prerequisite lists
    Show {
        /// Document type identifier (e.g. uiux-wireframe)
        doc_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: CatalogAction, variant: CatalogVariant) -> Result<i32> {
    let catalog = ConstraintCatalog::builtin(variant);
    match action {
        CatalogAction::List {
            phase,
            category,
            json,
        } => list(&catalog, phase, category.as_deref(), json),
        CatalogAction::Show { doc_type, json } => show(&catalog, &doc_type, json),
    }
}

fn list(
    catalog: &ConstraintCatalog,
    phase: Option<u8>,
    category: Option<&str>,
    json: bool,
) -> Result<i32> {
    let category = category.map(parse_category).transpose()?;
    let entries: Vec<_> = catalog
        .iter()
        .filter(|(_, constraint)| phase.map_or(true, |phase| constraint.phase == phase))
        .filter(|(_, constraint)| category.map_or(true, |category| constraint.category == category))
        .collect();

    if json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|(doc_type, constraint)| {
                serde_json::json!({
                    "doc_type": doc_type,
                    "display_name": constraint.display_name,
                    "phase": constraint.phase,
                    "category": constraint.category,
                    "required": constraint.required,
                    "recommended": constraint.recommended,
                    "enhances": constraint.enhances,
                    "entry_point": constraint.entry_point,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(0);
    }

    println!(
        "{:<26} {:>5}  {:<9} {}",
        "DOC TYPE", "PHASE", "CATEGORY", "DISPLAY NAME"
    );
    for (doc_type, constraint) in entries {
        println!(
            "{:<26} {:>5}  {:<9} {}{}",
            doc_type.as_str(),
            constraint.phase,
            constraint.category,
            constraint.display_name,
            if constraint.entry_point {
                "  (entry point)"
            } else {
                ""
            }
        );
    }
    Ok(0)
}

fn show(catalog: &ConstraintCatalog, doc_type: &str, json: bool) -> Result<i32> {
    let doc_type = DocType::parse(doc_type)?;
    let Some(constraint) = catalog.lookup(&doc_type) else {
        bail!("unknown doc type: {doc_type}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(constraint)?);
        return Ok(0);
    }

    println!("{} ({doc_type})", constraint.display_name);
    println!("  phase:       {}", constraint.phase);
    println!("  category:    {}", constraint.category);
    println!("  entry point: {}", constraint.entry_point);
    print_list("required", &constraint.required);
    print_list("recommended", &constraint.recommended);
    print_list("enhances", &constraint.enhances);
    Ok(0)
}

fn print_list(label: &str, doc_types: &[DocType]) {
    if doc_types.is_empty() {
        println!("  {label}: -");
    } else {
        let joined: Vec<&str> = doc_types.iter().map(DocType::as_str).collect();
        println!("  {label}: {}", joined.join(", "));
    }
}

fn parse_category(value: &str) -> Result<Category> {
    match value.trim().to_ascii_lowercase().as_str() {
        "planning" => Ok(Category::Planning),
        "analysis" => Ok(Category::Analysis),
        "design" => Ok(Category::Design),
        "srs" => Ok(Category::Srs),
        "diagram" => Ok(Category::Diagram),
        other => bail!("unknown category: {other}"),
    }
}
