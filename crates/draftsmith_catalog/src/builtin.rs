//! The builtin dependency tables: 26 document types across SDLC phases 1-9.

use crate::Constraint;
use draftsmith_protocol::{Category, DocType};

struct Row {
    doc_type: &'static str,
    display_name: &'static str,
    phase: u8,
    category: Category,
    required: &'static [&'static str],
    recommended: &'static [&'static str],
    enhances: &'static [&'static str],
    entry_point: bool,
}

const ROWS: &[Row] = &[
    // ---- Phase 1: initiation & planning -----------------------------------
    Row {
        doc_type: "stakeholder-register",
        display_name: "Stakeholder Register",
        phase: 1,
        category: Category::Planning,
        required: &[],
        recommended: &[],
        enhances: &[],
        entry_point: true,
    },
    Row {
        doc_type: "business-case",
        display_name: "Business Case",
        phase: 1,
        category: Category::Planning,
        required: &["stakeholder-register"],
        recommended: &[],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "project-charter",
        display_name: "Project Charter",
        phase: 1,
        category: Category::Planning,
        required: &["business-case"],
        recommended: &["stakeholder-register"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "scope-statement",
        display_name: "Scope Statement",
        phase: 1,
        category: Category::Planning,
        required: &["high-level-requirements"],
        recommended: &["business-case"],
        enhances: &[],
        entry_point: false,
    },
    // ---- Phase 2: business analysis ---------------------------------------
    Row {
        doc_type: "high-level-requirements",
        display_name: "High-Level Requirements",
        phase: 2,
        category: Category::Analysis,
        required: &[],
        recommended: &["stakeholder-register"],
        enhances: &[],
        entry_point: true,
    },
    Row {
        doc_type: "user-personas",
        display_name: "User Personas",
        phase: 2,
        category: Category::Analysis,
        required: &["stakeholder-register"],
        recommended: &["high-level-requirements"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "user-stories",
        display_name: "User Stories",
        phase: 2,
        category: Category::Analysis,
        required: &["high-level-requirements"],
        recommended: &["user-personas"],
        enhances: &[],
        entry_point: false,
    },
    // ---- Phase 3: requirements --------------------------------------------
    Row {
        doc_type: "use-case-model",
        display_name: "Use Case Model",
        phase: 3,
        category: Category::Analysis,
        required: &["user-stories"],
        recommended: &["scope-statement"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "brd",
        display_name: "Business Requirements Document",
        phase: 3,
        category: Category::Srs,
        required: &["high-level-requirements", "business-case"],
        recommended: &["scope-statement"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "functional-requirements",
        display_name: "Functional Requirements",
        phase: 3,
        category: Category::Srs,
        required: &["brd"],
        recommended: &["use-case-model"],
        enhances: &["user-stories"],
        entry_point: false,
    },
    Row {
        doc_type: "nfr-spec",
        display_name: "Non-Functional Requirements Specification",
        phase: 3,
        category: Category::Srs,
        required: &["high-level-requirements"],
        recommended: &["brd"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "srs",
        display_name: "Software Requirements Specification",
        phase: 3,
        category: Category::Srs,
        required: &["functional-requirements", "nfr-spec"],
        recommended: &["use-case-model"],
        enhances: &["user-stories"],
        entry_point: false,
    },
    Row {
        doc_type: "use-case-diagram",
        display_name: "Use Case Diagram",
        phase: 3,
        category: Category::Diagram,
        required: &["use-case-model"],
        recommended: &[],
        enhances: &["user-stories"],
        entry_point: false,
    },
    // ---- Phase 4: UX design -----------------------------------------------
    Row {
        doc_type: "uiux-wireframe",
        display_name: "UI/UX Wireframe",
        phase: 4,
        category: Category::Design,
        required: &["high-level-requirements"],
        recommended: &["user-personas"],
        enhances: &["user-stories"],
        entry_point: false,
    },
    Row {
        doc_type: "uiux-mockup",
        display_name: "UI/UX Mockup",
        phase: 4,
        category: Category::Design,
        required: &["uiux-wireframe"],
        recommended: &["hld-arch"],
        enhances: &["user-personas"],
        entry_point: false,
    },
    Row {
        doc_type: "uiux-prototype",
        display_name: "UI/UX Prototype",
        phase: 4,
        category: Category::Design,
        required: &["uiux-mockup"],
        recommended: &["uiux-wireframe"],
        enhances: &[],
        entry_point: false,
    },
    // ---- Phase 5: architecture --------------------------------------------
    Row {
        doc_type: "hld-arch",
        display_name: "High-Level Architecture",
        phase: 5,
        category: Category::Design,
        required: &["high-level-requirements"],
        recommended: &["nfr-spec"],
        enhances: &["scope-statement"],
        entry_point: false,
    },
    Row {
        doc_type: "lld-arch",
        display_name: "Low-Level Architecture",
        phase: 5,
        category: Category::Design,
        required: &["hld-arch"],
        recommended: &["srs"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "tech-stack-doc",
        display_name: "Technology Stack Document",
        phase: 5,
        category: Category::Design,
        required: &["hld-arch"],
        recommended: &["nfr-spec"],
        enhances: &[],
        entry_point: false,
    },
    // ---- Phase 6: detailed design -----------------------------------------
    Row {
        doc_type: "api-spec",
        display_name: "API Specification",
        phase: 6,
        category: Category::Design,
        required: &["lld-arch"],
        recommended: &["functional-requirements"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "db-schema-doc",
        display_name: "Database Schema Document",
        phase: 6,
        category: Category::Design,
        required: &["lld-arch"],
        recommended: &["functional-requirements"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "sequence-diagram",
        display_name: "Sequence Diagram",
        phase: 6,
        category: Category::Diagram,
        required: &["use-case-model"],
        recommended: &["api-spec"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "er-diagram",
        display_name: "Entity Relationship Diagram",
        phase: 6,
        category: Category::Diagram,
        required: &["db-schema-doc"],
        recommended: &[],
        enhances: &[],
        entry_point: false,
    },
    // ---- Phases 7-9: verification, rollout, operations --------------------
    Row {
        doc_type: "test-plan",
        display_name: "Test Plan",
        phase: 7,
        category: Category::Planning,
        required: &["srs"],
        recommended: &["functional-requirements"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "deployment-plan",
        display_name: "Deployment Plan",
        phase: 8,
        category: Category::Planning,
        required: &["hld-arch"],
        recommended: &["tech-stack-doc"],
        enhances: &[],
        entry_point: false,
    },
    Row {
        doc_type: "ops-runbook",
        display_name: "Operations Runbook",
        phase: 9,
        category: Category::Planning,
        required: &["deployment-plan"],
        recommended: &["api-spec"],
        enhances: &[],
        entry_point: false,
    },
];

fn doc_types(names: &[&str]) -> Vec<DocType> {
    names.iter().map(|name| DocType::new(*name)).collect()
}

pub(crate) fn entries() -> Vec<(DocType, Constraint)> {
    ROWS.iter()
        .map(|row| {
            (
                DocType::new(row.doc_type),
                Constraint {
                    display_name: row.display_name.to_string(),
                    phase: row.phase,
                    category: row.category,
                    required: doc_types(row.required),
                    recommended: doc_types(row.recommended),
                    enhances: doc_types(row.enhances),
                    entry_point: row.entry_point,
                },
            )
        })
        .collect()
}
