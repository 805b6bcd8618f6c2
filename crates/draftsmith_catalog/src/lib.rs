//! The static constraint catalog.
//!
//! Maps every known document type to its metadata: display name, SDLC phase,
//! category, and the required/recommended/enhancing prerequisite lists. The
//! catalog is authoritative and immutable after construction; build it once
//! at startup and pass it by reference.
//!
//! Loading variant-specific lists is the catalog's only configuration point:
//! [`CatalogVariant::Legacy`] carries the `enhances` edges, while
//! [`CatalogVariant::Current`] reflects the later documentation that dropped
//! them from the dependency tables but kept the field in the schema.

mod builtin;

use draftsmith_protocol::{Category, DocType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Which edition of the dependency tables to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVariant {
    /// Earlier tables: `enhances` lists populated.
    #[default]
    Legacy,
    /// Later tables: `enhances` kept in the schema but always empty.
    Current,
}

/// Metadata attached to one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub display_name: String,
    /// SDLC phase, 1..=9.
    pub phase: u8,
    pub category: Category,
    pub required: Vec<DocType>,
    pub recommended: Vec<DocType>,
    /// Context-assembly hint only: never blocks admission, never warns.
    pub enhances: Vec<DocType>,
    /// Explicit entry-point tag; must coincide with `required` being empty.
    pub entry_point: bool,
}

/// Structural defects detected by [`ConstraintCatalog::verify`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{parent} lists itself as a prerequisite")]
    SelfReference { parent: DocType },
    #[error("{parent} references unknown doc type {missing}")]
    UnknownReference { parent: DocType, missing: DocType },
    #[error("required cycle involving {doc_type}")]
    RequiredCycle { doc_type: DocType },
    #[error("{doc_type}: entry-point tag disagrees with required list")]
    EntryPointMismatch { doc_type: DocType },
    #[error("{parent} lists {doc_type} as both required and recommended")]
    RequiredRecommendedOverlap { parent: DocType, doc_type: DocType },
    #[error("{doc_type}: phase {phase} outside 1..=9")]
    PhaseOutOfRange { doc_type: DocType, phase: u8 },
}

/// Read-only registry over the complete document type set.
#[derive(Debug, Clone)]
pub struct ConstraintCatalog {
    entries: BTreeMap<DocType, Constraint>,
    variant: CatalogVariant,
}

impl ConstraintCatalog {
    /// Build the builtin catalog for the given variant.
    pub fn builtin(variant: CatalogVariant) -> Self {
        let mut entries = BTreeMap::new();
        for (doc_type, mut constraint) in builtin::entries() {
            if variant == CatalogVariant::Current {
                constraint.enhances.clear();
            }
            entries.insert(doc_type, constraint);
        }
        Self { entries, variant }
    }

    pub fn variant(&self) -> CatalogVariant {
        self.variant
    }

    pub fn lookup(&self, doc_type: &DocType) -> Option<&Constraint> {
        self.entries.get(doc_type)
    }

    pub fn contains(&self, doc_type: &DocType) -> bool {
        self.entries.contains_key(doc_type)
    }

    /// True iff the type is explicitly tagged entry-point. Unknown types are
    /// not entry points.
    pub fn is_entry_point(&self, doc_type: &DocType) -> bool {
        self.entries
            .get(doc_type)
            .map(|constraint| constraint.entry_point)
            .unwrap_or(false)
    }

    /// Human label for a doc type. Unknown types fall back to title-casing
    /// the hyphen-split identifier (`hld-arch` -> `Hld Arch`).
    pub fn display_name(&self, doc_type: &DocType) -> String {
        match self.entries.get(doc_type) {
            Some(constraint) => constraint.display_name.clone(),
            None => title_case(doc_type.as_str()),
        }
    }

    pub fn doc_types(&self) -> impl Iterator<Item = &DocType> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocType, &Constraint)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every structural invariant, returning the first defect found:
    /// closure, no self-reference, acyclic `required` graph, entry-point
    /// soundness, no required/recommended overlap, phase range.
    pub fn verify(&self) -> Result<(), CatalogError> {
        for (parent, constraint) in &self.entries {
            if !(1..=9).contains(&constraint.phase) {
                return Err(CatalogError::PhaseOutOfRange {
                    doc_type: parent.clone(),
                    phase: constraint.phase,
                });
            }

            if constraint.entry_point != constraint.required.is_empty() {
                return Err(CatalogError::EntryPointMismatch {
                    doc_type: parent.clone(),
                });
            }

            let lists = [
                &constraint.required,
                &constraint.recommended,
                &constraint.enhances,
            ];
            for list in lists {
                for referenced in list {
                    if referenced == parent {
                        return Err(CatalogError::SelfReference {
                            parent: parent.clone(),
                        });
                    }
                    if !self.entries.contains_key(referenced) {
                        return Err(CatalogError::UnknownReference {
                            parent: parent.clone(),
                            missing: referenced.clone(),
                        });
                    }
                }
            }

            let required: BTreeSet<&DocType> = constraint.required.iter().collect();
            for recommended in &constraint.recommended {
                if required.contains(recommended) {
                    return Err(CatalogError::RequiredRecommendedOverlap {
                        parent: parent.clone(),
                        doc_type: recommended.clone(),
                    });
                }
            }
        }

        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            catalog: &ConstraintCatalog,
            doc_type: &DocType,
            marks: &mut BTreeMap<DocType, Mark>,
        ) -> Result<(), CatalogError> {
            match marks.get(doc_type).copied().unwrap_or(Mark::Unvisited) {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    return Err(CatalogError::RequiredCycle {
                        doc_type: doc_type.clone(),
                    })
                }
                Mark::Unvisited => {}
            }
            marks.insert(doc_type.clone(), Mark::InProgress);
            if let Some(constraint) = catalog.entries.get(doc_type) {
                for dep in &constraint.required {
                    visit(catalog, dep, marks)?;
                }
            }
            marks.insert(doc_type.clone(), Mark::Done);
            Ok(())
        }

        let mut marks = BTreeMap::new();
        for doc_type in self.entries.keys() {
            visit(self, doc_type, &mut marks)?;
        }
        Ok(())
    }
}

fn title_case(identifier: &str) -> String {
    identifier
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
