//! Offline solution package rendering.
//!
//! A pure function of the compiled schema and the publisher/solution
//! identity. Output layout:
//!
//! ```text
//! [Content_Types].xml
//! Entities/<table>/Entity.xml
//! Entities/<table>/RibbonDiff.xml
//! Other/Customizations.xml
//! Other/Relationships.xml
//! Other/Relationships/<referenced table>.xml
//! Other/Solution.xml
//! ```
//!
//! Identical input always renders byte-identical documents.

pub mod attribute;
pub mod entity;
pub mod hash;
pub mod relationship;
pub mod solution;
pub mod system;
pub mod xml;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::CompiledSchema;
use crate::config::Settings;

pub use xml::{escape_xml, XmlWriter};

/// Errors from writing a package to disk.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Failed to clear output directory {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendered documents keyed by `/`-separated relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    pub documents: BTreeMap<String, String>,
}

impl Package {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// SHA-256 over every path and document, in path order.
    pub fn digest(&self) -> String {
        // A map of strings always serializes.
        hash::compute_hash(&self.documents).unwrap_or_default()
    }

    /// Delete `dir` if present and write every document beneath it.
    pub fn write_to_dir(&self, dir: &Path) -> Result<(), PackageError> {
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|source| PackageError::Clear {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        for (relative, content) in &self.documents {
            let path = relative.split('/').fold(dir.to_path_buf(), |p, part| p.join(part));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| PackageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, content).map_err(|source| PackageError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "wrote document");
        }

        Ok(())
    }
}

/// Render the complete package for a compiled schema.
pub fn render_package(compiled: &CompiledSchema, settings: &Settings) -> Package {
    let language = settings.package.language_code.to_string();
    let prefix = settings.publisher.prefix.as_str();
    let mut documents = BTreeMap::new();

    for entity in &compiled.entities {
        let dir = format!("Entities/{}", entity.logical_name);
        documents.insert(
            format!("{}/Entity.xml", dir),
            entity::render_entity(entity, prefix, &language),
        );
        documents.insert(format!("{}/RibbonDiff.xml", dir), entity::render_ribbon_diff());
    }

    for (referenced, group) in compiled.relationships_by_referenced() {
        documents.insert(
            format!("Other/Relationships/{}.xml", referenced),
            relationship::render_relationship_group(&group),
        );
    }

    documents.insert(
        "Other/Relationships.xml".to_string(),
        relationship::render_relationship_index(&compiled.relationship_index()),
    );
    documents.insert(
        "Other/Customizations.xml".to_string(),
        solution::render_customizations(&language),
    );
    documents.insert(
        "Other/Solution.xml".to_string(),
        solution::render_solution_manifest(
            &settings.solution,
            &settings.publisher,
            &language,
            compiled.entities.iter().map(|e| e.logical_name.as_str()),
        ),
    );
    documents.insert("[Content_Types].xml".to_string(), solution::render_content_types());

    tracing::info!(
        documents = documents.len(),
        tables = compiled.entities.len(),
        relationships = compiled.relationships.len(),
        "rendered package"
    );

    Package { documents }
}
