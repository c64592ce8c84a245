//! Schema loaders for different file formats.
//!
//! Currently supports:
//! - **JSON** (.json) - Primary format, `{ "tables": [...] }`
//! - **TOML** (.toml) - Same shape, `[[tables]]` arrays
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis::model::loader::load_schema;
//! use std::path::Path;
//!
//! let schema = load_schema(Path::new("schema.json"))?;
//! ```

use std::path::Path;
use thiserror::Error;

use super::Schema;

/// Errors that can occur when loading a schema.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Unsupported file extension
    #[error("Unsupported file extension: {extension}. Supported: .json, .toml")]
    UnsupportedExtension { extension: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("Invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("Invalid TOML schema: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for schema loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Supported schema document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Toml,
}

impl SchemaFormat {
    /// Pick a format from a file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(SchemaFormat::Json),
            "toml" => Some(SchemaFormat::Toml),
            _ => None,
        }
    }
}

/// Load a schema from a file path.
///
/// The format is selected based on the file extension.
pub fn load_schema(path: &Path) -> LoadResult<Schema> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format =
        SchemaFormat::from_extension(extension).ok_or_else(|| LoadError::UnsupportedExtension {
            extension: extension.to_string(),
        })?;

    let content = std::fs::read_to_string(path)?;
    load_schema_from_str(&content, format)
}

/// Load a schema from a string (useful for testing).
pub fn load_schema_from_str(content: &str, format: SchemaFormat) -> LoadResult<Schema> {
    let schema: Schema = match format {
        SchemaFormat::Json => serde_json::from_str(content)?,
        SchemaFormat::Toml => toml::from_str(content)?,
    };
    Ok(schema)
}
