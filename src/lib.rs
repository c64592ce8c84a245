//! # Trellis
//!
//! Compiles a declarative table schema into Dataverse metadata, then either
//! renders an importable solution package offline or provisions the
//! metadata live, idempotently.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Schema file (.json / .toml)                 │
//! │       (tables, columns, lookups, choices)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model::loader]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Model (Rust Types)                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │   CompiledSchema: encoded attributes, primary columns,   │
//! │   relationships, dependency tiers + deferred fixups      │
//! └─────────────────────────────────────────────────────────┘
//!                 │                          │
//!                 ▼ [package]                ▼ [provision]
//! ┌───────────────────────────┐  ┌──────────────────────────┐
//! │  Solution package (XML)   │  │  Web API metadata calls  │
//! └───────────────────────────┘  └──────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod model;
pub mod package;
pub mod provision;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile_schema, CompileOptions, CompiledSchema, SchemaError};
    pub use crate::config::Settings;
    pub use crate::model::{load_schema, Column, ColumnType, Schema, Table};
    pub use crate::package::{render_package, Package};
    pub use crate::provision::{MetadataStore, ProvisionReport, Provisioner};
}
