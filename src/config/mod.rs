//! Configuration module for Trellis.
//!
//! Handles publisher and solution identity, package output, the target
//! environment, and provisioning tunables.

mod settings;

pub use settings::{
    expand_env_vars, EnvironmentSettings, PackageSettings, ProvisionSettings, PublisherSettings,
    Settings, SettingsError, SolutionSettings,
};
