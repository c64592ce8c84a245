//! TOML-based configuration for Trellis.
//!
//! Supports a config file (trellis.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [publisher]
//! unique_name = "Resus_EDucation_Initiative"
//! display_name = "REdI"
//! prefix = "redi"
//! option_value_prefix = 91352
//!
//! [solution]
//! unique_name = "SimQuipTables"
//! display_name = "SimQuip Tables"
//! version = "1.0.0.0"
//!
//! [package]
//! output_dir = "solution_output"
//!
//! [environment]
//! url = "${DATAVERSE_URL}"
//! token_env = "TRELLIS_TOKEN"
//!
//! [provision]
//! visibility_attempts = 10
//! visibility_interval_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unterminated variable reference in: {0}")]
    UnterminatedVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub publisher: PublisherSettings,
    pub solution: SolutionSettings,
    pub package: PackageSettings,
    pub environment: EnvironmentSettings,
    pub provision: ProvisionSettings,
}

/// Publisher identity written into the package manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublisherSettings {
    pub unique_name: String,
    pub display_name: String,
    /// Customization prefix; also used to find the publisher when provisioning.
    pub prefix: String,
    pub option_value_prefix: u32,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            unique_name: "Resus_EDucation_Initiative".to_string(),
            display_name: "REdI".to_string(),
            prefix: "redi".to_string(),
            option_value_prefix: 91352,
        }
    }
}

/// The logical grouping every table is registered into.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolutionSettings {
    pub unique_name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
}

impl Default for SolutionSettings {
    fn default() -> Self {
        Self {
            unique_name: "SimQuipTables".to_string(),
            display_name: "SimQuip Tables".to_string(),
            description: "SimQuip equipment management tables".to_string(),
            version: "1.0.0.0".to_string(),
        }
    }
}

/// Offline package output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PackageSettings {
    pub language_code: u32,
    pub output_dir: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            language_code: 1033,
            output_dir: "solution_output".to_string(),
        }
    }
}

/// Live environment to provision against.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Organization URL (supports ${ENV_VAR} expansion).
    pub url: Option<String>,
    pub api_version: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    pub request_timeout_secs: u64,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_version: "v9.2".to_string(),
            token_env: "TRELLIS_TOKEN".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl EnvironmentSettings {
    /// Organization URL with environment variables expanded.
    pub fn resolved_url(&self) -> Result<String, SettingsError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| SettingsError::InvalidConfig("environment.url is not set".to_string()))?;
        Ok(expand_env_vars(url)?.trim_end_matches('/').to_string())
    }

    /// Base URL of the metadata endpoint, e.g. `https://org/api/data/v9.2`.
    pub fn api_base(&self) -> Result<String, SettingsError> {
        Ok(format!("{}/api/data/{}", self.resolved_url()?, self.api_version))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Provisioning tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisionSettings {
    /// Polls after a table creation before giving up on visibility.
    pub visibility_attempts: u32,
    pub visibility_interval_ms: u64,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            visibility_attempts: 10,
            visibility_interval_ms: 1000,
        }
    }
}

impl ProvisionSettings {
    pub fn visibility_interval(&self) -> Duration {
        Duration::from_millis(self.visibility_interval_ms)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TRELLIS_CONFIG`
    /// 2. `./trellis.toml`
    /// 3. `~/.config/trellis/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("TRELLIS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("trellis.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trellis").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.publisher.prefix.is_empty() {
            return Err(SettingsError::InvalidConfig("publisher.prefix must not be empty".to_string()));
        }
        if self.provision.visibility_attempts == 0 {
            return Err(SettingsError::InvalidConfig(
                "provision.visibility_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                return Err(SettingsError::UnterminatedVariable(s.to_string()));
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // A lone `$` is kept.
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
