//! Bearer credential sources.

use super::error::PreconditionError;

/// Supplies the bearer token sent with every store request.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Result<String, PreconditionError>;
}

/// A token fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Result<String, PreconditionError> {
        if self.0.is_empty() {
            return Err(PreconditionError::MissingCredential("empty token".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// A token read from an environment variable on each call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvToken {
    fn token(&self) -> Result<String, PreconditionError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(PreconditionError::MissingCredential(format!(
                "environment variable {} is not set",
                self.var
            ))),
        }
    }
}
