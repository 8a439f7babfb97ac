//! Error types for the Basis Theory provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors returned from provider operations.
///
/// Failures that already carry user-facing text (translated API errors,
/// pre-flight validation, rejected updates) travel as
/// [`ProviderError::Diagnostics`] so their summaries reach the host verbatim.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// One or more fully formatted diagnostics.
    #[error("{}", summaries(.0))]
    Diagnostics(Vec<Diagnostic>),
}

impl ProviderError {
    /// Wrap a single diagnostic.
    pub fn diagnostic(diagnostic: Diagnostic) -> Self {
        Self::Diagnostics(vec![diagnostic])
    }

    /// An error diagnostic with the given summary.
    pub fn summary(summary: impl Into<String>) -> Self {
        Self::diagnostic(Diagnostic::error(summary))
    }

    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Unimplemented(msg) => msg,
            Self::Diagnostics(diags) => diags.first().map(|d| d.summary.as_str()).unwrap_or(""),
        }
    }

    /// Convert into the diagnostics reported to the host.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Diagnostics(diags) => diags,
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

fn summaries(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| d.summary.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
