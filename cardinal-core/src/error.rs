//! Error types for request resolution

use crate::TokenKind;
use thiserror::Error;

/// Reader errors (malformed or truncated request bodies).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Read error at line {line}, column {column}: {message}")]
pub struct ReadError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ReadError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Field catalog failures. An unmapped field is not one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Field catalog unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Lookup failed for field {field}: {reason}")]
    LookupFailed { field: String, reason: String },
}

/// Script compiler failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Unsupported script language: {lang}")]
    UnsupportedLanguage { lang: String },

    #[error("Script compilation failed: {reason}")]
    CompilationFailed { reason: String },
}

/// Request resolution errors.
///
/// Every variant names the request (the aggregation) it came from.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown key for a {token} in [{request}]: [{}].", .key.as_deref().unwrap_or("null"))]
    UnknownKey {
        request: String,
        key: Option<String>,
        token: TokenKind,
    },

    #[error("Unexpected token {token} in [{request}].")]
    UnexpectedToken { request: String, token: TokenKind },

    #[error("Duplicate key in [{request}]: [{key}].")]
    DuplicateKey { request: String, key: String },

    #[error("Failed to compile script in [{request}]: {source}")]
    ScriptCompilation {
        request: String,
        #[source]
        source: ScriptError,
    },

    #[error("Failed to look up field in [{request}]: {source}")]
    FieldLookup {
        request: String,
        #[source]
        source: CatalogError,
    },

    #[error("Malformed request [{request}]: {source}")]
    Read {
        request: String,
        #[source]
        source: ReadError,
    },
}

impl ConfigError {
    /// Name of the request the error belongs to.
    pub fn request(&self) -> &str {
        match self {
            ConfigError::UnknownKey { request, .. }
            | ConfigError::UnexpectedToken { request, .. }
            | ConfigError::DuplicateKey { request, .. }
            | ConfigError::ScriptCompilation { request, .. }
            | ConfigError::FieldLookup { request, .. }
            | ConfigError::Read { request, .. } => request,
        }
    }
}

/// Resolver configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed resolver configuration: {reason}")]
    Malformed { reason: String },
}

/// Result type alias for request resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// TESTS
// =============================================================================
