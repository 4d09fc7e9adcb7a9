//! Field metadata, value sources and the collaborator seams

use crate::{CatalogError, ScriptError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Script parameters as read from the request body.
pub type ScriptParams = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// FIELD KINDS
// ============================================================================

/// How the catalog classifies a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Any numeric field type
    Numeric,
    /// Mapped, but neither numeric nor pre-hashed (keywords, text, ...)
    Other,
    /// Values are already uniformly distributed hashes
    #[serde(alias = "pre_hashed", alias = "murmur3")]
    PreHashed,
}

impl FieldKind {
    /// Convert to the catalog string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Other => "other",
            FieldKind::PreHashed => "prehashed",
        }
    }

    /// Parse from the catalog string representation.
    pub fn from_catalog_str(s: &str) -> Result<Self, FieldKindParseError> {
        match s.to_lowercase().as_str() {
            "numeric" => Ok(FieldKind::Numeric),
            "other" => Ok(FieldKind::Other),
            "prehashed" | "pre_hashed" | "murmur3" => Ok(FieldKind::PreHashed),
            _ => Err(FieldKindParseError(s.to_string())),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Numeric)
    }

    pub fn is_prehashed(&self) -> bool {
        matches!(self, FieldKind::PreHashed)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = FieldKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_catalog_str(s)
    }
}

/// Error when parsing an invalid field kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKindParseError(pub String);

impl fmt::Display for FieldKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid field kind: {}", self.0)
    }
}

impl std::error::Error for FieldKindParseError {}

/// Kind of values the metric engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Numeric,
    Bytes,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Numeric => f.write_str("numeric"),
            SourceKind::Bytes => f.write_str("bytes"),
        }
    }
}

// ============================================================================
// CATALOG TYPES
// ============================================================================

/// Opaque handle to a field's indexed data, owned by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedDataHandle(pub u64);

/// Result of a successful catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub kind: FieldKind,
    pub indexed_data: IndexedDataHandle,
}

impl FieldMapping {
    pub fn new(kind: FieldKind, indexed_data: IndexedDataHandle) -> Self {
        Self { kind, indexed_data }
    }
}

/// A mapped field bound to its indexed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContext {
    pub field: String,
    pub indexed_data: IndexedDataHandle,
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Resolves field names against the index mapping.
pub trait FieldCatalog {
    /// `Ok(None)` means the field is unmapped, which is not an error.
    fn lookup(&self, name: &str) -> Result<Option<FieldMapping>, CatalogError>;
}

impl<T: FieldCatalog + ?Sized> FieldCatalog for &T {
    fn lookup(&self, name: &str) -> Result<Option<FieldMapping>, CatalogError> {
        (**self).lookup(name)
    }
}

impl FieldCatalog for HashMap<String, FieldMapping> {
    fn lookup(&self, name: &str) -> Result<Option<FieldMapping>, CatalogError> {
        Ok(self.get(name).copied())
    }
}

/// Compiles script sources into evaluatable expressions.
///
/// Implementations are bound to the caller's per-request document lookup;
/// the resolver never sees it.
pub trait ScriptCompiler {
    type Script;

    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: Option<&ScriptParams>,
    ) -> Result<Self::Script, ScriptError>;
}

impl<T: ScriptCompiler + ?Sized> ScriptCompiler for &T {
    type Script = T::Script;

    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: Option<&ScriptParams>,
    ) -> Result<Self::Script, ScriptError> {
        (**self).compile(lang, source, params)
    }
}
