//! Raw request fields collected by the token loop

use cardinal_core::ScriptParams;

/// Recognized top-level keys.
pub mod keys {
    pub const FIELD: &str = "field";
    pub const SCRIPT: &str = "script";
    pub const LANG: &str = "lang";
    pub const PARAMS: &str = "params";
    pub const REHASH: &str = "rehash";
    pub const PRECISION_THRESHOLD: &str = "precision_threshold";
}

/// Precision threshold used when the request gives none.
pub const DEFAULT_PRECISION_THRESHOLD: i64 = -1;

/// Request fields as written by the caller, before any defaulting.
///
/// Lives for exactly one parse. A repeated key overwrites the earlier value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub field: Option<String>,
    pub script: Option<String>,
    pub lang: Option<String>,
    pub params: Option<ScriptParams>,
    pub precision_threshold: i64,
    /// `None` until the caller sets it explicitly
    pub rehash: Option<bool>,
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            field: None,
            script: None,
            lang: None,
            params: None,
            precision_threshold: DEFAULT_PRECISION_THRESHOLD,
            rehash: None,
        }
    }
}
