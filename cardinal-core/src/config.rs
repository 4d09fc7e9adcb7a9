//! Resolver configuration

use crate::ResolverConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound for [`ResolverConfig::max_params_depth`]. Reading `params`
/// recurses once per nesting level.
pub const MAX_PARAMS_DEPTH_LIMIT: usize = 1024;

/// Knobs for the request resolver.
///
/// Every field has a default so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Fail on a repeated top-level key instead of overwriting it.
    pub reject_duplicate_keys: bool,
    /// Accept camelCase spellings of multi-word keys (`precisionThreshold`).
    pub accept_camel_case: bool,
    /// Deepest nesting allowed inside the `params` object.
    pub max_params_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            reject_duplicate_keys: false,
            accept_camel_case: true,
            max_params_depth: 32,
        }
    }
}

impl ResolverConfig {
    /// Parse a configuration from TOML and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ResolverConfigError> {
        let config: ResolverConfig =
            toml::from_str(content).map_err(|e| ResolverConfigError::Malformed {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ResolverConfigError> {
        if self.max_params_depth == 0 {
            return Err(ResolverConfigError::InvalidValue {
                field: "max_params_depth".to_string(),
                value: self.max_params_depth.to_string(),
                reason: "max_params_depth must be at least 1".to_string(),
            });
        }
        if self.max_params_depth > MAX_PARAMS_DEPTH_LIMIT {
            return Err(ResolverConfigError::InvalidValue {
                field: "max_params_depth".to_string(),
                value: self.max_params_depth.to_string(),
                reason: format!("max_params_depth must be at most {}", MAX_PARAMS_DEPTH_LIMIT),
            });
        }
        Ok(())
    }
}
