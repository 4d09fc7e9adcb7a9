//! Request Resolver - Raw Fields to Resolved Configuration
//!
//! Takes the raw fields collected by the parser and turns them into the
//! configuration the metric engine consumes. This is where the field
//! catalog and script compiler are consulted and where defaults are
//! decided.
//!
//! # Pipeline
//!
//! ```text
//! Request body → Token stream → parse_request → RawRequest → resolve_request → ResolvedConfig
//!                                                              ↓          ↓
//!                                                       ScriptCompiler  FieldCatalog
//! ```
//!
//! # Precedence
//!
//! - A script always makes the source a bytes source.
//! - Without a script, the field's catalog kind picks numeric or bytes, and
//!   a pre-hashed field turns the rehash default off.
//! - The field is still looked up when a script is present, so a mapped
//!   field is attached to the script source.
//! - Rehash defaults to `true` whenever nothing above decided it.

use crate::lexer::JsonLexer;
use crate::parser::{parse_request, RawRequest};
use cardinal_core::{
    ConfigError, ConfigResult, FieldCatalog, FieldContext, ResolvedConfig, ResolverConfig,
    ScriptCompiler, SourceKind, Token, TokenStream, ValuesSourceConfig,
};
use tracing::debug;

// ============================================================================
// CARDINALITY PARSER
// ============================================================================

/// Resolves cardinality aggregation requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardinalityParser {
    config: ResolverConfig,
}

impl CardinalityParser {
    /// Aggregation type this parser handles.
    pub const TYPE: &'static str = "cardinality";

    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a request whose opening `ObjectStart` was already consumed.
    pub fn resolve<T, C, S>(
        &self,
        name: &str,
        tokens: &mut T,
        catalog: &C,
        scripts: &S,
    ) -> ConfigResult<ResolvedConfig<S::Script>>
    where
        T: TokenStream + ?Sized,
        C: FieldCatalog + ?Sized,
        S: ScriptCompiler + ?Sized,
    {
        let raw = parse_request(name, tokens, &self.config)?;
        resolve_request(name, raw, catalog, scripts)
    }

    /// Resolve a request from a stream positioned at its `ObjectStart`.
    pub fn resolve_body<T, C, S>(
        &self,
        name: &str,
        tokens: &mut T,
        catalog: &C,
        scripts: &S,
    ) -> ConfigResult<ResolvedConfig<S::Script>>
    where
        T: TokenStream + ?Sized,
        C: FieldCatalog + ?Sized,
        S: ScriptCompiler + ?Sized,
    {
        match tokens.next_token() {
            Ok(Token::ObjectStart) => self.resolve(name, tokens, catalog, scripts),
            Ok(other) => Err(ConfigError::UnexpectedToken {
                request: name.to_string(),
                token: other.kind(),
            }),
            Err(source) => Err(ConfigError::Read {
                request: name.to_string(),
                source,
            }),
        }
    }

    /// Resolve a request given as JSON text. Nothing may follow the object.
    pub fn resolve_json<C, S>(
        &self,
        name: &str,
        body: &str,
        catalog: &C,
        scripts: &S,
    ) -> ConfigResult<ResolvedConfig<S::Script>>
    where
        C: FieldCatalog + ?Sized,
        S: ScriptCompiler + ?Sized,
    {
        let mut lexer = JsonLexer::new(body);
        let resolved = self.resolve_body(name, &mut lexer, catalog, scripts)?;
        match lexer.next_token() {
            Ok(Token::EndOfStream) => Ok(resolved),
            Ok(other) => Err(ConfigError::UnexpectedToken {
                request: name.to_string(),
                token: other.kind(),
            }),
            Err(source) => Err(ConfigError::Read {
                request: name.to_string(),
                source,
            }),
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Build the resolved configuration from raw request fields.
///
/// The script, if any, is compiled before the field is looked up.
pub fn resolve_request<C, S>(
    name: &str,
    raw: RawRequest,
    catalog: &C,
    scripts: &S,
) -> ConfigResult<ResolvedConfig<S::Script>>
where
    C: FieldCatalog + ?Sized,
    S: ScriptCompiler + ?Sized,
{
    let mut rehash = raw.rehash;
    let mut source: Option<ValuesSourceConfig<S::Script>> = None;

    if let Some(script) = raw.script.as_deref() {
        let compiled = scripts
            .compile(raw.lang.as_deref(), script, raw.params.as_ref())
            .map_err(|source| ConfigError::ScriptCompilation {
                request: name.to_string(),
                source,
            })?;
        let mut config = ValuesSourceConfig::bytes();
        config.script = Some(compiled);
        source = Some(config);
    }

    if let Some(field) = raw.field {
        let mapping = catalog
            .lookup(&field)
            .map_err(|source| ConfigError::FieldLookup {
                request: name.to_string(),
                source,
            })?;

        let mut config = match source {
            Some(config) => config,
            None => {
                let mut config = match mapping {
                    Some(m) if m.kind.is_numeric() => ValuesSourceConfig::of_kind(SourceKind::Numeric),
                    _ => ValuesSourceConfig::bytes(),
                };
                if mapping.is_none() {
                    debug!(request = %name, field = %field, "field is unmapped");
                    config.unmapped = true;
                }
                if rehash.is_none() && mapping.is_some_and(|m| m.kind.is_prehashed()) {
                    debug!(request = %name, field = %field, "pre-hashed field, rehash defaults off");
                    rehash = Some(false);
                }
                config
            }
        };

        if let Some(m) = mapping {
            config.field_context = Some(FieldContext {
                field,
                indexed_data: m.indexed_data,
            });
        }
        source = Some(config);
    }

    let source = source.unwrap_or_else(ValuesSourceConfig::bytes);
    let rehash = rehash.unwrap_or(true);

    debug!(
        request = %name,
        kind = %source.kind,
        unmapped = source.unmapped,
        script = source.script.is_some(),
        rehash,
        "resolved cardinality request"
    );

    Ok(ResolvedConfig {
        name: name.to_string(),
        source,
        precision_threshold: raw.precision_threshold,
        rehash,
    })
}
