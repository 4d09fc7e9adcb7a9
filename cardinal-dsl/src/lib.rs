//! Cardinal DSL - Cardinality Request Reader & Resolver
//!
//! This crate turns a cardinality aggregation request body into the typed
//! configuration the metric engine runs with.
//!
//! Architecture:
//! ```text
//! Request body (JSON text or any TokenStream)
//!     ↓
//! Lexer (JsonLexer / VecTokenStream)
//!     ↓
//! Parser (token loop → RawRequest)
//!     ↓
//! Compiler (catalog + script compiler → ResolvedConfig)
//! ```

pub mod compiler;
pub mod lexer;
pub mod parser;

// Re-export key types for convenience
pub use compiler::*;
pub use lexer::*;
pub use parser::*;

use cardinal_core::{
    ConfigResult, FieldCatalog, ResolvedConfig, ResolverConfig, ScriptCompiler, TokenStream,
};

/// Resolve a request with the default resolver configuration.
///
/// The stream must be positioned just inside the request object.
pub fn resolve<T, C, S>(
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
    CardinalityParser::new(ResolverConfig::default()).resolve(name, tokens, catalog, scripts)
}

/// Resolve a JSON request body with the default resolver configuration.
pub fn resolve_json<C, S>(
    name: &str,
    body: &str,
    catalog: &C,
    scripts: &S,
) -> ConfigResult<ResolvedConfig<S::Script>>
where
    C: FieldCatalog + ?Sized,
    S: ScriptCompiler + ?Sized,
{
    CardinalityParser::new(ResolverConfig::default()).resolve_json(name, body, catalog, scripts)
}
