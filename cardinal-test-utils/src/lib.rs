//! Cardinal Test Utilities
//!
//! Centralized test infrastructure for the cardinal workspace:
//! - Mock field catalog and script compiler sharing one call log
//! - Proptest generators for request bodies and field kinds
//! - Test fixtures for common requests
//! - Tracing setup for tests

// Re-export core types for convenience
pub use cardinal_core::{
    CatalogError, ConfigError, FieldCatalog, FieldContext, FieldKind, FieldMapping,
    IndexedDataHandle, ResolvedConfig, ResolverConfig, ScriptCompiler, ScriptError,
    ScriptParams, SourceKind, Token, TokenKind, ValuesSourceConfig,
};

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// ============================================================================
// CALL LOG
// ============================================================================

/// A collaborator call observed during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lookup(String),
    Compile { lang: Option<String>, source: String },
}

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }
}

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

/// In-memory field catalog.
#[derive(Debug, Clone, Default)]
pub struct MockFieldCatalog {
    fields: HashMap<String, FieldMapping>,
    failure: Option<CatalogError>,
    log: CallLog,
}

impl MockFieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` with the given kind. Handles are assigned in insertion order.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let handle = IndexedDataHandle(self.fields.len() as u64 + 1);
        self.fields.insert(name.into(), FieldMapping::new(kind, handle));
        self
    }

    pub fn with_numeric(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldKind::Numeric)
    }

    pub fn with_other(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldKind::Other)
    }

    pub fn with_prehashed(self, name: impl Into<String>) -> Self {
        self.with_field(name, FieldKind::PreHashed)
    }

    /// Make every lookup fail.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(CatalogError::Unavailable {
            reason: reason.into(),
        });
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn mapping(&self, name: &str) -> Option<FieldMapping> {
        self.fields.get(name).copied()
    }
}

impl FieldCatalog for MockFieldCatalog {
    fn lookup(&self, name: &str) -> Result<Option<FieldMapping>, CatalogError> {
        self.log.record(Call::Lookup(name.to_string()));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.fields.get(name).copied()),
        }
    }
}

/// What the mock compiler hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct MockScript {
    pub lang: Option<String>,
    pub source: String,
    pub params: Option<ScriptParams>,
}

/// Script compiler that accepts everything except rejected languages.
#[derive(Debug, Clone, Default)]
pub struct MockScriptCompiler {
    rejected_langs: Vec<String>,
    log: CallLog,
}

impl MockScriptCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, lang: impl Into<String>) -> Self {
        self.rejected_langs.push(lang.into());
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

impl ScriptCompiler for MockScriptCompiler {
    type Script = MockScript;

    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: Option<&ScriptParams>,
    ) -> Result<MockScript, ScriptError> {
        self.log.record(Call::Compile {
            lang: lang.map(str::to_string),
            source: source.to_string(),
        });
        if let Some(lang) = lang.filter(|l| self.rejected_langs.iter().any(|r| r == l)) {
            return Err(ScriptError::UnsupportedLanguage {
                lang: lang.to_string(),
            });
        }
        Ok(MockScript {
            lang: lang.map(str::to_string),
            source: source.to_string(),
            params: params.cloned(),
        })
    }
}

/// Catalog and compiler wired to the same call log.
pub fn mock_collaborators(catalog: MockFieldCatalog) -> (MockFieldCatalog, MockScriptCompiler, CallLog) {
    let log = CallLog::new();
    let catalog = catalog.with_log(log.clone());
    let compiler = MockScriptCompiler::new().with_log(log.clone());
    (catalog, compiler, log)
}

// ============================================================================
// FIXTURES
// ============================================================================

pub const NUMERIC_FIELD: &str = "price";
pub const KEYWORD_FIELD: &str = "user_id";
pub const PREHASHED_FIELD: &str = "user_id_hash";
pub const UNMAPPED_FIELD: &str = "does_not_exist";

/// Catalog with one field of each kind.
pub fn fixture_catalog() -> MockFieldCatalog {
    MockFieldCatalog::new()
        .with_numeric(NUMERIC_FIELD)
        .with_other(KEYWORD_FIELD)
        .with_prehashed(PREHASHED_FIELD)
}

/// Request body naming a single field.
pub fn field_request(field: &str) -> String {
    json!({ "field": field }).to_string()
}

/// Request body with a script, its language and parameters.
pub fn script_request(script: &str, lang: &str) -> String {
    json!({
        "script": script,
        "lang": lang,
        "params": { "factor": 2 },
    })
    .to_string()
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub fn arb_field_kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::Numeric),
        Just(FieldKind::Other),
        Just(FieldKind::PreHashed),
    ]
}

/// Field names drawn from the fixture catalog, plus one unmapped name.
pub fn arb_fixture_field() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(NUMERIC_FIELD),
        Just(KEYWORD_FIELD),
        Just(PREHASHED_FIELD),
        Just(UNMAPPED_FIELD),
    ]
}

/// Keys the resolver does not recognize.
pub fn arb_unknown_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}".prop_filter("must not be a request key", |k| {
        !matches!(
            k.as_str(),
            "field" | "script" | "lang" | "params" | "rehash" | "precision_threshold"
        )
    })
}

fn arb_param_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Well-formed request bodies: each recognized key optionally present
/// with a value of the right kind.
pub fn arb_request_body() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(arb_fixture_field()),
        proptest::option::of("[a-z_.]{1,24}"),
        proptest::option::of(prop_oneof![Just("painless"), Just("expression")]),
        proptest::option::of(proptest::collection::btree_map("[a-z]{1,6}", arb_param_value(), 0..4)),
        proptest::option::of(any::<bool>()),
        proptest::option::of(-1i64..100_000),
    )
        .prop_map(|(field, script, lang, params, rehash, precision)| {
            let mut body = Map::new();
            if let Some(field) = field {
                body.insert("field".to_string(), Value::from(field));
            }
            if let Some(script) = script {
                body.insert("script".to_string(), Value::from(script));
            }
            if let Some(lang) = lang {
                body.insert("lang".to_string(), Value::from(lang));
            }
            if let Some(params) = params {
                body.insert("params".to_string(), Value::Object(params.into_iter().collect()));
            }
            if let Some(rehash) = rehash {
                body.insert("rehash".to_string(), Value::from(rehash));
            }
            if let Some(precision) = precision {
                body.insert("precision_threshold".to_string(), Value::from(precision));
            }
            Value::Object(body)
        })
}

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-writer subscriber filtered by `RUST_LOG`. Safe to call
/// from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
