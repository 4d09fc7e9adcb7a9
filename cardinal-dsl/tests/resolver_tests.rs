//! Integration tests for cardinality request resolution
//!
//! Tests verify:
//! - Source kind selection (script precedence, numeric inference)
//! - Rehash defaulting (pre-hashed fields, explicit values)
//! - Unmapped fields and empty requests
//! - Key/value-kind validation and error reporting
//! - Collaborator call order

use cardinal_core::{TokenStream, MAX_PARAMS_DEPTH_LIMIT};
use cardinal_dsl::{resolve, resolve_json, CardinalityParser, JsonLexer, VecTokenStream};
use cardinal_test_utils::*;
use serde_json::json;

// ============================================================================
// HELPERS
// ============================================================================

fn resolve_body(body: &str) -> Result<ResolvedConfig<MockScript>, ConfigError> {
    init_test_tracing();
    resolve_json("distinct", body, &fixture_catalog(), &MockScriptCompiler::new())
}

// ============================================================================
// SOURCE KIND AND DEFAULTS
// ============================================================================

#[test]
fn test_script_only() {
    let resolved = resolve_body(r#"{"script": "s"}"#).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Bytes);
    assert_eq!(
        resolved.source.script,
        Some(MockScript {
            lang: None,
            source: "s".to_string(),
            params: None,
        })
    );
    assert_eq!(resolved.source.field_context, None);
    assert!(!resolved.source.unmapped);
    assert!(resolved.rehash);
}

#[test]
fn test_numeric_field() {
    let resolved = resolve_body(&field_request(NUMERIC_FIELD)).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Numeric);
    assert_eq!(
        resolved.source.field_context,
        Some(FieldContext {
            field: NUMERIC_FIELD.to_string(),
            indexed_data: fixture_catalog().mapping(NUMERIC_FIELD).unwrap().indexed_data,
        })
    );
    assert!(resolved.rehash);
}

#[test]
fn test_keyword_field_is_bytes() {
    let resolved = resolve_body(&field_request(KEYWORD_FIELD)).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Bytes);
    assert_eq!(resolved.source.field_name(), Some(KEYWORD_FIELD));
    assert!(!resolved.source.unmapped);
    assert!(resolved.rehash);
}

#[test]
fn test_prehashed_field_defaults_rehash_off() {
    let resolved = resolve_body(&field_request(PREHASHED_FIELD)).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Bytes);
    assert_eq!(resolved.source.field_name(), Some(PREHASHED_FIELD));
    assert!(!resolved.rehash);
}

#[test]
fn test_explicit_rehash_wins_on_prehashed_field() {
    let body = json!({ "field": PREHASHED_FIELD, "rehash": true }).to_string();
    assert!(resolve_body(&body).unwrap().rehash);
}

#[test]
fn test_explicit_rehash_false_on_numeric_field() {
    let body = json!({ "field": NUMERIC_FIELD, "rehash": false }).to_string();
    assert!(!resolve_body(&body).unwrap().rehash);
}

#[test]
fn test_unmapped_field() {
    let resolved = resolve_body(&field_request(UNMAPPED_FIELD)).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Bytes);
    assert!(resolved.source.unmapped);
    assert_eq!(resolved.source.field_context, None);
    assert_eq!(resolved.source.script, None);
    assert!(resolved.rehash);
}

#[test]
fn test_empty_request() {
    let resolved = resolve_body("{}").unwrap();

    assert_eq!(resolved.name, "distinct");
    assert_eq!(resolved.source, ValuesSourceConfig::bytes());
    assert_eq!(resolved.precision_threshold, -1);
    assert!(resolved.rehash);
}

#[test]
fn test_script_takes_precedence_over_numeric_field() {
    let body = json!({ "field": NUMERIC_FIELD, "script": "_value * 2" }).to_string();
    let resolved = resolve_body(&body).unwrap();

    assert_eq!(resolved.source.kind, SourceKind::Bytes);
    assert!(resolved.source.has_script());
    assert_eq!(resolved.source.field_name(), Some(NUMERIC_FIELD));
}

#[test]
fn test_script_with_unmapped_field_is_not_marked_unmapped() {
    let body = json!({ "field": UNMAPPED_FIELD, "script": "1" }).to_string();
    let resolved = resolve_body(&body).unwrap();

    assert!(!resolved.source.unmapped);
    assert!(resolved.source.has_script());
    assert_eq!(resolved.source.field_context, None);
}

#[test]
fn test_script_lang_and_params_reach_compiler() {
    let resolved = resolve_body(&script_request("doc['a'].value", "expression")).unwrap();
    let script = resolved.source.script.unwrap();

    assert_eq!(script.lang.as_deref(), Some("expression"));
    assert_eq!(script.source, "doc['a'].value");
    assert_eq!(script.params.unwrap()["factor"], json!(2));
}

#[test]
fn test_precision_threshold_carried_through() {
    let resolved = resolve_body(r#"{"precision_threshold": 40000}"#).unwrap();
    assert_eq!(resolved.precision_threshold, 40000);

    let resolved = resolve_body(r#"{"precisionThreshold": 12}"#).unwrap();
    assert_eq!(resolved.precision_threshold, 12);

    // Not validated here: negative and fractional values pass through.
    let resolved = resolve_body(r#"{"precision_threshold": -7.9}"#).unwrap();
    assert_eq!(resolved.precision_threshold, -7);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_recognized_key_with_wrong_kind() {
    let err = resolve_body(r#"{"field": true}"#).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownKey {
            request: "distinct".to_string(),
            key: Some("field".to_string()),
            token: TokenKind::Boolean,
        }
    );
    assert_eq!(
        err.to_string(),
        "Unknown key for a VALUE_BOOLEAN in [distinct]: [field]."
    );
}

#[test]
fn test_unknown_key() {
    let err = resolve_body(r#"{"unknown_key": "x"}"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnknownKey { ref key, token: TokenKind::String, .. }
            if key.as_deref() == Some("unknown_key")
    ));
}

#[test]
fn test_rehash_as_string_is_unknown_key() {
    let err = resolve_body(r#"{"rehash": "false"}"#).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownKey { token: TokenKind::String, .. }));
}

#[test]
fn test_unknown_object_key() {
    let err = resolve_body(r#"{"settings": {"a": 1}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownKey { token: TokenKind::ObjectStart, .. }));
}

#[test]
fn test_precision_threshold_as_string_is_unknown_key() {
    let err = resolve_body(r#"{"precision_threshold": "100"}"#).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownKey { token: TokenKind::String, .. }));
}

#[test]
fn test_array_value_is_unexpected_token() {
    let err = resolve_body(r#"{"field": ["a", "b"]}"#).unwrap_err();
    assert_eq!(err.to_string(), "Unexpected token START_ARRAY in [distinct].");
}

#[test]
fn test_null_value_is_unexpected_token() {
    let err = resolve_body(r#"{"field": null}"#).unwrap_err();
    assert!(matches!(err, ConfigError::UnexpectedToken { token: TokenKind::Null, .. }));
}

#[test]
fn test_malformed_body_is_read_error() {
    let err = resolve_body(r#"{"field": "a""#).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert_eq!(err.request(), "distinct");
}

#[test]
fn test_non_object_body() {
    let err = resolve_body(r#""field""#).unwrap_err();
    assert!(matches!(err, ConfigError::UnexpectedToken { token: TokenKind::String, .. }));
}

#[test]
fn test_precision_threshold_beyond_i64_is_read_error() {
    let err = resolve_body(r#"{"precision_threshold": 18446744073709551615}"#).unwrap_err();
    match &err {
        ConfigError::Read { source, .. } => {
            assert!(source.message.contains("out of range of long"));
        }
        other => panic!("expected read error, got {other:?}"),
    }
    assert_eq!(err.request(), "distinct");

    let err = resolve_body(r#"{"precision_threshold": 1e30}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

fn nested_params(depth: usize) -> String {
    format!(
        r#"{{"script": "1", "params": {}1{}}}"#,
        r#"{"a": "#.repeat(depth),
        "}".repeat(depth)
    )
}

#[test]
fn test_deeply_nested_params_is_read_error() {
    let err = resolve_body(&nested_params(5_000)).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_unvalidated_depth_is_still_bounded() {
    let parser = CardinalityParser::new(ResolverConfig {
        max_params_depth: 1_000_000,
        ..ResolverConfig::default()
    });
    let err = parser
        .resolve_json(
            "distinct",
            &nested_params(200_000),
            &fixture_catalog(),
            &MockScriptCompiler::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_params_at_depth_limit_resolves() {
    let parser = CardinalityParser::new(ResolverConfig {
        max_params_depth: MAX_PARAMS_DEPTH_LIMIT,
        ..ResolverConfig::default()
    });
    let resolved = parser
        .resolve_json(
            "distinct",
            &nested_params(MAX_PARAMS_DEPTH_LIMIT - 1),
            &fixture_catalog(),
            &MockScriptCompiler::new(),
        )
        .unwrap();
    assert!(resolved.source.has_script());
}

#[test]
fn test_duplicate_key_strict_mode() {
    let parser = CardinalityParser::new(ResolverConfig {
        reject_duplicate_keys: true,
        ..ResolverConfig::default()
    });
    let err = parser
        .resolve_json(
            "distinct",
            r#"{"field": "a", "field": "b"}"#,
            &fixture_catalog(),
            &MockScriptCompiler::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateKey { .. }));
}

#[test]
fn test_duplicate_key_permissive_last_wins() {
    let resolved = resolve_body(&format!(
        r#"{{"field": "{}", "field": "{}"}}"#,
        KEYWORD_FIELD, NUMERIC_FIELD
    ))
    .unwrap();
    assert_eq!(resolved.source.field_name(), Some(NUMERIC_FIELD));
    assert!(resolved.source.is_numeric());
}

// ============================================================================
// COLLABORATORS
// ============================================================================

#[test]
fn test_script_compiled_before_field_lookup() {
    let (catalog, compiler, log) = mock_collaborators(fixture_catalog());
    let body = json!({ "field": NUMERIC_FIELD, "script": "_value", "lang": "painless" }).to_string();

    resolve_json("distinct", &body, &catalog, &compiler).unwrap();

    assert_eq!(
        log.calls(),
        vec![
            Call::Compile {
                lang: Some("painless".to_string()),
                source: "_value".to_string(),
            },
            Call::Lookup(NUMERIC_FIELD.to_string()),
        ]
    );
}

#[test]
fn test_no_field_no_lookup() {
    let (catalog, compiler, log) = mock_collaborators(fixture_catalog());
    resolve_json("distinct", r#"{"script": "1"}"#, &catalog, &compiler).unwrap();
    assert!(!log.calls().iter().any(|c| matches!(c, Call::Lookup(_))));
}

#[test]
fn test_script_failure_stops_before_lookup() {
    let log = CallLog::new();
    let catalog = fixture_catalog().with_log(log.clone());
    let compiler = MockScriptCompiler::new().rejecting("cobol").with_log(log.clone());
    let body = json!({ "field": NUMERIC_FIELD, "script": "x", "lang": "cobol" }).to_string();

    let err = resolve_json("distinct", &body, &catalog, &compiler).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::ScriptCompilation { source: ScriptError::UnsupportedLanguage { .. }, .. }
    ));
    assert_eq!(log.calls().len(), 1);
}

#[test]
fn test_catalog_failure_is_field_lookup_error() {
    let catalog = fixture_catalog().failing("shard closed");
    let err = resolve_json(
        "distinct",
        &field_request(NUMERIC_FIELD),
        &catalog,
        &MockScriptCompiler::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::FieldLookup { .. }));
    assert!(err.to_string().contains("shard closed"));
}

// ============================================================================
// STREAM ENTRY POINTS
// ============================================================================

#[test]
fn test_resolve_inside_object() {
    let mut stream = VecTokenStream::new(vec![
        Token::field("field"),
        Token::string(NUMERIC_FIELD),
        Token::ObjectEnd,
    ]);
    let resolved = resolve("distinct", &mut stream, &fixture_catalog(), &MockScriptCompiler::new())
        .unwrap();
    assert!(resolved.source.is_numeric());
}

#[test]
fn test_resolve_stops_at_object_end() {
    let mut lexer = JsonLexer::new(r#"{"inner": {"field": "price"}, "after": 1}"#);
    assert_eq!(lexer.next_token().unwrap(), Token::ObjectStart);
    assert_eq!(lexer.next_token().unwrap(), Token::field("inner"));
    assert_eq!(lexer.next_token().unwrap(), Token::ObjectStart);

    let resolved = resolve("inner", &mut lexer, &fixture_catalog(), &MockScriptCompiler::new())
        .unwrap();

    assert_eq!(resolved.name, "inner");
    assert_eq!(lexer.next_token().unwrap(), Token::field("after"));
}

#[test]
fn test_premature_end_of_stream() {
    let mut stream = VecTokenStream::new(vec![Token::field("field"), Token::string("a")]);
    let err = resolve("distinct", &mut stream, &fixture_catalog(), &MockScriptCompiler::new())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnexpectedToken { token: TokenKind::EndOfStream, .. }));
}
