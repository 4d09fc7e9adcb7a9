//! Fuzz test for full request resolution
//!
//! Arbitrary request bodies must either resolve or fail with a typed error
//! naming the request; resolving never panics.
//!
//! Run with: cargo +nightly fuzz run resolve_fuzz -- -max_total_time=60

#![no_main]

use cardinal_core::{
    FieldKind, FieldMapping, IndexedDataHandle, ScriptCompiler, ScriptError, ScriptParams,
};
use cardinal_dsl::resolve_json;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

struct LengthCompiler;

impl ScriptCompiler for LengthCompiler {
    type Script = usize;

    fn compile(
        &self,
        _lang: Option<&str>,
        source: &str,
        _params: Option<&ScriptParams>,
    ) -> Result<usize, ScriptError> {
        Ok(source.len())
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let catalog = HashMap::from([
            ("n".to_string(), FieldMapping::new(FieldKind::Numeric, IndexedDataHandle(1))),
            ("h".to_string(), FieldMapping::new(FieldKind::PreHashed, IndexedDataHandle(2))),
        ]);

        match resolve_json("fuzz", input, &catalog, &LengthCompiler) {
            Ok(resolved) => {
                if resolved.source.has_script() {
                    assert!(!resolved.source.is_numeric(), "Script sources are never numeric");
                }
                if resolved.source.is_unmapped() {
                    assert!(resolved.source.field_context.is_none());
                }
            }
            Err(err) => assert_eq!(err.request(), "fuzz"),
        }
    }
});
