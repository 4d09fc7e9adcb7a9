//! Resolved aggregation configuration handed to the metric engine

use crate::{FieldContext, SourceKind};
use serde::Serialize;

/// Where the metric reads its values from.
///
/// A request naming both a script and a mapped field gets both attached;
/// the script then reads that field's values. Neither being set is valid:
/// the field was unmapped, or the request named no source at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuesSourceConfig<S> {
    pub kind: SourceKind,
    pub field_context: Option<FieldContext>,
    pub script: Option<S>,
    pub unmapped: bool,
}

impl<S> ValuesSourceConfig<S> {
    /// A bytes source with nothing attached.
    pub fn bytes() -> Self {
        Self::of_kind(SourceKind::Bytes)
    }

    pub fn of_kind(kind: SourceKind) -> Self {
        Self {
            kind,
            field_context: None,
            script: None,
            unmapped: false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == SourceKind::Numeric
    }

    pub fn is_unmapped(&self) -> bool {
        self.unmapped
    }

    pub fn has_script(&self) -> bool {
        self.script.is_some()
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_context.as_ref().map(|ctx| ctx.field.as_str())
    }
}

/// Fully resolved cardinality request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig<S> {
    /// Name of the aggregation this request belongs to
    pub name: String,
    pub source: ValuesSourceConfig<S>,
    /// Passed through unvalidated; -1 means "engine default"
    pub precision_threshold: i64,
    pub rehash: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexedDataHandle;

    #[test]
    fn test_bytes_source_is_empty() {
        let source: ValuesSourceConfig<()> = ValuesSourceConfig::bytes();
        assert!(!source.is_numeric());
        assert!(!source.is_unmapped());
        assert!(!source.has_script());
        assert_eq!(source.field_name(), None);
    }

    #[test]
    fn test_field_name_accessor() {
        let mut source: ValuesSourceConfig<()> = ValuesSourceConfig::of_kind(SourceKind::Numeric);
        source.field_context = Some(FieldContext {
            field: "price".to_string(),
            indexed_data: IndexedDataHandle(1),
        });
        assert!(source.is_numeric());
        assert_eq!(source.field_name(), Some("price"));
    }
}
