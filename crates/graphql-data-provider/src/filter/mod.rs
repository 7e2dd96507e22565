//! Compiles the flat filter record of a list request into the backend's filter expression.
//!
//! Filter keys are a field name optionally followed by an operator token, separated by a space:
//! `{"name": "ann", "age >=": 18, "tags contains": "a,b"}`. How a value is sent depends on the
//! operator table registered for the field's type, see [`FilterRegistry`].

mod full_text;
mod registry;
mod transform;

pub use full_text::prefix_terms;
pub use registry::{FilterCategory, FilterOperator, FilterRegistry, OperatorTable, DEFAULT_OPERATOR};
pub use transform::ValueTransform;

pub(crate) use transform::{to_js_string, to_number};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::{
    introspection::{IntrospectionType, TypeKind},
    naming::{sorting_key, SortOrder},
    Error, Result,
};

/// Raw filter values keyed by `"<field> [operator]"`, in request order.
pub type FilterFields = IndexMap<String, Value>;

/// The `filter` and the filter-derived part of the `orderBy` variables of a list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    /// `{"and": [{<field>: {<operator>: <value>}}]}`, `None` if no key matched a field.
    pub filters: Option<Value>,
    /// Ordering hints contributed by the filtered fields, e.g. full text ranks.
    pub order_by: Vec<String>,
}

/// Builds the filter expression for the fields of `ty`.
///
/// Keys not naming a field of the type are skipped. Several keys on the same field merge into a
/// single object, later operators overwriting earlier ones.
pub fn compile_filter(
    fields: &FilterFields,
    ty: &IntrospectionType,
    registry: &FilterRegistry,
) -> Result<CompiledFilter> {
    let mut merged: IndexMap<&str, Map<String, Value>> = IndexMap::new();
    let mut order_by = Vec::new();

    for (key, value) in fields {
        let mut tokens = key.split(' ');
        let name = tokens.next().unwrap_or_default();
        let operations: Vec<&str> = tokens.collect();

        let Some(field) = ty.fields().iter().find(|field| field.name() == name) else {
            tracing::trace!("skipping filter `{key}`, `{name}` is not a field of `{}`", ty.name());
            continue;
        };

        let Some(named) = field.named_type() else {
            tracing::trace!("skipping filter `{key}`, the type of `{name}` has no name");
            continue;
        };

        let type_name = if named.is_list {
            format!("{}List", named.name())
        } else {
            named.name().to_owned()
        };

        let (fragment, category) = map_filter(&type_name, named.kind(), value, &operations, registry)?;

        if category == FilterCategory::FullText {
            order_by.push(sorting_key(&format!("{name}Rank"), SortOrder::Desc));
        }

        merged.entry(field.name()).or_default().extend(fragment);
    }

    if merged.is_empty() {
        return Ok(CompiledFilter::default());
    }

    let merged: Map<String, Value> = merged
        .into_iter()
        .map(|(name, fragment)| (name.to_owned(), Value::Object(fragment)))
        .collect();

    Ok(CompiledFilter {
        filters: Some(json!({ "and": [merged] })),
        order_by,
    })
}

/// Maps a single filter value to `{<backend operator>: <transformed value>}`.
///
/// The operator table is looked up by `type_name`, then by `kind`, using their `Array` variants
/// when the value is a list. The first of `operations` selects the operator, `default` if empty.
pub fn map_filter_type(
    type_name: &str,
    kind: Option<&TypeKind>,
    value: &Value,
    operations: &[&str],
    registry: &FilterRegistry,
) -> Result<Map<String, Value>> {
    map_filter(type_name, kind, value, operations, registry).map(|(fragment, _)| fragment)
}

fn map_filter(
    type_name: &str,
    kind: Option<&TypeKind>,
    value: &Value,
    operations: &[&str],
    registry: &FilterRegistry,
) -> Result<(Map<String, Value>, FilterCategory)> {
    let kind = kind.map(TypeKind::as_str);

    let Some((table_name, table)) = registry.resolve(type_name, kind, value.is_array()) else {
        return Err(Error::FilterTypeNotImplemented {
            name: type_name.to_owned(),
            kind: kind.unwrap_or("none").to_owned(),
        });
    };

    let operation = operations.first().copied().unwrap_or(DEFAULT_OPERATOR);

    let Some(operator) = table.get(operation) else {
        return Err(Error::FilterOperationNotImplemented {
            operation: operation.to_owned(),
            type_name: table_name,
        });
    };

    let mut fragment = Map::new();
    fragment.insert(operator.operator.clone(), operator.transform.apply(value)?);

    Ok((fragment, table.category()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn map(type_name: &str, kind: Option<TypeKind>, value: Value, operations: &[&str]) -> Result<Value> {
        map_filter_type(type_name, kind.as_ref(), &value, operations, &FilterRegistry::default()).map(Value::Object)
    }

    #[rstest]
    #[case::int(json!(2), json!({ "equalTo": 2 }))]
    #[case::int_as_string(json!("42"), json!({ "equalTo": 42 }))]
    #[case::int_array(json!([2, 3]), json!({ "in": [2, 3] }))]
    #[case::int_array_with_string(json!([2, 3, "42"]), json!({ "in": [2, 3, 42] }))]
    fn int_values(#[case] value: Value, #[case] expected: Value) {
        assert_eq!(map("Int", None, value, &[]).unwrap(), expected);
    }

    #[rstest]
    #[case::string_default("String", &[], json!("str"), json!({ "likeInsensitive": "%str%" }))]
    #[case::string_eq("String", &["="], json!("str"), json!({ "equalTo": "str" }))]
    #[case::string_ne("String", &["!="], json!("str"), json!({ "notEqualTo": "str" }))]
    #[case::string_like("String", &["likeInsensitive"], json!("str"), json!({ "likeInsensitive": "%str%" }))]
    #[case::string_null("String", &["null"], json!(null), json!({ "isNull": true }))]
    #[case::string_not_null("String", &["!null"], json!(null), json!({ "isNull": false }))]
    #[case::boolean_default("Boolean", &[], json!(true), json!({ "equalTo": true }))]
    #[case::boolean_eq("Boolean", &["="], json!(false), json!({ "equalTo": false }))]
    #[case::boolean_ne("Boolean", &["!="], json!(true), json!({ "notEqualTo": true }))]
    #[case::int_default("Int", &[], json!(1), json!({ "equalTo": 1 }))]
    #[case::int_eq("Int", &["="], json!(1), json!({ "equalTo": 1 }))]
    #[case::int_ne("Int", &["!="], json!(1), json!({ "notEqualTo": 1 }))]
    #[case::int_lt("Int", &["<"], json!(1), json!({ "lessThan": 1 }))]
    #[case::int_le("Int", &["<="], json!(1), json!({ "lessThanOrEqualTo": 1 }))]
    #[case::int_gt("Int", &[">"], json!(1), json!({ "greaterThan": 1 }))]
    #[case::int_ge("Int", &[">="], json!(1), json!({ "greaterThanOrEqualTo": 1 }))]
    #[case::int_null("Int", &["null"], json!(1), json!({ "isNull": true }))]
    #[case::int_not_null("Int", &["!null"], json!(1), json!({ "isNull": false }))]
    #[case::int_array_default("Int", &[], json!([1, 2]), json!({ "in": [1, 2] }))]
    #[case::int_array_in("Int", &["in"], json!([1, 2]), json!({ "in": [1, 2] }))]
    #[case::int_array_not_in("Int", &["!in"], json!([1, 2]), json!({ "notIn": [1, 2] }))]
    #[case::int_array_eq("Int", &["="], json!([1, 2]), json!({ "in": [1, 2] }))]
    #[case::int_array_ne("Int", &["!="], json!([1, 2]), json!({ "notIn": [1, 2] }))]
    #[case::int_list_default("IntList", &[], json!(1), json!({ "anyEqualTo": 1 }))]
    #[case::int_list_eq("IntList", &["="], json!(1), json!({ "anyEqualTo": 1 }))]
    #[case::int_list_ne("IntList", &["!="], json!(1), json!({ "anyNotEqualTo": 1 }))]
    #[case::int_list_any_eq("IntList", &["anyEqualTo"], json!(1), json!({ "anyEqualTo": 1 }))]
    #[case::int_list_any_ne("IntList", &["anyNotEqualTo"], json!(1), json!({ "anyNotEqualTo": 1 }))]
    #[case::int_list_array_default("IntList", &[], json!([1]), json!({ "overlaps": [1] }))]
    #[case::int_list_array_eq("IntList", &["="], json!([1]), json!({ "equalTo": [1] }))]
    #[case::int_list_array_ne("IntList", &["!="], json!([1]), json!({ "notEqualTo": [1] }))]
    #[case::int_list_array_overlaps("IntList", &["overlaps"], json!([1]), json!({ "overlaps": [1] }))]
    #[case::int_list_array_contains("IntList", &["contains"], json!([1]), json!({ "contains": [1] }))]
    #[case::int_list_array_contained_by("IntList", &["containedBy"], json!([1]), json!({ "containedBy": [1] }))]
    #[case::int_list_array_distinct("IntList", &["distinctFrom"], json!([1]), json!({ "distinctFrom": [1] }))]
    #[case::int_list_array_not_distinct("IntList", &["notDistinctFrom"], json!([1]), json!({ "notDistinctFrom": [1] }))]
    #[case::big_int("BigInt", &[">"], json!("9"), json!({ "greaterThan": 9 }))]
    #[case::float("Float", &["<"], json!("1.5"), json!({ "lessThan": 1.5 }))]
    #[case::string_list("StringList", &["contains"], json!("a, b"), json!({ "contains": ["a", "b"] }))]
    #[case::datetime(
        "Datetime",
        &[">="],
        json!("2024-01-01"),
        json!({ "greaterThanOrEqualTo": "2024-01-01T00:00:00.000Z" })
    )]
    #[case::full_text_eq("FullText", &["="], json!("wor"), json!({ "matches": "wor" }))]
    #[case::full_text_default("FullText", &[], json!("wor"), json!({ "matches": "wor*" }))]
    fn operator_tables(
        #[case] type_name: &str,
        #[case] operations: &[&str],
        #[case] value: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(map(type_name, None, value, operations).unwrap(), expected);
    }

    #[rstest]
    #[case::enum_default(&[], json!("V"), json!({ "equalTo": "V" }))]
    #[case::enum_eq(&["="], json!("V"), json!({ "equalTo": "V" }))]
    #[case::enum_ne(&["!="], json!("V"), json!({ "notEqualTo": "V" }))]
    #[case::enum_null(&["null"], json!("V"), json!({ "isNull": true }))]
    #[case::enum_not_null(&["!null"], json!("V"), json!({ "isNull": false }))]
    #[case::enum_array_default(&[], json!(["V", "V2"]), json!({ "in": ["V", "V2"] }))]
    #[case::enum_array_eq(&["="], json!(["V", "V2"]), json!({ "in": ["V", "V2"] }))]
    #[case::enum_array_ne(&["!="], json!(["V", "V2"]), json!({ "notIn": ["V", "V2"] }))]
    #[case::enum_array_in(&["in"], json!(["V", "V2"]), json!({ "in": ["V", "V2"] }))]
    #[case::enum_array_not_in(&["!in"], json!(["V", "V2"]), json!({ "notIn": ["V", "V2"] }))]
    fn enums_resolve_by_kind(#[case] operations: &[&str], #[case] value: Value, #[case] expected: Value) {
        assert_eq!(map("ContractType", Some(TypeKind::Enum), value, operations).unwrap(), expected);
    }

    #[test]
    fn unknown_type_names_both_name_and_kind() {
        let error = map("Unknown", Some(TypeKind::Other("Kind".into())), json!("value"), &[]).unwrap_err();
        insta::assert_snapshot!(error, @r###"Filter for type "Unknown" or kind "Kind" not implemented."###);
    }

    #[test]
    fn unknown_operation() {
        let error = map("Boolean", None, json!(true), &["<"]).unwrap_err();
        insta::assert_snapshot!(error, @r###"Operation "<" for type "Boolean" not implemented."###);
    }

    fn filter_type() -> IntrospectionType {
        serde_json::from_value(json!({
            "name": "Filtered",
            "fields": [
                { "name": "i", "type": { "name": "Int" } },
                { "name": "ia", "type": { "name": "Int" } },
                { "name": "intList", "type": { "kind": "LIST", "ofType": { "kind": "SCALAR", "name": "Int" } } },
                { "name": "intList2", "type": { "kind": "LIST", "ofType": { "kind": "SCALAR", "name": "Int" } } },
                { "name": "s", "type": { "name": "String" } },
                { "name": "s2", "type": { "ofType": { "name": "String" } } },
                { "name": "ft1", "type": { "name": "FullText" } },
                { "name": "ft2", "type": { "kind": "NON_NULL", "ofType": { "kind": "SCALAR", "name": "FullText" } } }
            ]
        }))
        .unwrap()
    }

    fn fields(value: Value) -> FilterFields {
        serde_json::from_value(value).unwrap()
    }

    fn compile(value: Value) -> CompiledFilter {
        compile_filter(&fields(value), &filter_type(), &FilterRegistry::default()).unwrap()
    }

    #[test]
    fn nothing_to_filter() {
        assert_eq!(compile(json!({})), CompiledFilter::default());
        assert_eq!(compile(json!({ "unknown": "value" })), CompiledFilter::default());
    }

    #[test]
    fn postgraphile_filter_expression() {
        let compiled = compile(json!({
            "i !=": 1,
            "ia": [1, 2],
            "intList": 3,
            "intList2": [3, 4],
            "s null": null,
            "s2": "s2",
        }));

        let expected = json!({
            "and": [{
                "i": { "notEqualTo": 1 },
                "ia": { "in": [1, 2] },
                "intList": { "anyEqualTo": 3 },
                "intList2": { "overlaps": [3, 4] },
                "s": { "isNull": true },
                "s2": { "likeInsensitive": "%s2%" },
            }]
        });

        assert_eq!(compiled.filters, Some(expected));
        assert!(compiled.order_by.is_empty());
    }

    #[test]
    fn keys_on_the_same_field_merge() {
        let compiled = compile(json!({ "i": 1, "i !in": [2, 3] }));

        assert_eq!(
            compiled.filters,
            Some(json!({ "and": [{ "i": { "equalTo": 1, "notIn": [2, 3] } }] }))
        );
    }

    #[test]
    fn full_text_adds_rank_ordering() {
        let compiled = compile(json!({ "ft1": "work" }));

        assert_eq!(compiled.filters, Some(json!({ "and": [{ "ft1": { "matches": "work*" } }] })));
        assert_eq!(compiled.order_by, ["FT1_RANK_DESC"]);

        let compiled = compile(json!({ "ft2": "two", "ft1": "one" }));
        assert_eq!(compiled.order_by, ["FT2_RANK_DESC", "FT1_RANK_DESC"]);
    }

    #[test]
    fn registries_can_be_substituted() {
        let registry = FilterRegistry::default().with_table(
            "Int",
            OperatorTable::new(FilterCategory::Scalar).with(
                "special",
                "isTheAnswer",
                ValueTransform::custom(|_| json!(42)),
            ),
        );

        let compiled = compile_filter(&fields(json!({ "i special": 1 })), &filter_type(), &registry).unwrap();

        assert_eq!(
            compiled.filters,
            Some(json!({ "and": [{ "i": { "isTheAnswer": 42 } }] }))
        );
    }

    #[test]
    fn configuration_errors_propagate() {
        let result = compile_filter(&fields(json!({ "i <>": 1 })), &filter_type(), &FilterRegistry::default());
        assert!(matches!(result, Err(Error::FilterOperationNotImplemented { .. })));
    }
}
