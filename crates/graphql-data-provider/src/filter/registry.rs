use indexmap::IndexMap;
use serde_json::Value;

use super::ValueTransform;

/// The operator token used when a filter key names no operator.
pub const DEFAULT_OPERATOR: &str = "default";

/// What kind of values an operator table filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FilterCategory {
    Scalar,
    /// A scalar column filtered with a list of values.
    ScalarArray,
    /// A list column filtered with a single value.
    List,
    /// A list column filtered with a list of values.
    ListArray,
    Enum,
    EnumArray,
    /// Full text columns, also contributing the rank ordering of the list query.
    FullText,
}

impl FilterCategory {
    /// Derives the category from a table name following the built-in naming scheme.
    pub fn from_table_name(name: &str) -> Self {
        match name {
            "FullText" => FilterCategory::FullText,
            "ENUM" => FilterCategory::Enum,
            "ENUMArray" => FilterCategory::EnumArray,
            name if name.ends_with("ListArray") => FilterCategory::ListArray,
            name if name.ends_with("List") => FilterCategory::List,
            name if name.ends_with("Array") => FilterCategory::ScalarArray,
            _ => FilterCategory::Scalar,
        }
    }
}

/// A backend operator together with the transform applied to the filter value.
#[derive(Debug, Clone)]
pub struct FilterOperator {
    pub operator: String,
    pub transform: ValueTransform,
}

impl FilterOperator {
    pub fn new(operator: impl Into<String>, transform: ValueTransform) -> Self {
        Self {
            operator: operator.into(),
            transform,
        }
    }
}

/// The operators available for one backend type or kind, keyed by the operator token used in
/// filter keys (`=`, `!in`, `default`...).
#[derive(Debug, Clone)]
pub struct OperatorTable {
    category: FilterCategory,
    operators: IndexMap<String, FilterOperator>,
}

impl OperatorTable {
    pub fn new(category: FilterCategory) -> Self {
        Self {
            category,
            operators: IndexMap::new(),
        }
    }

    pub fn with(mut self, token: &str, operator: &str, transform: ValueTransform) -> Self {
        self.insert(token, FilterOperator::new(operator, transform));
        self
    }

    pub fn insert(&mut self, token: impl Into<String>, operator: FilterOperator) {
        self.operators.insert(token.into(), operator);
    }

    pub fn get(&self, token: &str) -> Option<&FilterOperator> {
        self.operators.get(token)
    }

    pub fn category(&self) -> FilterCategory {
        self.category
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.operators.keys().map(String::as_str)
    }

    /// Adds the operators of `other`, replacing the ones with the same token.
    pub fn merge(&mut self, other: OperatorTable) {
        self.operators.extend(other.operators);
    }
}

/// All operator tables, keyed by backend type name (`Int`), kind (`ENUM`) or their `Array`
/// variants used for list values.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    tables: IndexMap<String, OperatorTable>,
}

impl FilterRegistry {
    pub fn empty() -> Self {
        Self { tables: IndexMap::new() }
    }

    /// Adds a table, replacing any table registered under the same name.
    pub fn with_table(mut self, name: impl Into<String>, table: OperatorTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Merges the tables of `other` into this registry operator by operator. Tables unknown so far
    /// are added as they are.
    pub fn merge(mut self, other: FilterRegistry) -> Self {
        for (name, table) in other.tables {
            match self.tables.get_mut(&name) {
                Some(existing) => existing.merge(table),
                None => {
                    self.tables.insert(name, table);
                }
            }
        }

        self
    }

    pub fn get(&self, name: &str) -> Option<&OperatorTable> {
        self.tables.get(name)
    }

    /// Finds the table for a type: by type name first, then by kind. List values look for the
    /// `Array` variants of both.
    pub fn resolve(&self, type_name: &str, kind: Option<&str>, is_array: bool) -> Option<(String, &OperatorTable)> {
        let suffix = if is_array { "Array" } else { "" };

        std::iter::once(type_name)
            .chain(kind)
            .map(|name| format!("{name}{suffix}"))
            .find_map(|name| self.tables.get(&name).map(|table| (name, table)))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        use FilterCategory::*;
        use ValueTransform::{Contains, FullTextPrefix, Identity, IsoDateTime, Number, NumberList, StringList};

        let is_null = || ValueTransform::Constant(Value::Bool(true));
        let is_not_null = || ValueTransform::Constant(Value::Bool(false));

        let string = OperatorTable::new(Scalar)
            .with("=", "equalTo", Identity)
            .with("!=", "notEqualTo", Identity)
            .with("null", "isNull", is_null())
            .with("!null", "isNull", is_not_null())
            .with("likeInsensitive", "likeInsensitive", Contains)
            .with(DEFAULT_OPERATOR, "likeInsensitive", Contains);

        let string_list = OperatorTable::new(List)
            .with("=", "equalTo", StringList)
            .with("contains", "contains", StringList)
            .with("containedBy", "containedBy", StringList)
            .with(DEFAULT_OPERATOR, "equalTo", StringList);

        let boolean = OperatorTable::new(Scalar)
            .with("=", "equalTo", Identity)
            .with("!=", "notEqualTo", Identity)
            .with(DEFAULT_OPERATOR, "equalTo", Identity);

        let comparable = |transform: ValueTransform| {
            OperatorTable::new(Scalar)
                .with("=", "equalTo", transform.clone())
                .with("!=", "notEqualTo", transform.clone())
                .with("<", "lessThan", transform.clone())
                .with("<=", "lessThanOrEqualTo", transform.clone())
                .with(">", "greaterThan", transform.clone())
                .with(">=", "greaterThanOrEqualTo", transform.clone())
                .with("null", "isNull", is_null())
                .with("!null", "isNull", is_not_null())
        };

        let int = comparable(Number)
            .with("in", "in", NumberList)
            .with("!in", "notIn", NumberList)
            .with(DEFAULT_OPERATOR, "equalTo", Number);

        let int_array = OperatorTable::new(ScalarArray)
            .with("=", "in", NumberList)
            .with("!=", "notIn", NumberList)
            .with("in", "in", NumberList)
            .with("!in", "notIn", NumberList)
            .with(DEFAULT_OPERATOR, "in", NumberList);

        let int_list = OperatorTable::new(List)
            .with("=", "anyEqualTo", Number)
            .with("!=", "anyNotEqualTo", Number)
            .with("anyEqualTo", "anyEqualTo", Number)
            .with("anyNotEqualTo", "anyNotEqualTo", Number)
            .with(DEFAULT_OPERATOR, "anyEqualTo", Number);

        let int_list_array = OperatorTable::new(ListArray)
            .with("=", "equalTo", NumberList)
            .with("!=", "notEqualTo", NumberList)
            .with("overlaps", "overlaps", NumberList)
            .with("contains", "contains", NumberList)
            .with("containedBy", "containedBy", NumberList)
            .with("distinctFrom", "distinctFrom", NumberList)
            .with("notDistinctFrom", "notDistinctFrom", NumberList)
            .with(DEFAULT_OPERATOR, "overlaps", NumberList);

        let enumeration = OperatorTable::new(Enum)
            .with("=", "equalTo", Identity)
            .with("!=", "notEqualTo", Identity)
            .with("null", "isNull", is_null())
            .with("!null", "isNull", is_not_null())
            .with(DEFAULT_OPERATOR, "equalTo", Identity);

        let enumeration_array = OperatorTable::new(EnumArray)
            .with("=", "in", Identity)
            .with("!=", "notIn", Identity)
            .with("in", "in", Identity)
            .with("!in", "notIn", Identity)
            .with(DEFAULT_OPERATOR, "in", Identity);

        let datetime = comparable(IsoDateTime).with(DEFAULT_OPERATOR, "equalTo", IsoDateTime);

        let full_text = OperatorTable::new(FullText)
            .with("=", "matches", Identity)
            .with(DEFAULT_OPERATOR, "matches", FullTextPrefix);

        Self::empty()
            .with_table("String", string)
            .with_table("StringList", string_list)
            .with_table("Boolean", boolean)
            .with_table("Int", int.clone())
            .with_table("BigInt", int.clone())
            .with_table("Float", int)
            .with_table("IntArray", int_array.clone())
            .with_table("BigIntArray", int_array.clone())
            .with_table("FloatArray", int_array)
            .with_table("IntList", int_list)
            .with_table("IntListArray", int_list_array)
            .with_table("ENUM", enumeration)
            .with_table("ENUMArray", enumeration_array)
            .with_table("Datetime", datetime)
            .with_table("FullText", full_text)
    }
}
