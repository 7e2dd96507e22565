//! The subset of a GraphQL introspection result the query builders work with.
//!
//! Introspection payloads are taken as they come out of the schema-fetching collaborator, so every
//! attribute is optional: fixtures and hand-written schemas routinely leave out `kind` or `ofType`.

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// The introspection result as delivered by the schema collaborator: all named types plus the
/// root fields (queries and mutations) of the schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntrospectionResult {
    pub types: Vec<IntrospectionType>,
    pub queries: Vec<IntrospectionType>,
}

/// A node of the introspected schema graph.
///
/// The same shape describes named types, fields, input fields, arguments and the anonymous
/// `LIST`/`NON_NULL` wrappers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<IntrospectionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_fields: Option<Vec<IntrospectionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<IntrospectionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_type: Option<Box<IntrospectionType>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Box<IntrospectionType>>,
}

/// The named type found at the end of a field's `type`/`ofType` chain.
#[derive(Debug, Clone, Copy)]
pub struct NamedType<'a> {
    pub ty: &'a IntrospectionType,
    /// A `LIST` wrapper was crossed on the way down.
    pub is_list: bool,
}

impl<'a> NamedType<'a> {
    pub fn name(&self) -> &'a str {
        self.ty.name()
    }

    pub fn kind(&self) -> Option<&'a TypeKind> {
        self.ty.kind.as_ref()
    }
}

impl IntrospectionType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The name, or an empty string for anonymous wrapper types.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn kind_name(&self) -> &str {
        self.kind.as_ref().map(TypeKind::as_str).unwrap_or_default()
    }

    pub fn fields(&self) -> &[IntrospectionType] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn args(&self) -> &[IntrospectionType] {
        self.args.as_deref().unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&IntrospectionType> {
        self.fields().iter().find(|field| field.name() == name)
    }

    /// Resolves the declared type of a field, argument or input field.
    ///
    /// Walks `type` and then the `ofType` chain until a type carrying a name is found, remembering
    /// whether a `LIST` wrapper was crossed. Returns `None` when the chain ends without a name.
    pub fn named_type(&self) -> Option<NamedType<'_>> {
        let mut current = self.ty.as_deref()?;
        let mut is_list = false;

        loop {
            if current.kind == Some(TypeKind::List) {
                is_list = true;
            }

            if current.name.is_some() {
                return Some(NamedType { ty: current, is_list });
            }

            current = current.of_type.as_deref()?;
        }
    }
}

/// The `__TypeKind` of an introspected type.
///
/// Unknown kinds are kept verbatim so that error messages can name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    Other(String),
}

impl TypeKind {
    pub fn as_str(&self) -> &str {
        match self {
            TypeKind::Scalar => "SCALAR",
            TypeKind::Object => "OBJECT",
            TypeKind::Interface => "INTERFACE",
            TypeKind::Union => "UNION",
            TypeKind::Enum => "ENUM",
            TypeKind::InputObject => "INPUT_OBJECT",
            TypeKind::List => "LIST",
            TypeKind::NonNull => "NON_NULL",
            TypeKind::Other(kind) => kind,
        }
    }

    /// Object-like kinds need a sub-selection when queried.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SCALAR" => TypeKind::Scalar,
            "OBJECT" => TypeKind::Object,
            "INTERFACE" => TypeKind::Interface,
            "UNION" => TypeKind::Union,
            "ENUM" => TypeKind::Enum,
            "INPUT_OBJECT" => TypeKind::InputObject,
            "LIST" => TypeKind::List,
            "NON_NULL" => TypeKind::NonNull,
            other => TypeKind::Other(other.to_owned()),
        })
    }
}

impl Serialize for TypeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TypeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> IntrospectionType {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        assert_eq!(TypeKind::from_str("NON_NULL"), Ok(TypeKind::NonNull));
        assert_eq!(TypeKind::from_str("Kind"), Ok(TypeKind::Other("Kind".into())));
        assert_eq!(TypeKind::Other("Kind".into()).to_string(), "Kind");
    }

    #[test]
    fn named_type_of_a_plain_field() {
        let field = parse(json!({ "name": "i", "type": { "name": "Int" } }));
        let named = field.named_type().unwrap();

        assert_eq!(named.name(), "Int");
        assert!(!named.is_list);
        assert_eq!(named.kind(), None);
    }

    #[test]
    fn named_type_unwraps_non_null_list_non_null() {
        let field = parse(json!({
            "name": "tags",
            "type": {
                "kind": "NON_NULL",
                "ofType": {
                    "kind": "LIST",
                    "ofType": { "kind": "NON_NULL", "ofType": { "kind": "SCALAR", "name": "String" } }
                }
            }
        }));
        let named = field.named_type().unwrap();

        assert_eq!(named.name(), "String");
        assert_eq!(named.kind(), Some(&TypeKind::Scalar));
        assert!(named.is_list);
    }

    #[test]
    fn named_type_borrows_from_the_field() {
        let field = parse(json!({ "name": "id", "type": { "kind": "SCALAR", "name": "UUID" } }));

        let name = field.named_type().map_or("ID", |named| named.name());
        let kind = field.named_type().and_then(|named| named.kind());

        assert_eq!(name, "UUID");
        assert_eq!(kind, Some(&TypeKind::Scalar));
    }

    #[test]
    fn named_type_without_any_name() {
        let field = parse(json!({ "name": "broken", "type": { "kind": "LIST" } }));
        assert!(field.named_type().is_none());

        let field = parse(json!({ "name": "untyped" }));
        assert!(field.named_type().is_none());
    }
}
