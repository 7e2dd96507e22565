use std::collections::HashMap;

use crate::introspection::{IntrospectionResult, IntrospectionType};

/// Name-keyed lookup over a flat list of introspected types or root fields.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    types: HashMap<String, IntrospectionType>,
}

impl TypeIndex {
    /// Indexes the given types by name. On duplicate names the last one wins, anonymous entries
    /// cannot be looked up and are left out.
    pub fn build(types: impl IntoIterator<Item = IntrospectionType>) -> Self {
        let types = types
            .into_iter()
            .filter_map(|ty| Some((ty.name.clone()?, ty)))
            .collect();

        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&IntrospectionType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<IntrospectionType> for TypeIndex {
    fn from_iter<T: IntoIterator<Item = IntrospectionType>>(iter: T) -> Self {
        Self::build(iter)
    }
}

/// Both lookups needed by the resources: the named types and the root fields.
#[derive(Debug, Clone, Default)]
pub struct Introspection {
    pub types: TypeIndex,
    pub queries: TypeIndex,
}

impl From<IntrospectionResult> for Introspection {
    fn from(result: IntrospectionResult) -> Self {
        Self {
            types: TypeIndex::build(result.types),
            queries: TypeIndex::build(result.queries),
        }
    }
}
