use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value};

use crate::{filter::to_number, introspection::IntrospectionType};

/// Rewrites a record value before it is sent as input, e.g. turning a queried object into the
/// shape of its input type.
pub type ValueMapper = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Value mappers keyed by the name of the field type they apply to.
pub type ValueMappers = HashMap<String, ValueMapper>;

/// Coerces ids to the scalar type of the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdConverter {
    Number,
    Identity,
}

impl IdConverter {
    pub fn for_type(type_name: &str) -> Self {
        match type_name {
            "Int" => IdConverter::Number,
            _ => IdConverter::Identity,
        }
    }

    pub fn convert(&self, id: &Value) -> Value {
        match self {
            IdConverter::Number => to_number(id),
            IdConverter::Identity => id.clone(),
        }
    }
}

/// Whether JavaScript would consider the value true, used to drop empty ids.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builds the input variables of `input_type` from a record.
///
/// Only the declared input fields are taken over. Values of fields whose type on `resource_type`
/// has a mapper go through it, element by element for list fields. `__typename` keys are removed
/// from nested objects so queried records can be sent back. Returns `None` if `input_type` is not
/// an input object.
pub fn record_to_variables(
    record: &Map<String, Value>,
    input_type: &IntrospectionType,
    resource_type: &IntrospectionType,
    mappers: &ValueMappers,
) -> Option<Map<String, Value>> {
    let input_fields = input_type.input_fields.as_deref()?;

    let variables = input_fields
        .iter()
        .filter_map(|input_field| {
            let name = input_field.name();
            let value = strip_typename(record.get(name)?.clone());

            let mapped = resource_type
                .field(name)
                .and_then(IntrospectionType::named_type)
                .and_then(|named| Some((mappers.get(named.name())?, named.is_list)));

            let value = match (mapped, value) {
                (Some((mapper, true)), Value::Array(values)) => {
                    Value::Array(values.into_iter().map(|value| mapper(value)).collect())
                }
                (Some((_, true)), Value::Null) => Value::Null,
                (Some((mapper, _)), value) => mapper(value),
                (None, value) => value,
            };

            Some((name.to_owned(), value))
        })
        .collect();

    Some(variables)
}

fn strip_typename(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(key, _)| key != "__typename")
                .map(|(key, value)| (key, strip_typename(value)))
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.into_iter().map(strip_typename).collect()),
        value => value,
    }
}
