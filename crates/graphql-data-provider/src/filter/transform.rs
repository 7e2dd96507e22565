use std::{fmt, sync::Arc};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::{Error, Result};

use super::full_text;

/// Turns the raw filter value into the value sent to the backend operator.
#[derive(Clone, Default)]
pub enum ValueTransform {
    #[default]
    Identity,
    /// Coerces a single value to a number.
    Number,
    /// Coerces every element of a list to a number.
    NumberList,
    /// Ignores the value, e.g. `isNull: true`.
    Constant(Value),
    /// Wraps the value into `%value%` for `like` operators.
    Contains,
    /// Splits a comma separated string into a list of trimmed, non-empty strings.
    StringList,
    /// Formats a date or timestamp as an ISO-8601 UTC datetime with milliseconds.
    IsoDateTime,
    /// Marks the terms of a full text query for prefix matching.
    FullTextPrefix,
    Custom(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl ValueTransform {
    pub fn custom(transform: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        ValueTransform::Custom(Arc::new(transform))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueTransform::Identity => "identity",
            ValueTransform::Number => "number",
            ValueTransform::NumberList => "number_list",
            ValueTransform::Constant(_) => "constant",
            ValueTransform::Contains => "contains",
            ValueTransform::StringList => "string_list",
            ValueTransform::IsoDateTime => "iso_date_time",
            ValueTransform::FullTextPrefix => "full_text_prefix",
            ValueTransform::Custom(_) => "custom",
        }
    }

    pub fn apply(&self, value: &Value) -> Result<Value> {
        let transformed = match self {
            ValueTransform::Identity => value.clone(),
            ValueTransform::Number => to_number(value),
            ValueTransform::NumberList => match value {
                Value::Array(values) => Value::Array(values.iter().map(to_number).collect()),
                _ => return Err(self.invalid(value)),
            },
            ValueTransform::Constant(constant) => constant.clone(),
            ValueTransform::Contains => Value::String(format!("%{}%", to_js_string(value))),
            ValueTransform::StringList => match value {
                Value::Null => Value::Null,
                Value::String(list) => split_list(list.split(',')),
                Value::Array(values) if values.iter().all(Value::is_string) => {
                    split_list(values.iter().filter_map(Value::as_str))
                }
                _ => return Err(self.invalid(value)),
            },
            ValueTransform::IsoDateTime => {
                let datetime = to_datetime(value).ok_or_else(|| self.invalid(value))?;
                Value::String(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            ValueTransform::FullTextPrefix => match value {
                Value::String(query) => Value::String(full_text::prefix_terms(query)),
                other => other.clone(),
            },
            ValueTransform::Custom(transform) => transform(value),
        };

        Ok(transformed)
    }

    fn invalid(&self, value: &Value) -> Error {
        Error::InvalidFilterValue {
            transform: self.name(),
            value: value.clone(),
        }
    }
}

impl fmt::Debug for ValueTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueTransform::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            other => f.write_str(other.name()),
        }
    }
}

fn split_list<'a>(items: impl Iterator<Item = &'a str>) -> Value {
    items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| Value::String(item.to_owned()))
        .collect()
}

/// Numeric coercion with the rules of JavaScript's `Number()`: blank strings, `null` and `false`
/// become `0`, anything that does not parse becomes `null`.
pub(crate) fn to_number(value: &Value) -> Value {
    let number = match value {
        Value::Number(_) => return value.clone(),
        Value::Null => Some(0.0),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Array(_) | Value::Object(_) => None,
    };

    match number {
        Some(n) => number_value(n),
        None => {
            tracing::debug!("cannot convert {value} to a number");
            Value::Null
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Value::from(n as i64);
    }

    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// The string JavaScript would interpolate for a value in a template literal.
pub(crate) fn to_js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accepts RFC 3339 datetimes, plain dates (midnight UTC) and epoch milliseconds.
fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|datetime| datetime.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
                Some(date.and_hms_opt(0, 0, 0)?.and_utc())
            }),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}
