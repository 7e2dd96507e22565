//! Naming conventions shared by the builders: type/root-field casing and `orderBy` tokens.

use std::sync::LazyLock;

use regex::Regex;

/// The `orderBy` token used when neither a sort nor a ranking filter was requested.
pub const NATURAL_SORTING: &str = "NATURAL";

static CAMEL: LazyLock<Regex> = LazyLock::new(|| Regex::new("(.+?)([A-Z])").expect("must be a valid regex"));

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lowercase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Inserts an underscore in front of every upper case letter that follows at least one other
/// character: `CamelCaseMore` becomes `Camel_Case_More`.
pub fn snake(camel_case: &str) -> String {
    CAMEL.replace_all(camel_case, "${1}_${2}").into_owned()
}

/// The backend's sorting enum token for a field and a direction, e.g. `NAME_DESC`.
pub fn sorting_key(field: &str, order: SortOrder) -> String {
    format!("{}_{order}", snake(field).to_uppercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}
