use std::collections::BTreeMap;

use serde::Deserialize;

/// Prefix marking an aliased entry in a settings tree, `=de` renders as `de: <field>`.
pub const ALIAS_PREFIX: char = '=';

/// Which fields to select for a type, keyed by field name or `=alias`.
///
/// Entries are kept sorted by key: compiled selections come out in that order no matter how the
/// settings were written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, RawSetting>")]
pub struct SelectionSettings {
    entries: BTreeMap<String, FieldSetting>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldSetting {
    /// `true` selects the field as is, `false` leaves it out.
    Enabled(bool),
    /// Selects an object field with the given sub-selection.
    Nested(SelectionSettings),
    /// Only found under `=alias` keys.
    Aliased(AliasedField),
}

/// A field selected under an alias, with optional raw GraphQL arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedField {
    pub field: String,
    /// Inlined verbatim between parentheses, neither parsed nor validated.
    pub arguments: Option<String>,
    pub setting: Box<FieldSetting>,
}

impl SelectionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), FieldSetting::Enabled(true));
        self
    }

    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, Self::field)
    }

    pub fn disabled(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), FieldSetting::Enabled(false));
        self
    }

    pub fn nested(mut self, name: impl Into<String>, settings: SelectionSettings) -> Self {
        self.entries.insert(name.into(), FieldSetting::Nested(settings));
        self
    }

    /// Selects `field` as `alias: field(arguments)`.
    pub fn aliased(
        mut self,
        alias: &str,
        field: impl Into<String>,
        arguments: Option<String>,
        setting: FieldSetting,
    ) -> Self {
        let aliased = AliasedField {
            field: field.into(),
            arguments,
            setting: Box::new(setting),
        };

        self.entries
            .insert(format!("{ALIAS_PREFIX}{alias}"), FieldSetting::Aliased(aliased));

        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldSetting> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSetting)> + '_ {
        self.entries.iter().map(|(key, setting)| (key.as_str(), setting))
    }
}

/// The loose shape settings trees arrive in from JSON or TOML, checked by the conversion below.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSetting {
    Enabled(bool),
    Arguments(String),
    Object(BTreeMap<String, RawSetting>),
}

impl TryFrom<BTreeMap<String, RawSetting>> for SelectionSettings {
    type Error = String;

    fn try_from(raw: BTreeMap<String, RawSetting>) -> Result<Self, Self::Error> {
        let entries = raw
            .into_iter()
            .map(|(key, value)| {
                let setting = if let Some(alias) = key.strip_prefix(ALIAS_PREFIX) {
                    FieldSetting::Aliased(aliased_from_raw(alias, value)?)
                } else {
                    plain_from_raw(&key, value)?
                };

                Ok((key, setting))
            })
            .collect::<Result<_, String>>()?;

        Ok(Self { entries })
    }
}

fn plain_from_raw(key: &str, raw: RawSetting) -> Result<FieldSetting, String> {
    match raw {
        RawSetting::Enabled(enabled) => Ok(FieldSetting::Enabled(enabled)),
        RawSetting::Object(entries) => SelectionSettings::try_from(entries).map(FieldSetting::Nested),
        RawSetting::Arguments(_) => Err(format!(
            "the setting for `{key}` must be a boolean or a nested selection"
        )),
    }
}

fn aliased_from_raw(alias: &str, raw: RawSetting) -> Result<AliasedField, String> {
    let RawSetting::Object(mut entries) = raw else {
        return Err(format!("the alias `{alias}` must be an object with a `query` entry"));
    };

    let arguments = match entries.remove("arguments") {
        Some(RawSetting::Arguments(arguments)) => Some(arguments),
        Some(_) => return Err(format!("the arguments of the alias `{alias}` must be a string")),
        None => None,
    };

    let Some(RawSetting::Object(query)) = entries.remove("query") else {
        return Err(format!("the alias `{alias}` must have a `query` object"));
    };

    if let Some(unknown) = entries.keys().next() {
        return Err(format!("unknown key `{unknown}` in the alias `{alias}`"));
    }

    let mut query = query.into_iter();

    let (Some((field, setting)), None) = (query.next(), query.next()) else {
        return Err(format!("the query of the alias `{alias}` must name exactly one field"));
    };

    Ok(AliasedField {
        setting: Box::new(plain_from_raw(&field, setting)?),
        field,
        arguments,
    })
}
