//! The serializable part of the provider configuration.
//!
//! ```toml
//! [pluralizer]
//! Person = "people"
//!
//! [resources.Content]
//! pluralized_name = "allContents"
//!
//! [resources.Content.query_settings.GET_LIST]
//! id = true
//! name = true
//! block = { type = true }
//!
//! [resources.Content.filters.Int]
//! between = { operator = "in", transform = "number_list" }
//! ```
//!
//! Handlers, value mappers and resource factories are code and only available through
//! [`ProviderOptions`] and [`ResourceOptions`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    filter::{FilterCategory, FilterOperator, FilterRegistry, OperatorTable, ValueTransform},
    resource::{ProviderOptions, ResourceOptions, Verb},
    selection::SelectionSettings,
    Result,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Plural root field names by resource or type name.
    pub pluralizer: HashMap<String, String>,
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ProviderConfig {
    pub fn from_toml_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceConfig {
    pub pluralized_name: Option<String>,
    pub backend_name: Option<String>,
    pub query_settings: HashMap<Verb, SelectionSettings>,
    /// Operators by table name and token, merged over the built-in filter tables.
    pub filters: IndexMap<String, IndexMap<String, OperatorConfig>>,
}

/// A filter operator: the backend operator name and how the value is transformed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawOperatorConfig")]
pub struct OperatorConfig {
    pub operator: String,
    pub transform: TransformConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransformConfig {
    Identity,
    Number,
    NumberList,
    Contains,
    StringList,
    IsoDateTime,
    FullTextPrefix,
    Constant(Value),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformName {
    #[default]
    Identity,
    Number,
    NumberList,
    Contains,
    StringList,
    IsoDateTime,
    FullTextPrefix,
    Constant,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOperatorConfig {
    operator: String,
    #[serde(default)]
    transform: TransformName,
    value: Option<Value>,
}

impl TryFrom<RawOperatorConfig> for OperatorConfig {
    type Error = String;

    fn try_from(raw: RawOperatorConfig) -> std::result::Result<Self, Self::Error> {
        let transform = match (raw.transform, raw.value) {
            (TransformName::Constant, Some(value)) => TransformConfig::Constant(value),
            (TransformName::Constant, None) => {
                return Err(format!("the constant transform of `{}` needs a `value`", raw.operator));
            }
            (_, Some(_)) => {
                return Err(format!("`value` is only allowed with the constant transform (`{}`)", raw.operator));
            }
            (TransformName::Identity, None) => TransformConfig::Identity,
            (TransformName::Number, None) => TransformConfig::Number,
            (TransformName::NumberList, None) => TransformConfig::NumberList,
            (TransformName::Contains, None) => TransformConfig::Contains,
            (TransformName::StringList, None) => TransformConfig::StringList,
            (TransformName::IsoDateTime, None) => TransformConfig::IsoDateTime,
            (TransformName::FullTextPrefix, None) => TransformConfig::FullTextPrefix,
        };

        Ok(Self {
            operator: raw.operator,
            transform,
        })
    }
}

impl From<TransformConfig> for ValueTransform {
    fn from(config: TransformConfig) -> Self {
        match config {
            TransformConfig::Identity => ValueTransform::Identity,
            TransformConfig::Number => ValueTransform::Number,
            TransformConfig::NumberList => ValueTransform::NumberList,
            TransformConfig::Contains => ValueTransform::Contains,
            TransformConfig::StringList => ValueTransform::StringList,
            TransformConfig::IsoDateTime => ValueTransform::IsoDateTime,
            TransformConfig::FullTextPrefix => ValueTransform::FullTextPrefix,
            TransformConfig::Constant(value) => ValueTransform::Constant(value),
        }
    }
}

impl From<ResourceConfig> for ResourceOptions {
    fn from(config: ResourceConfig) -> Self {
        let filter_registry = (!config.filters.is_empty()).then(|| {
            let overrides = config
                .filters
                .into_iter()
                .fold(FilterRegistry::empty(), |registry, (name, operators)| {
                    let mut table = OperatorTable::new(FilterCategory::from_table_name(&name));

                    for (token, operator) in operators {
                        table.insert(token, FilterOperator::new(operator.operator, operator.transform.into()));
                    }

                    registry.with_table(name, table)
                });

            FilterRegistry::default().merge(overrides)
        });

        ResourceOptions {
            pluralized_name: config.pluralized_name,
            backend_name: config.backend_name,
            query_settings: config.query_settings,
            filter_registry,
            ..ResourceOptions::default()
        }
    }
}

impl From<ProviderConfig> for ProviderOptions {
    fn from(config: ProviderConfig) -> Self {
        ProviderOptions {
            resources: config
                .resources
                .into_iter()
                .map(|(name, resource)| (name, resource.into()))
                .collect(),
            pluralizer: config.pluralizer,
            ..ProviderOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::FieldSetting;
    use indoc::indoc;
    use serde_json::json;

    #[test]
    fn full_configuration() {
        let config = ProviderConfig::from_toml_str(indoc! {r#"
            [pluralizer]
            Person = "people"

            [resources.Content]
            pluralized_name = "allContents"
            backend_name = "Article"

            [resources.Content.query_settings.GET_LIST]
            id = true
            name = true
            block = { type = true }

            [resources.Content.query_settings.GET_ONE."=de"]
            arguments = "filter: {lang: {equalTo: DE}}"
            query = { blocks = { type = true } }

            [resources.Content.filters.Int]
            between = { operator = "in", transform = "number_list" }
            "=" = { operator = "is" }

            [resources.Content.filters.Flag]
            set = { operator = "isNull", transform = "constant", value = false }
        "#})
        .unwrap();

        assert_eq!(config.pluralizer.get("Person").map(String::as_str), Some("people"));

        let content = &config.resources["Content"];
        assert_eq!(content.backend_name.as_deref(), Some("Article"));
        assert_eq!(
            content.query_settings[&Verb::GetList],
            SelectionSettings::new()
                .fields(["id", "name"])
                .nested("block", SelectionSettings::new().field("type"))
        );
        assert_eq!(
            content.query_settings[&Verb::GetOne],
            SelectionSettings::new().aliased(
                "de",
                "blocks",
                Some("filter: {lang: {equalTo: DE}}".to_owned()),
                FieldSetting::Nested(SelectionSettings::new().field("type")),
            )
        );
        assert_eq!(
            content.filters["Flag"]["set"].transform,
            TransformConfig::Constant(json!(false))
        );

        let options = ProviderOptions::from(config);
        let registry = options.resources["Content"].filter_registry.clone().unwrap();
        let int = registry.get("Int").unwrap();

        assert_eq!(int.get("between").unwrap().operator, "in");
        assert_eq!(int.get("=").unwrap().operator, "is");
        assert_eq!(int.get("!=").unwrap().operator, "notEqualTo");
        assert_eq!(registry.get("Flag").unwrap().category(), FilterCategory::Scalar);
    }

    #[test]
    fn resources_without_filters_use_the_provider_registry() {
        let config = ProviderConfig::from_toml_str(indoc! {r#"
            [resources.Test]
            pluralized_name = "allTests"
        "#})
        .unwrap();

        let options = ProviderOptions::from(config);
        assert!(options.resources["Test"].filter_registry.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = ProviderConfig::from_toml_str(indoc! {r#"
            [resources.Test]
            plural = "tests"
        "#})
        .unwrap_err();

        assert!(error.to_string().contains("unknown field `plural`"), "{error}");
    }

    #[test]
    fn constants_need_a_value() {
        let error = ProviderConfig::from_toml_str(indoc! {r#"
            [resources.Test.filters.String]
            empty = { operator = "isNull", transform = "constant" }
        "#})
        .unwrap_err();

        assert!(error.to_string().contains("needs a `value`"), "{error}");
    }

    #[test]
    fn json_configuration() {
        let config: ProviderConfig = serde_json::from_value(json!({
            "resources": { "Test": { "query_settings": { "GET_ONE": { "id": true } } } }
        }))
        .unwrap();

        assert_eq!(
            config.resources["Test"].query_settings[&Verb::GetOne],
            SelectionSettings::new().field("id")
        );
    }
}
