mod provider;

use std::sync::Arc;

use crate::{
    introspection::{IntrospectionResult, IntrospectionType},
    resource::{ProviderOptions, Resource, ResourceContext, ResourceOptions, Verb},
    selection::SelectionSettings,
    type_index::Introspection,
    DataProvider,
};

/// A simple-key `Test` entity with nested content blocks and a `Compound` entity keyed by two
/// columns.
fn introspection() -> IntrospectionResult {
    serde_json::from_str(include_str!("introspection.json")).unwrap()
}

fn with_queries(names: &[&str]) -> IntrospectionResult {
    let mut result = introspection();
    result.queries.extend(names.iter().map(|name| IntrospectionType::named(*name)));
    result
}

fn properties() -> SelectionSettings {
    SelectionSettings::new().fields(["nodeId", "name", "id"])
}

fn resource_options() -> ResourceOptions {
    [Verb::GetOne, Verb::GetList, Verb::Create, Verb::Update, Verb::Delete]
        .into_iter()
        .fold(ResourceOptions::new(), |options, verb| {
            options.query_settings(verb, properties())
        })
}

fn options() -> ProviderOptions {
    ProviderOptions::new()
        .resource("Test", resource_options())
        .resource("Compound", resource_options())
}

fn provider() -> DataProvider {
    DataProvider::new(introspection(), options())
}

fn resource(name: &str, options: &ResourceOptions, provider: &ProviderOptions) -> Resource {
    let introspection = Arc::new(Introspection::from(introspection()));

    Resource::new(&ResourceContext {
        introspection: &introspection,
        name,
        options,
        provider,
    })
    .unwrap()
}
