use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::Value;

use crate::{
    filter::FilterRegistry,
    selection::{FieldHandlers, SelectionSettings},
    type_index::Introspection,
    Result,
};

use super::{ResourceFetch, ValueMapper, ValueMappers, Verb};

/// Builds the fetcher of a resource in place of the built-in [`super::Resource`].
pub type ResourceFactory = Arc<dyn Fn(&ResourceContext<'_>) -> Result<Arc<dyn ResourceFetch>> + Send + Sync>;

/// What a resource is built from.
pub struct ResourceContext<'a> {
    pub introspection: &'a Arc<Introspection>,
    /// The resource name as requested.
    pub name: &'a str,
    pub options: &'a ResourceOptions,
    pub provider: &'a ProviderOptions,
}

/// Per-resource configuration.
#[derive(Clone, Default)]
pub struct ResourceOptions {
    /// The plural root field, `<query>s` when not set.
    pub pluralized_name: Option<String>,
    /// The type the resource maps to, when it differs from the resource name.
    pub backend_name: Option<String>,
    pub query_settings: HashMap<Verb, SelectionSettings>,
    pub field_handlers: Option<FieldHandlers>,
    /// Replaces the provider's filter registry.
    pub filter_registry: Option<FilterRegistry>,
    /// Merged over the provider's value mappers.
    pub variable_mappers: ValueMappers,
    pub factory: Option<ResourceFactory>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pluralized_name(mut self, name: impl Into<String>) -> Self {
        self.pluralized_name = Some(name.into());
        self
    }

    pub fn backend_name(mut self, name: impl Into<String>) -> Self {
        self.backend_name = Some(name.into());
        self
    }

    pub fn query_settings(mut self, verb: Verb, settings: SelectionSettings) -> Self {
        self.query_settings.insert(verb, settings);
        self
    }

    pub fn field_handlers(mut self, handlers: FieldHandlers) -> Self {
        self.field_handlers = Some(handlers);
        self
    }

    pub fn filter_registry(mut self, registry: FilterRegistry) -> Self {
        self.filter_registry = Some(registry);
        self
    }

    pub fn variable_mapper(
        mut self,
        type_name: impl Into<String>,
        mapper: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.variable_mappers.insert(type_name.into(), Arc::new(mapper) as ValueMapper);
        self
    }

    pub fn factory(
        mut self,
        factory: impl Fn(&ResourceContext<'_>) -> Result<Arc<dyn ResourceFetch>> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }
}

impl fmt::Debug for ResourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<_> = self.variable_mappers.keys().collect();
        mappers.sort();

        f.debug_struct("ResourceOptions")
            .field("pluralized_name", &self.pluralized_name)
            .field("backend_name", &self.backend_name)
            .field("query_settings", &self.query_settings)
            .field("field_handlers", &self.field_handlers)
            .field("filter_registry", &self.filter_registry.is_some())
            .field("variable_mappers", &mappers)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// Provider-wide configuration and the defaults shared by all resources.
#[derive(Clone, Default)]
pub struct ProviderOptions {
    pub resources: HashMap<String, ResourceOptions>,
    /// Plural root fields by resource or type name, for resources without a `pluralized_name`.
    pub pluralizer: HashMap<String, String>,
    pub filter_registry: FilterRegistry,
    pub variable_mappers: ValueMappers,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, name: impl Into<String>, options: ResourceOptions) -> Self {
        self.resources.insert(name.into(), options);
        self
    }

    pub fn plural(mut self, name: impl Into<String>, plural: impl Into<String>) -> Self {
        self.pluralizer.insert(name.into(), plural.into());
        self
    }

    pub fn filter_registry(mut self, registry: FilterRegistry) -> Self {
        self.filter_registry = registry;
        self
    }

    pub fn variable_mapper(
        mut self,
        type_name: impl Into<String>,
        mapper: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.variable_mappers.insert(type_name.into(), Arc::new(mapper) as ValueMapper);
        self
    }

    /// The mappers for a resource: the resource's own ones over the provider-wide ones.
    pub(crate) fn mappers_for(&self, options: &ResourceOptions) -> ValueMappers {
        let mut mappers = self.variable_mappers.clone();
        mappers.extend(options.variable_mappers.iter().map(|(name, mapper)| (name.clone(), Arc::clone(mapper))));
        mappers
    }
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<_> = self.variable_mappers.keys().collect();
        mappers.sort();

        f.debug_struct("ProviderOptions")
            .field("resources", &self.resources)
            .field("pluralizer", &self.pluralizer)
            .field("variable_mappers", &mappers)
            .finish_non_exhaustive()
    }
}
