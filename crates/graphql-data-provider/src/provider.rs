use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
    introspection::IntrospectionResult,
    resource::{
        CreateParams, DeleteParams, GetListParams, GetManyParams, GetManyReferenceParams, GetOneParams, Operation,
        ProviderOptions, Resource, ResourceContext, ResourceFetch, ResourceOptions, UpdateManyParams, UpdateParams,
        Verb,
    },
    type_index::Introspection,
    Error, Result,
};

/// The entry point: dispatches data requests to the resources of one introspected schema.
///
/// Resources are built on first use and kept for the provider's lifetime. Building a resource
/// reads the introspection only, so concurrent first requests for the same name may both build
/// it and the first one to be stored is kept.
pub struct DataProvider {
    introspection: Arc<Introspection>,
    options: ProviderOptions,
    resources: DashMap<String, Arc<dyn ResourceFetch>>,
}

impl DataProvider {
    pub fn new(introspection: IntrospectionResult, options: ProviderOptions) -> Self {
        Self {
            introspection: Arc::new(introspection.into()),
            options,
            resources: DashMap::new(),
        }
    }

    /// Builds the operation for `verb` on the named resource.
    pub fn fetch(&self, verb: &str, resource: &str, params: Value) -> Result<Operation> {
        self.resource(resource)?.fetch(verb, params)
    }

    /// The cached resource of the given name, built if needed.
    pub fn resource(&self, name: &str) -> Result<Arc<dyn ResourceFetch>> {
        if let Some(resource) = self.resources.get(name) {
            return Ok(Arc::clone(resource.value()));
        }

        tracing::debug!("resource `{name}` not cached yet");

        let default_options = ResourceOptions::default();
        let options = self.options.resources.get(name).unwrap_or(&default_options);

        let ctx = ResourceContext {
            introspection: &self.introspection,
            name,
            options,
            provider: &self.options,
        };

        let resource: Arc<dyn ResourceFetch> = match &options.factory {
            Some(factory) => factory(&ctx)?,
            None => Arc::new(Resource::new(&ctx)?),
        };

        let stored = self.resources.entry(name.to_owned()).or_insert(resource);

        Ok(Arc::clone(stored.value()))
    }

    pub fn get_one(&self, resource: &str, params: &GetOneParams) -> Result<Operation> {
        self.fetch_typed(Verb::GetOne, resource, params)
    }

    pub fn get_many(&self, resource: &str, params: &GetManyParams) -> Result<Operation> {
        self.fetch_typed(Verb::GetMany, resource, params)
    }

    pub fn get_many_reference(&self, resource: &str, params: &GetManyReferenceParams) -> Result<Operation> {
        self.fetch_typed(Verb::GetManyReference, resource, params)
    }

    pub fn get_list(&self, resource: &str, params: &GetListParams) -> Result<Operation> {
        self.fetch_typed(Verb::GetList, resource, params)
    }

    pub fn create(&self, resource: &str, params: &CreateParams) -> Result<Operation> {
        self.fetch_typed(Verb::Create, resource, params)
    }

    pub fn update(&self, resource: &str, params: &UpdateParams) -> Result<Operation> {
        self.fetch_typed(Verb::Update, resource, params)
    }

    pub fn update_many(&self, resource: &str, params: &UpdateManyParams) -> Result<Operation> {
        self.fetch_typed(Verb::UpdateMany, resource, params)
    }

    pub fn delete(&self, resource: &str, params: &DeleteParams) -> Result<Operation> {
        self.fetch_typed(Verb::Delete, resource, params)
    }

    fn fetch_typed<P: Serialize>(&self, verb: Verb, resource: &str, params: &P) -> Result<Operation> {
        let params = serde_json::to_value(params).map_err(|error| Error::InvalidParams {
            verb: verb.to_string(),
            message: error.to_string(),
        })?;

        self.fetch(verb.as_str(), resource, params)
    }
}
