//! Builds the GraphQL operations behind a CRUD data provider for PostGraphile-style APIs.
//!
//! Everything is derived from the schema introspection: which root fields exist for a resource,
//! their arguments, the fields worth selecting and the filter operators each column type supports.
//! The crate never talks to the network. Every request produces an [`Operation`], a printed
//! document with its variables plus a parser for the response the caller got back for it.
//!
//! ```ignore
//! let provider = DataProvider::new(introspection, ProviderOptions::default());
//! let operation = provider.get_one("Test", &GetOneParams { id: json!("WyJ0ZXN0cyIsMV0=") })?;
//! let response = client.post(&operation.query, &operation.variables).await?;
//! let record = operation.parse_response(&response)?;
//! ```

mod config;
mod error;
mod filter;
mod introspection;
mod naming;
mod provider;
mod resource;
mod selection;
mod type_index;

#[cfg(test)]
mod tests;

pub use config::{OperatorConfig, ProviderConfig, ResourceConfig, TransformConfig};
pub use error::Error;
pub use filter::{
    compile_filter, map_filter_type, prefix_terms, CompiledFilter, FilterCategory, FilterFields, FilterOperator,
    FilterRegistry, OperatorTable, ValueTransform, DEFAULT_OPERATOR,
};
pub use introspection::{IntrospectionResult, IntrospectionType, NamedType, TypeKind};
pub use naming::{SortOrder, NATURAL_SORTING};
pub use provider::DataProvider;
pub use resource::{
    record_to_variables, CreateParams, DeleteParams, GetListParams, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdConverter, Operation, OperationKind, Pagination, ParsedResponse, ProviderOptions,
    Resource, ResourceContext, ResourceFactory, ResourceFetch, ResourceOptions, ResponseParser, Sort,
    UpdateManyParams, UpdateParams, ValueMapper, ValueMappers, Verb,
};
pub use selection::{
    compile_selection, leaf_settings, AliasedField, FieldHandler, FieldHandlers, FieldSetting, SelectionContext,
    SelectionSettings, SimpleFieldHandler, ALIAS_PREFIX, DEFAULT_HANDLER,
};
pub use type_index::{Introspection, TypeIndex};

pub type Result<T, E = Error> = std::result::Result<T, E>;
