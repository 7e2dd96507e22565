//! Turns data requests on a resource into GraphQL operations.
//!
//! A resource is an entity type of a schema following the PostGraphile conventions: a singular
//! root query taking the primary key, a plural connection query with `filter`/`orderBy`
//! arguments, `create<Type>`/`update<Type>`/`delete<Type>` mutations and their `ByNodeId`
//! variants for compound keys.

mod document;
mod operation;
mod options;
mod params;
mod variables;
mod verb;

pub use operation::{Operation, OperationKind, ParsedResponse, ResponseParser};
pub use options::{ProviderOptions, ResourceContext, ResourceFactory, ResourceOptions};
pub use params::{
    CreateParams, DeleteParams, GetListParams, GetManyParams, GetManyReferenceParams, GetOneParams, Pagination, Sort,
    UpdateManyParams, UpdateParams,
};
pub use variables::{record_to_variables, IdConverter, ValueMapper, ValueMappers};
pub use verb::Verb;

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use itertools::Itertools;
use serde_json::{json, Map, Value};

use crate::{
    filter::{compile_filter, to_js_string, FilterRegistry},
    introspection::IntrospectionType,
    naming::{capitalize, lowercase, sorting_key, NATURAL_SORTING},
    selection::{compile_selection, leaf_settings, FieldHandlers, SelectionSettings},
    type_index::Introspection,
    Error, Result,
};

/// Builds the operation of a data request.
pub trait ResourceFetch: Send + Sync {
    /// `verb` is usually one of the [`Verb`]s, custom resources may accept others.
    fn fetch(&self, verb: &str, params: Value) -> Result<Operation>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PrimaryKey {
    /// The single argument of the root query.
    Simple { name: String },
    /// Records are addressed by their `nodeId`.
    Compound,
}

/// The built-in resource, everything derived from the introspection once.
pub struct Resource {
    introspection: Arc<Introspection>,
    name: String,
    type_name: String,
    query_name: String,
    plural_query_name: String,
    plural_type_name: String,
    key: PrimaryKey,
    id_type: String,
    id_converter: IdConverter,
    get_one_name: String,
    create_name: String,
    update_name: String,
    update_input_name: String,
    delete_name: String,
    delete_input_name: String,
    query_settings: HashMap<Verb, SelectionSettings>,
    field_handlers: FieldHandlers,
    filter_registry: FilterRegistry,
    variable_mappers: ValueMappers,
}

impl Resource {
    pub fn new(ctx: &ResourceContext<'_>) -> Result<Self> {
        let base_name = ctx.options.backend_name.as_deref().unwrap_or(ctx.name);
        let type_name = capitalize(base_name);
        let query_name = lowercase(base_name);

        let plural = ctx
            .options
            .pluralized_name
            .as_deref()
            .or_else(|| ctx.provider.pluralizer.get(ctx.name).map(String::as_str))
            .or_else(|| ctx.provider.pluralizer.get(&type_name).map(String::as_str))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{query_name}s"));

        let plural_query_name = lowercase(&plural);
        let plural_type_name = capitalize(&plural_query_name);

        if !ctx.introspection.types.contains(&type_name) {
            return Err(Error::TypeNotFound(type_name));
        }

        let Some(query) = ctx.introspection.queries.get(&query_name) else {
            return Err(Error::QueryNotFound {
                query: query_name,
                type_name,
            });
        };

        let (key, id_type) = match query.args() {
            [] => {
                return Err(Error::QueryWithoutArgs {
                    query: query_name,
                    type_name,
                })
            }
            [key] => {
                let id_type = key.named_type().map_or("ID", |named| named.name()).to_owned();
                let name = key.name().to_owned();

                (PrimaryKey::Simple { name }, id_type)
            }
            _ => (PrimaryKey::Compound, "ID".to_owned()),
        };

        let suffix = match key {
            PrimaryKey::Simple { .. } => "",
            PrimaryKey::Compound => "ByNodeId",
        };

        let update_name = format!("update{type_name}{suffix}");
        let delete_name = format!("delete{type_name}{suffix}");

        tracing::debug!("building resource `{}` for type `{type_name}` with {key:?}", ctx.name);

        Ok(Self {
            introspection: Arc::clone(ctx.introspection),
            name: ctx.name.to_owned(),
            get_one_name: format!("{query_name}{suffix}"),
            create_name: format!("create{type_name}"),
            update_input_name: capitalize(&format!("{update_name}Input")),
            delete_input_name: capitalize(&format!("{delete_name}Input")),
            update_name,
            delete_name,
            id_converter: IdConverter::for_type(&id_type),
            id_type,
            key,
            type_name,
            query_name,
            plural_query_name,
            plural_type_name,
            query_settings: ctx.options.query_settings.clone(),
            field_handlers: ctx.options.field_handlers.clone().unwrap_or_default(),
            filter_registry: ctx
                .options
                .filter_registry
                .clone()
                .unwrap_or_else(|| ctx.provider.filter_registry.clone()),
            variable_mappers: ctx.provider.mappers_for(ctx.options),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn has_compound_key(&self) -> bool {
        self.key == PrimaryKey::Compound
    }

    pub fn get_one(&self, params: &GetOneParams) -> Result<Operation> {
        self.ensure_root_field(Verb::GetOne, &self.get_one_name)?;

        let name = &self.get_one_name;
        let document = format!(
            "query {name}($id: {id_type}!) {{ {name}({key}: $id) {{ {selection} }} }}",
            id_type = self.id_type,
            key = self.input_key(),
            selection = self.selection(Verb::GetOne)?,
        );

        Operation::new(
            &document,
            variable_map([("id", self.id_converter.convert(&params.id))]),
            ResponseParser::Single {
                path: vec![name.clone()],
                compound: self.has_compound_key(),
            },
        )
    }

    pub fn get_many(&self, params: &GetManyParams) -> Result<Operation> {
        self.ensure_root_field(Verb::GetMany, &self.plural_query_name)?;

        let name = &self.plural_query_name;
        let document = format!(
            "query {name}($ids: [{id_type}!]) \
             {{ {name}(filter: {{ {key}: {{ in: $ids }} }}) {{ nodes {{ {selection} }} }} }}",
            id_type = self.id_type,
            key = self.input_key(),
            selection = self.selection(Verb::GetMany)?,
        );

        let ids: Vec<Value> = params
            .ids
            .iter()
            .filter(|id| variables::is_truthy(id))
            .map(|id| self.id_converter.convert(id))
            .collect();

        Operation::new(
            &document,
            variable_map([("ids", Value::Array(ids))]),
            ResponseParser::Nodes {
                root: name.clone(),
                with_total: false,
                compound: self.has_compound_key(),
            },
        )
    }

    pub fn get_list(&self, params: &GetListParams) -> Result<Operation> {
        self.ensure_root_field(Verb::GetList, &self.plural_query_name)?;
        self.list_operation(Verb::GetList, params)
    }

    pub fn get_many_reference(&self, params: &GetManyReferenceParams) -> Result<Operation> {
        self.ensure_root_field(Verb::GetManyReference, &self.plural_query_name)?;

        let mut list = params.list.clone();
        list.filter.insert(params.target.clone(), params.id.clone());

        self.list_operation(Verb::GetManyReference, &list)
    }

    pub fn create(&self, params: &CreateParams) -> Result<Operation> {
        self.ensure_root_field(Verb::Create, &self.create_name)?;

        let name = &self.create_name;
        let document = format!(
            "mutation {name}($input: Create{type_name}Input!) \
             {{ {name}(input: $input) {{ {query} {{ {selection} }} }} }}",
            type_name = self.type_name,
            query = self.query_name,
            selection = self.selection(Verb::Create)?,
        );

        let record = self.record_to_variables(&params.data, &format!("{}Input", self.type_name))?;

        Operation::new(
            &document,
            variable_map([("input", Value::Object(variable_map([(self.query_name.as_str(), record)])))]),
            self.mutation_parser(name),
        )
    }

    pub fn update(&self, params: &UpdateParams) -> Result<Operation> {
        self.ensure_root_field(Verb::Update, &self.update_name)?;

        let name = &self.update_name;
        let document = format!(
            "mutation {name}($input: {input}!) {{ {name}(input: $input) {{ {query} {{ {selection} }} }} }}",
            input = self.update_input_name,
            query = self.query_name,
            selection = self.selection(Verb::Update)?,
        );

        let data = match self.key {
            PrimaryKey::Simple { .. } => params.data.clone(),
            PrimaryKey::Compound => prepare_compound_patch(&params.data),
        };

        let mut input = Map::new();
        input.insert(self.mutation_key().to_owned(), self.id_converter.convert(&params.id));
        input.insert("patch".to_owned(), self.record_to_variables(&data, &self.patch_type_name())?);

        Operation::new(
            &document,
            variable_map([("input", Value::Object(input))]),
            self.mutation_parser(name),
        )
    }

    /// One aliased update mutation per id, all applying the same patch. Aliases and variables
    /// are numbered by position: `update1: ...(input: $arg1)`.
    pub fn update_many(&self, params: &UpdateManyParams) -> Result<Operation> {
        self.ensure_root_field(Verb::UpdateMany, &self.update_name)?;

        if params.ids.is_empty() {
            return Err(Error::InvalidParams {
                verb: Verb::UpdateMany.to_string(),
                message: "at least one id is required".to_owned(),
            });
        }

        let patch = self.record_to_variables(&params.data, &self.patch_type_name())?;
        let positions = 1..=params.ids.len();

        let variables: Map<String, Value> = positions
            .clone()
            .zip(&params.ids)
            .map(|(position, id)| {
                let mut input = Map::new();
                input.insert(self.mutation_key().to_owned(), self.id_converter.convert(id));
                input.insert("clientMutationId".to_owned(), Value::String(to_js_string(id)));
                input.insert("patch".to_owned(), patch.clone());

                (format!("arg{position}"), Value::Object(input))
            })
            .collect();

        let arguments = positions
            .clone()
            .map(|position| format!("$arg{position}: {}!", self.update_input_name))
            .join(", ");

        let mutations = positions
            .clone()
            .map(|position| {
                format!(
                    "update{position}: {}(input: $arg{position}) {{ clientMutationId }}",
                    self.update_name
                )
            })
            .join(" ");

        let document = format!("mutation updateMany{}({arguments}) {{ {mutations} }}", self.type_name);

        Operation::new(
            &document,
            variables,
            ResponseParser::UpdateMany {
                aliases: positions.map(|position| format!("update{position}")).collect(),
                fallback_ids: params.ids.clone(),
                id_converter: self.id_converter,
            },
        )
    }

    pub fn delete(&self, params: &DeleteParams) -> Result<Operation> {
        self.ensure_root_field(Verb::Delete, &self.delete_name)?;

        let name = &self.delete_name;
        let document = format!(
            "mutation {name}($input: {input}!) {{ {name}(input: $input) {{ {query} {{ {selection} }} }} }}",
            input = self.delete_input_name,
            query = self.query_name,
            selection = self.selection(Verb::Delete)?,
        );

        let mut input = Map::new();
        input.insert(self.mutation_key().to_owned(), self.id_converter.convert(&params.id));

        Operation::new(
            &document,
            variable_map([("input", Value::Object(input))]),
            self.mutation_parser(name),
        )
    }

    /// Builds the input variables of the named input type from a record.
    pub fn record_to_variables(&self, record: &Map<String, Value>, input_type_name: &str) -> Result<Value> {
        let input_type = self
            .introspection
            .types
            .get(input_type_name)
            .ok_or_else(|| Error::InputTypeNotFound(input_type_name.to_owned()))?;

        let Some(resource_type) = self.introspection.types.get(&self.type_name) else {
            return Err(Error::TypeNotFound(self.type_name.clone()));
        };

        let variables = record_to_variables(record, input_type, resource_type, &self.variable_mappers);
        Ok(variables.map_or(Value::Null, Value::Object))
    }

    fn list_operation(&self, verb: Verb, params: &GetListParams) -> Result<Operation> {
        let name = &self.plural_query_name;
        let document = format!(
            "query {name}($offset: Int!, $first: Int!, $filter: {type_name}Filter, \
             $orderBy: [{plural_type_name}OrderBy!]) \
             {{ {name}(first: $first, offset: $offset, filter: $filter, orderBy: $orderBy) \
             {{ nodes {{ {selection} }} totalCount }} }}",
            type_name = self.type_name,
            plural_type_name = self.plural_type_name,
            selection = self.selection(verb)?,
        );

        let compiled = compile_filter(&params.filter, self.resource_type()?, &self.filter_registry)?;

        let mut order_by = compiled.order_by;
        order_by.extend(params.sort.iter().map(|sort| sorting_key(&sort.field, sort.order)));

        if order_by.is_empty() {
            order_by.push(NATURAL_SORTING.to_owned());
        }

        let (Some(offset), Some(first)) = (params.pagination.offset(), params.pagination.first()) else {
            return Err(Error::InvalidParams {
                verb: verb.to_string(),
                message: "the pagination is out of range".to_owned(),
            });
        };

        let variables = variable_map([
            ("offset", json!(offset)),
            ("first", json!(first)),
            ("filter", compiled.filters.unwrap_or(Value::Null)),
            ("orderBy", json!(order_by)),
        ]);

        Operation::new(
            &document,
            variables,
            ResponseParser::Nodes {
                root: name.clone(),
                with_total: true,
                compound: self.has_compound_key(),
            },
        )
    }

    /// The selection of a verb: its own settings, those of its fallback verb, or every leaf field
    /// of the type.
    fn selection(&self, verb: Verb) -> Result<String> {
        let settings = self
            .query_settings
            .get(&verb)
            .or_else(|| verb.selection_fallback().and_then(|fallback| self.query_settings.get(&fallback)));

        let selection = match settings {
            Some(settings) => compile_selection(
                &self.type_name,
                &self.introspection.types,
                &self.field_handlers,
                settings,
            ),
            None => {
                let defaults = leaf_settings(self.resource_type()?, &self.introspection.types);
                compile_selection(&self.type_name, &self.introspection.types, &self.field_handlers, &defaults)
            }
        };

        if selection.trim().is_empty() {
            return Err(Error::EmptySelection {
                verb: verb.to_string(),
                resource: self.name.clone(),
            });
        }

        Ok(selection)
    }

    fn resource_type(&self) -> Result<&IntrospectionType> {
        self.introspection
            .types
            .get(&self.type_name)
            .ok_or_else(|| Error::TypeNotFound(self.type_name.clone()))
    }

    fn ensure_root_field(&self, verb: Verb, root_field: &str) -> Result<()> {
        if self.introspection.queries.contains(root_field) {
            return Ok(());
        }

        Err(self.not_implemented(verb.as_str()))
    }

    fn not_implemented(&self, verb: &str) -> Error {
        Error::NotImplemented {
            verb: verb.to_owned(),
            resource: self.name.clone(),
        }
    }

    fn mutation_parser(&self, name: &str) -> ResponseParser {
        ResponseParser::Single {
            path: vec![name.to_owned(), self.query_name.clone()],
            compound: self.has_compound_key(),
        }
    }

    /// The argument or input field holding the record id.
    fn input_key(&self) -> &str {
        match &self.key {
            PrimaryKey::Simple { name } => name,
            PrimaryKey::Compound => "nodeId",
        }
    }

    /// The key of the id inside a mutation `input`.
    fn mutation_key(&self) -> &str {
        match &self.key {
            PrimaryKey::Simple { name } => name,
            PrimaryKey::Compound => "id",
        }
    }

    fn patch_type_name(&self) -> String {
        format!("{}Patch", self.type_name)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<_> = self.variable_mappers.keys().collect();
        mappers.sort();

        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("plural_query_name", &self.plural_query_name)
            .field("key", &self.key)
            .field("id_type", &self.id_type)
            .field("query_settings", &self.query_settings)
            .field("field_handlers", &self.field_handlers)
            .field("variable_mappers", &mappers)
            .finish_non_exhaustive()
    }
}

impl ResourceFetch for Resource {
    fn fetch(&self, verb: &str, raw: Value) -> Result<Operation> {
        let Ok(known) = Verb::from_str(verb) else {
            return Err(self.not_implemented(verb));
        };

        match known {
            Verb::GetOne => self.get_one(&params::parse(known, raw)?),
            Verb::GetMany => self.get_many(&params::parse(known, raw)?),
            Verb::GetManyReference => self.get_many_reference(&params::parse(known, raw)?),
            Verb::GetList => self.get_list(&params::parse(known, raw)?),
            Verb::Create => self.create(&params::parse(known, raw)?),
            Verb::Update => self.update(&params::parse(known, raw)?),
            Verb::UpdateMany => self.update_many(&params::parse(known, raw)?),
            Verb::Delete => self.delete(&params::parse(known, raw)?),
            Verb::DeleteMany => Err(self.not_implemented(verb)),
        }
    }
}

/// The id of a compound record is its `nodeId`: the patch gets the backend id back from
/// `__rawId`.
fn prepare_compound_patch(data: &Map<String, Value>) -> Map<String, Value> {
    let mut prepared = data.clone();

    match data.get("id") {
        Some(node_id) => prepared.insert("nodeId".to_owned(), node_id.clone()),
        None => prepared.shift_remove("nodeId"),
    };

    match data.get("__rawId") {
        Some(raw_id) => prepared.insert("id".to_owned(), raw_id.clone()),
        None => prepared.shift_remove("id"),
    };

    prepared
}

fn variable_map<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries.into_iter().map(|(name, value)| (name.to_owned(), value)).collect()
}
