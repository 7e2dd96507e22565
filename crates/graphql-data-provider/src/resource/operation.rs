use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

use super::{document, variables::IdConverter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Everything a transport needs to run a data request and hand back its result.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: String,
    /// The printed GraphQL document.
    pub query: String,
    pub variables: Map<String, Value>,
    parser: ResponseParser,
}

impl Operation {
    /// Validates and prints `document`, failing if it is not a single named query or mutation.
    pub fn new(document: &str, variables: Map<String, Value>, parser: ResponseParser) -> Result<Self> {
        let document = document::validate(document)?;

        Ok(Self {
            kind: document.kind,
            name: document.name,
            query: document.text,
            variables,
            parser,
        })
    }

    /// Extracts the records from a raw `{"data": ...}` response.
    pub fn parse_response(&self, response: &Value) -> Result<ParsedResponse> {
        let data = response
            .get("data")
            .ok_or_else(|| Error::MalformedResponse("the response has no `data`".to_owned()))?;

        self.parser.parse(data)
    }
}

/// The result of a data request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub data: Value,
    /// Only set by list requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// How the records of a verb are read from the response data.
#[derive(Clone)]
pub enum ResponseParser {
    /// A single record under the given path of root field and nested fields.
    Single { path: Vec<String>, compound: bool },
    /// A `{nodes, totalCount}` connection under the given root field.
    Nodes {
        root: String,
        with_total: bool,
        compound: bool,
    },
    /// The `clientMutationId`s of aliased update mutations, in alias order. The fallback ids are
    /// used for the aliases that did not return one.
    UpdateMany {
        aliases: Vec<String>,
        fallback_ids: Vec<Value>,
        id_converter: IdConverter,
    },
    Custom(Arc<dyn Fn(&Value) -> Result<ParsedResponse> + Send + Sync>),
}

impl ResponseParser {
    pub fn custom(parser: impl Fn(&Value) -> Result<ParsedResponse> + Send + Sync + 'static) -> Self {
        ResponseParser::Custom(Arc::new(parser))
    }

    fn parse(&self, data: &Value) -> Result<ParsedResponse> {
        match self {
            ResponseParser::Single { path, compound } => {
                let mut current = data;

                for segment in path {
                    current = current.get(segment).ok_or_else(|| missing(segment))?;
                }

                Ok(ParsedResponse {
                    data: prepare_record(current.clone(), *compound),
                    total: None,
                })
            }
            ResponseParser::Nodes {
                root,
                with_total,
                compound,
            } => {
                let connection = data.get(root).ok_or_else(|| missing(root))?;

                let Some(Value::Array(nodes)) = connection.get("nodes") else {
                    return Err(Error::MalformedResponse(format!("`{root}` has no `nodes` list")));
                };

                let nodes = nodes.iter().map(|node| prepare_record(node.clone(), *compound)).collect();

                let total = if *with_total {
                    connection.get("totalCount").and_then(Value::as_u64)
                } else {
                    None
                };

                Ok(ParsedResponse {
                    data: Value::Array(nodes),
                    total,
                })
            }
            ResponseParser::UpdateMany {
                aliases,
                fallback_ids,
                id_converter,
            } => {
                let ids = aliases
                    .iter()
                    .zip(fallback_ids)
                    .map(|(alias, fallback)| {
                        let result = data.get(alias).ok_or_else(|| missing(alias))?;

                        Ok(match result.get("clientMutationId") {
                            Some(id @ Value::String(_)) => id_converter.convert(id),
                            _ => fallback.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(ParsedResponse {
                    data: Value::Array(ids),
                    total: None,
                })
            }
            ResponseParser::Custom(parser) => parser(data),
        }
    }
}

impl fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseParser::Single { path, compound } => f
                .debug_struct("Single")
                .field("path", path)
                .field("compound", compound)
                .finish(),
            ResponseParser::Nodes {
                root,
                with_total,
                compound,
            } => f
                .debug_struct("Nodes")
                .field("root", root)
                .field("with_total", with_total)
                .field("compound", compound)
                .finish(),
            ResponseParser::UpdateMany { aliases, .. } => {
                f.debug_struct("UpdateMany").field("aliases", aliases).finish()
            }
            ResponseParser::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedResponse(format!("`{field}` is missing from the response"))
}

/// Records of compound-key resources are identified by their `nodeId`: it replaces `id`, which
/// is kept as `__rawId`.
pub(crate) fn prepare_record(record: Value, compound: bool) -> Value {
    let Value::Object(mut record) = record else {
        return record;
    };

    if compound {
        if let Some(raw_id) = record.get("id").cloned() {
            record.insert("__rawId".to_owned(), raw_id);
        }

        match record.get("nodeId").cloned() {
            Some(node_id) => record.insert("id".to_owned(), node_id),
            None => record.shift_remove("id"),
        };
    }

    Value::Object(record)
}
