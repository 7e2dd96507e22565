/// Everything that can go wrong while turning a data request into a GraphQL operation.
///
/// Configuration errors are reported as soon as they are detected, unknown fields in selection
/// settings or filters are not errors and are skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Type \"{0}\" not found in introspection")]
    TypeNotFound(String),
    #[error("Query \"{query}\" for type \"{type_name}\" not found in introspection")]
    QueryNotFound { query: String, type_name: String },
    #[error("Query \"{query}\" for type \"{type_name}\" has no args")]
    QueryWithoutArgs { query: String, type_name: String },
    #[error("Input type \"{0}\" not found in introspection")]
    InputTypeNotFound(String),
    #[error("Filter for type \"{name}\" or kind \"{kind}\" not implemented.")]
    FilterTypeNotImplemented { name: String, kind: String },
    #[error("Operation \"{operation}\" for type \"{type_name}\" not implemented.")]
    FilterOperationNotImplemented { operation: String, type_name: String },
    #[error("Invalid value for the {transform} filter transform: {value}")]
    InvalidFilterValue { transform: &'static str, value: serde_json::Value },
    #[error("{verb} is not implemented for type \"{resource}\"")]
    NotImplemented { verb: String, resource: String },
    #[error("Invalid parameters for {verb}: {message}")]
    InvalidParams { verb: String, message: String },
    #[error("Nothing to select for {verb} on type \"{resource}\"")]
    EmptySelection { verb: String, resource: String },
    #[error("The generated document is not valid GraphQL: {0}")]
    InvalidDocument(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}

impl From<graphql_parser::query::ParseError> for Error {
    fn from(error: graphql_parser::query::ParseError) -> Self {
        Error::InvalidDocument(error.to_string())
    }
}
