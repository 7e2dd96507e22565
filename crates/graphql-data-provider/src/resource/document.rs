use graphql_parser::query::{Definition, OperationDefinition};

use crate::{Error, Result};

use super::OperationKind;

/// A generated operation after it went through the GraphQL parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document {
    pub kind: OperationKind,
    pub name: String,
    /// The canonical printed form.
    pub text: String,
}

/// Parses a generated document, which must contain exactly one named query or mutation, and
/// prints it back in canonical form.
pub(crate) fn validate(source: &str) -> Result<Document> {
    let document = graphql_parser::parse_query::<String>(source)?;

    let [Definition::Operation(operation)] = document.definitions.as_slice() else {
        return Err(Error::InvalidDocument(
            "expected a single operation definition".to_owned(),
        ));
    };

    let (kind, name) = match operation {
        OperationDefinition::Query(query) => (OperationKind::Query, query.name.clone()),
        OperationDefinition::Mutation(mutation) => (OperationKind::Mutation, mutation.name.clone()),
        OperationDefinition::SelectionSet(_) => (OperationKind::Query, None),
        OperationDefinition::Subscription(_) => {
            return Err(Error::InvalidDocument("subscriptions are not supported".to_owned()));
        }
    };

    let Some(name) = name else {
        return Err(Error::InvalidDocument("the operation must be named".to_owned()));
    };

    Ok(Document {
        kind,
        name,
        text: document.to_string(),
    })
}
