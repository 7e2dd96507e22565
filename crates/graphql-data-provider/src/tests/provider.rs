use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::{introspection, options, provider};
use crate::{
    filter::{FilterCategory, FilterRegistry, OperatorTable, ValueTransform},
    naming::SortOrder,
    resource::{
        CreateParams, GetListParams, GetOneParams, Operation, Pagination, ParsedResponse, ProviderOptions, Resource,
        ResourceFetch, ResourceOptions, ResponseParser, Sort, Verb,
    },
    selection::{FieldHandlers, SelectionSettings},
    DataProvider, Result,
};

#[test]
fn resources_are_built_once() {
    let provider = provider();

    let first = provider.resource("Test").unwrap();
    let second = provider.resource("Test").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn failed_resources_are_not_cached() {
    let provider = DataProvider::new(introspection(), options());

    assert!(provider.resource("Unknown").is_err());
    assert!(provider.resource("Unknown").is_err());
    assert!(provider.resource("Test").is_ok());
}

#[test]
fn custom_verbs_are_not_implemented_by_default() {
    let error = provider().fetch("PUBLISH", "Test", json!({ "id": 1 })).unwrap_err();

    insta::assert_snapshot!(error, @r###"PUBLISH is not implemented for type "Test""###);
}

/// Adds a `PUBLISH` verb and hands everything else to the built-in resource.
struct Publishing {
    inner: Resource,
}

impl ResourceFetch for Publishing {
    fn fetch(&self, verb: &str, params: Value) -> Result<Operation> {
        if verb != "PUBLISH" {
            return self.inner.fetch(verb, params);
        }

        let mut variables = serde_json::Map::new();
        variables.insert("id".to_owned(), params["id"].clone());

        Operation::new(
            &format!("mutation publish{0}($id: Int!) {{ publish{0}(id: $id) }}", self.inner.type_name()),
            variables,
            ResponseParser::custom(|data| {
                Ok(ParsedResponse {
                    data: data["publishTest"].clone(),
                    total: None,
                })
            }),
        )
    }
}

#[test]
fn resource_factories() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);

    let options = options().resource(
        "Test",
        ResourceOptions::new().factory(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);

            Ok(Arc::new(Publishing {
                inner: Resource::new(ctx)?,
            }))
        }),
    );

    let provider = DataProvider::new(introspection(), options);

    let operation = provider.fetch("PUBLISH", "Test", json!({ "id": 1 })).unwrap();
    insta::assert_snapshot!(operation.query, @r###"
    mutation publishTest($id: Int!) {
      publishTest(id: $id)
    }
    "###);

    let parsed = operation
        .parse_response(&json!({ "data": { "publishTest": true } }))
        .unwrap();
    assert_eq!(parsed.data, json!(true));

    let operation = provider.fetch("GET_ONE", "Test", json!({ "id": 1 })).unwrap();
    assert_eq!(operation.name, "test");

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn typed_verbs() {
    let provider = provider();

    let operation = provider.get_one("Test", &GetOneParams { id: json!(1) }).unwrap();
    assert_eq!(operation.name, "test");

    let params = GetListParams {
        pagination: Pagination { page: 2, per_page: 5 },
        sort: Some(Sort {
            field: "name".to_owned(),
            order: SortOrder::Asc,
        }),
        filter: [("deleted".to_owned(), json!(false))].into_iter().collect(),
    };

    let operation = provider.get_list("Test", &params).unwrap();
    insta::assert_json_snapshot!(Value::Object(operation.variables), @r###"
    {
      "offset": 5,
      "first": 5,
      "filter": {
        "and": [
          {
            "deleted": {
              "equalTo": false
            }
          }
        ]
      },
      "orderBy": [
        "NAME_ASC"
      ]
    }
    "###);

    let data = [("name".to_owned(), json!("new"))].into_iter().collect();
    let operation = provider.create("Compound", &CreateParams { data }).unwrap();
    assert_eq!(operation.name, "createCompound");
}

#[test]
fn verbs_round_trip_through_their_names() {
    for verb in <Verb as strum::VariantArray>::VARIANTS {
        assert_eq!(verb.as_str().parse::<Verb>().unwrap(), *verb);
    }
}

#[test]
fn provider_wide_value_mappers() {
    let options = options().variable_mapper("ContentBlock", |mut block| {
        if let Some(block) = block.as_object_mut() {
            block.shift_remove("value");
        }
        block
    });

    let provider = DataProvider::new(introspection(), options);
    let operation = provider
        .fetch(
            "CREATE",
            "Test",
            json!({ "data": { "name": "blocks", "blocks": [{ "type": "text", "value": "dropped" }] } }),
        )
        .unwrap();

    assert_eq!(
        Value::Object(operation.variables),
        json!({ "input": { "test": { "name": "blocks", "blocks": [{ "type": "text" }] } } })
    );
}

#[test]
fn resource_filter_registries_replace_the_provider_one() {
    let registry = FilterRegistry::empty().with_table(
        "String",
        OperatorTable::new(FilterCategory::Scalar).with("default", "startsWith", ValueTransform::Identity),
    );

    let options = options().resource(
        "Test",
        ResourceOptions::new()
            .filter_registry(registry)
            .query_settings(Verb::GetList, SelectionSettings::new().field("id")),
    );

    let provider = DataProvider::new(introspection(), options);
    let list = json!({ "pagination": { "page": 1, "perPage": 10 } });

    let mut params = list.clone();
    params["filter"] = json!({ "name": "an" });
    let operation = provider.fetch("GET_LIST", "Test", params).unwrap();
    assert_eq!(operation.variables["filter"], json!({ "and": [{ "name": { "startsWith": "an" } }] }));

    let mut params = list;
    params["filter"] = json!({ "id": 1 });
    let error = provider.fetch("GET_LIST", "Test", params).unwrap_err();
    insta::assert_snapshot!(error, @r###"Filter for type "Int" or kind "SCALAR" not implemented."###);
}

#[test]
fn custom_field_handlers() {
    let handlers = FieldHandlers::default().with_fn("nodeId", |field, _, _| format!("{}: id", field.name()));

    let options = ProviderOptions::new().resource(
        "Test",
        ResourceOptions::new()
            .field_handlers(handlers)
            .query_settings(Verb::GetOne, SelectionSettings::new().fields(["name", "nodeId"])),
    );

    let provider = DataProvider::new(introspection(), options);
    let operation = provider.fetch("GET_ONE", "Test", json!({ "id": 1 })).unwrap();

    insta::assert_snapshot!(operation.query, @r###"
    query test($id: Int!) {
      test(id: $id) {
        name
        nodeId: id
      }
    }
    "###);
}

#[test]
fn concurrent_first_requests() {
    let provider = Arc::new(provider());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let provider = Arc::clone(&provider);
            std::thread::spawn(move || provider.fetch("GET_ONE", "Test", json!({ "id": 1 })).map(|op| op.query))
        })
        .collect();

    let queries: Vec<String> = handles.into_iter().map(|handle| handle.join().unwrap().unwrap()).collect();

    assert!(queries.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(Arc::ptr_eq(
        &provider.resource("Test").unwrap(),
        &provider.resource("Test").unwrap()
    ));
}
