//! The per-call parameters of each verb, in the shape data clients send them.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{filter::FilterFields, naming::SortOrder, Error, Result};

use super::Verb;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GetOneParams {
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GetManyParams {
    pub ids: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    /// The number of skipped records, `None` when it does not fit a GraphQL `Int`.
    pub fn offset(&self) -> Option<i32> {
        let offset = self.page.saturating_sub(1).checked_mul(self.per_page)?;
        i32::try_from(offset).ok()
    }

    pub fn first(&self) -> Option<i32> {
        i32::try_from(self.per_page).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GetListParams {
    pub pagination: Pagination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(default, skip_serializing_if = "FilterFields::is_empty")]
    pub filter: FilterFields,
}

/// A list request restricted to the records whose `target` field equals `id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GetManyReferenceParams {
    pub target: String,
    pub id: Value,
    #[serde(flatten)]
    pub list: GetListParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateParams {
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateParams {
    pub id: Value,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateManyParams {
    pub ids: Vec<Value>,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeleteParams {
    pub id: Value,
}

pub(crate) fn parse<T: DeserializeOwned>(verb: Verb, params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|error| Error::InvalidParams {
        verb: verb.to_string(),
        message: error.to_string(),
    })
}
