//! Wire format of the catalog service's reference-book endpoints.
//!
//! List endpoints take a jqGrid-style paging and filter envelope:
//!
//! ```json
//! {
//!   "rows": 500,
//!   "page": 1,
//!   "sidx": "id",
//!   "sord": "asc",
//!   "filters": {
//!     "groupOp": "AND",
//!     "rules": [{"field": "name", "op": "cn", "data": "misc"}]
//!   }
//! }
//! ```
//!
//! and answer with `{"rows": [...]}`. A missing `rows` field is treated as an empty page.

use serde::{Deserialize, Deserializer, Serialize};

pub const ITEMS_LIST: &str = "/api/reference-book/items/list";
pub const ITEM_UPDATE: &str = "/api/reference-book/items/update";
pub const GROUPS_LIST: &str = "/api/reference-book/item-groups/list";
pub const GROUP_CREATE: &str = "/api/reference-book/item-groups/create";
pub const GROUP_DELETE: &str = "/api/reference-book/item-groups/delete";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListRequest {
    pub rows: u32,
    pub page: u32,
    pub sidx: String,
    pub sord: String,
    pub filters: Filters,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filters {
    #[serde(rename = "groupOp")]
    pub group_op: String,
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rule {
    pub field: String,
    pub op: String,
    pub data: serde_json::Value,
}

impl ListRequest {
    fn single_rule(rule: Rule, page: u32, rows: u32) -> Self {
        ListRequest {
            rows,
            page,
            sidx: "id".into(),
            sord: "asc".into(),
            filters: Filters {
                group_op: "AND".into(),
                rules: vec![rule],
            },
        }
    }

    /// Groups whose name contains `needle`. The service matches case-insensitively;
    /// an empty needle matches every group.
    pub fn groups_named_like(needle: &str, page: u32, rows: u32) -> Self {
        Self::single_rule(
            Rule {
                field: "name".into(),
                op: "cn".into(),
                data: needle.into(),
            },
            page,
            rows,
        )
    }

    /// Items assigned to the given group.
    pub fn items_in_group(group_id: i64, page: u32, rows: u32) -> Self {
        Self::single_rule(
            Rule {
                field: "groupId".into(),
                op: "eq".into(),
                data: group_id.into(),
            },
            page,
            rows,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub rows: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct CreateGroupRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreatedRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    pub id: i64,
}

/// Update payload: the item id plus exactly the fields being changed.
#[derive(Debug, Serialize)]
pub struct UpdateItemRequest {
    pub id: i64,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

/// Catalog ids arrive as JSON numbers, but spreadsheet exports sometimes carry them as strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {text:?}"))),
    }
}
