// Wire types for the back-office API.
//
// Every response is wrapped as `{statusCode, data, message, success}`.
// These types stay loose (all fields optional) so that partially
// populated responses still parse; `millbook-core` normalizes them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{statusCode, data, message, success}` wrapper around every response.
///
/// List endpoints sometimes hoist `pagination` next to `data` instead of
/// nesting it, so the envelope carries that slot too.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

/// Pagination block exactly as the server sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_prev_page: Option<bool>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
    #[serde(default)]
    pub prev_page: Option<u32>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

/// The `.data` payload of a list response.
///
/// Accepts both `data: {data: [...], pagination}` and a bare
/// `data: [...]` with the pagination hoisted onto the envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload {
    Wrapped {
        data: Vec<Value>,
        #[serde(default)]
        pagination: Option<RawPagination>,
    },
    Bare(Vec<Value>),
}

/// One page of records, envelope stripped.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub rows: Vec<Value>,
    pub pagination: Option<RawPagination>,
}

/// Body of `DELETE .../bulk`.
#[derive(Debug, Serialize)]
pub(crate) struct BulkDeleteBody<'a> {
    pub ids: &'a [String],
}

/// Body of `POST .../bulk`.
#[derive(Debug, Serialize)]
pub(crate) struct BulkCreateBody<'a> {
    pub rows: &'a [Value],
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_list_payload_parses() {
        let env: Envelope<ListPayload> = serde_json::from_value(json!({
            "statusCode": 200,
            "success": true,
            "data": {
                "data": [{"_id": "a"}],
                "pagination": {"page": 2, "limit": 10, "total": 11}
            }
        }))
        .unwrap();

        match env.data.unwrap() {
            ListPayload::Wrapped { data, pagination } => {
                assert_eq!(data.len(), 1);
                assert_eq!(pagination.unwrap().page, Some(2));
            }
            ListPayload::Bare(_) => panic!("expected wrapped payload"),
        }
    }

    #[test]
    fn bare_list_payload_keeps_hoisted_pagination() {
        let env: Envelope<ListPayload> = serde_json::from_value(json!({
            "data": [{"_id": "a"}, {"_id": "b"}],
            "pagination": {"total": 2}
        }))
        .unwrap();

        assert!(matches!(env.data, Some(ListPayload::Bare(ref rows)) if rows.len() == 2));
        assert_eq!(env.pagination.unwrap().total, Some(2));
    }

    #[test]
    fn missing_fields_default_to_none() {
        let env: Envelope<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(env.data.is_none());
        assert!(env.success.is_none());
        assert!(env.status_code.is_none());
    }
}
