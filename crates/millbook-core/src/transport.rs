// ── Transport seam ──
//
// The core never talks HTTP directly. Everything goes through
// `ResourceTransport`, which `MillClient` implements and tests fake.

use futures_util::future::BoxFuture;
use serde_json::Value;

use millbook_api::{MillClient, RecordPage};

use crate::error::CoreError;

/// Record CRUD against `/mills/{mill_id}/{resource}`.
///
/// Implementations unwrap the response envelope and report failures
/// (non-2xx or `success = false`) as errors.
pub trait ResourceTransport: Send + Sync {
    fn list<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>>;

    fn create<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>>;

    fn update<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        id: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>>;

    fn delete<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    fn bulk_delete<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    fn bulk_create<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        rows: &'a [Value],
    ) -> BoxFuture<'a, Result<Value, CoreError>>;
}

impl ResourceTransport for MillClient {
    fn list<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        Box::pin(async move { Ok(self.list_records(mill_id, resource, params).await?) })
    }

    fn create<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move { Ok(self.create_record(mill_id, resource, body).await?) })
    }

    fn update<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        id: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            self.update_record(mill_id, resource, id, body)
                .await
                .map_err(|e| not_found_or(e, resource, id))
        })
    }

    fn delete<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            self.delete_record(mill_id, resource, id)
                .await
                .map_err(|e| not_found_or(e, resource, id))
        })
    }

    fn bulk_delete<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move { Ok(self.bulk_delete_records(mill_id, resource, ids).await?) })
    }

    fn bulk_create<'a>(
        &'a self,
        mill_id: &'a str,
        resource: &'a str,
        rows: &'a [Value],
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move { Ok(self.bulk_create_records(mill_id, resource, rows).await?) })
    }
}

/// A 404 on a single-record call names the record; anything else goes
/// through the generic translation.
fn not_found_or(err: millbook_api::Error, resource: &str, id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::NotFound {
            resource: resource.to_owned(),
            identifier: id.to_owned(),
        }
    } else {
        err.into()
    }
}
