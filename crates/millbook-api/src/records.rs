// Record CRUD endpoints
//
// Every ledger and registry shares the same shape under
// `/mills/{mill_id}/{resource}`, so one set of methods serves them all.

use serde_json::Value;
use tracing::debug;

use crate::client::MillClient;
use crate::error::Error;
use crate::models::{BulkCreateBody, BulkDeleteBody, ListPayload, RecordPage};

impl MillClient {
    /// List one page of records.
    ///
    /// `GET /mills/{mill_id}/{resource}?page&limit&search&sortBy&sortOrder[&filters]`
    pub async fn list_records(
        &self,
        mill_id: &str,
        resource: &str,
        params: &[(String, String)],
    ) -> Result<RecordPage, Error> {
        let url = self.resource_url(mill_id, resource, None)?;
        let envelope = self.get::<ListPayload>(url, params).await?;

        let page = match envelope.data {
            Some(ListPayload::Wrapped { data, pagination }) => RecordPage {
                rows: data,
                pagination: pagination.or(envelope.pagination),
            },
            Some(ListPayload::Bare(rows)) => RecordPage {
                rows,
                pagination: envelope.pagination,
            },
            None => RecordPage {
                rows: Vec::new(),
                pagination: envelope.pagination,
            },
        };
        debug!(resource, rows = page.rows.len(), "listed records");
        Ok(page)
    }

    /// Create a record.
    ///
    /// `POST /mills/{mill_id}/{resource}`; returns the stored record.
    pub async fn create_record(
        &self,
        mill_id: &str,
        resource: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        let url = self.resource_url(mill_id, resource, None)?;
        let envelope = self.post::<Value>(url, body).await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    /// Replace a record.
    ///
    /// `PUT /mills/{mill_id}/{resource}/{id}`; returns the stored record.
    pub async fn update_record(
        &self,
        mill_id: &str,
        resource: &str,
        id: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        let url = self.resource_url(mill_id, resource, Some(id))?;
        let envelope = self.put::<Value>(url, body).await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    /// Delete a record.
    ///
    /// `DELETE /mills/{mill_id}/{resource}/{id}`
    pub async fn delete_record(&self, mill_id: &str, resource: &str, id: &str) -> Result<(), Error> {
        let url = self.resource_url(mill_id, resource, Some(id))?;
        let _ = self.delete::<Value>(url, None::<&Value>).await?;
        Ok(())
    }

    /// Delete several records in one call.
    ///
    /// `DELETE /mills/{mill_id}/{resource}/bulk` with `{"ids": [...]}`
    pub async fn bulk_delete_records(
        &self,
        mill_id: &str,
        resource: &str,
        ids: &[String],
    ) -> Result<(), Error> {
        let url = self.resource_url(mill_id, resource, Some("bulk"))?;
        debug!(resource, count = ids.len(), "bulk deleting records");
        let _ = self
            .delete::<Value>(url, Some(&BulkDeleteBody { ids }))
            .await?;
        Ok(())
    }

    /// Create several records in one call (spreadsheet import).
    ///
    /// `POST /mills/{mill_id}/{resource}/bulk` with `{"rows": [...]}`
    pub async fn bulk_create_records(
        &self,
        mill_id: &str,
        resource: &str,
        rows: &[Value],
    ) -> Result<Value, Error> {
        let url = self.resource_url(mill_id, resource, Some("bulk"))?;
        debug!(resource, count = rows.len(), "bulk creating records");
        let envelope = self.post::<Value>(url, &BulkCreateBody { rows }).await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}
