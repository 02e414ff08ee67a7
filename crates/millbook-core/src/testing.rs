// In-memory transport and notifier shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use millbook_api::{RawPagination, RecordPage};

use crate::error::CoreError;
use crate::scope::{Notice, Notifier, Scope};
use crate::transport::ResourceTransport;

/// A transport call as observed by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List(Vec<(String, String)>),
    Create(Value),
    Update(String, Value),
    Delete(String),
    BulkDelete(Vec<String>),
    BulkCreate(Vec<Value>),
}

type Gate = oneshot::Sender<Result<RecordPage, CoreError>>;

#[derive(Default)]
struct FakeState {
    rows: Vec<Value>,
    calls: Vec<Call>,
    next_id: u64,
    fail_with: Option<String>,
    gated: bool,
    gates: Vec<Gate>,
}

/// Tiny in-memory backend: rows sorted by `createdAt` descending,
/// optional forced failure, optional gating of list responses.
#[derive(Default)]
pub(crate) struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub(crate) fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.next_id = u64::try_from(rows.len()).unwrap();
            state.rows = rows;
        }
        Arc::new(fake)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List(_)))
            .count()
    }

    pub(crate) fn rows(&self) -> Vec<Value> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Make every subsequent call fail with `message`.
    pub(crate) fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().fail_with = Some(message.to_owned());
    }

    /// Hold list responses until released via [`take_gates`](Self::take_gates).
    pub(crate) fn gate_lists(&self) {
        self.state.lock().unwrap().gated = true;
    }

    pub(crate) fn take_gates(&self) -> Vec<Gate> {
        std::mem::take(&mut self.state.lock().unwrap().gates)
    }

    fn record(&self, call: Call) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match &state.fail_with {
            Some(message) => Err(CoreError::Api {
                message: message.clone(),
                status: Some(422),
            }),
            None => Ok(()),
        }
    }

    fn page(&self, params: &[(String, String)]) -> RecordPage {
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let page = param("page").unwrap_or(1);
        let limit = param("limit").unwrap_or(10);
        let mut rows = self.rows();
        rows.sort_by_key(|r| std::cmp::Reverse(r["createdAt"].as_u64().unwrap_or(0)));
        let total = rows.len();
        RecordPage {
            rows: rows.into_iter().skip((page - 1) * limit).take(limit).collect(),
            pagination: Some(RawPagination {
                total: Some(u64::try_from(total).unwrap()),
                ..RawPagination::default()
            }),
        }
    }

    pub(crate) fn page_of(ids: &[&str]) -> RecordPage {
        RecordPage {
            rows: ids.iter().map(|id| json!({ "_id": id })).collect(),
            pagination: Some(RawPagination {
                total: Some(u64::try_from(ids.len()).unwrap()),
                ..RawPagination::default()
            }),
        }
    }
}

impl ResourceTransport for FakeTransport {
    fn list<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        params: &'a [(String, String)],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        Box::pin(async move {
            self.record(Call::List(params.to_vec()))?;
            let gate = {
                let mut state = self.state.lock().unwrap();
                if state.gated {
                    let (tx, rx) = oneshot::channel();
                    state.gates.push(tx);
                    Some(rx)
                } else {
                    None
                }
            };
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(CoreError::Internal("gate dropped".into()))),
                None => Ok(self.page(params)),
            }
        })
    }

    fn create<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            self.record(Call::Create(body.clone()))?;
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let mut row = body.clone();
            row["_id"] = json!(format!("r{}", state.next_id));
            row["createdAt"] = json!(state.next_id);
            state.rows.push(row.clone());
            Ok(row)
        })
    }

    fn update<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        id: &'a str,
        body: &'a Value,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            self.record(Call::Update(id.to_owned(), body.clone()))?;
            let mut state = self.state.lock().unwrap();
            let row = state
                .rows
                .iter_mut()
                .find(|r| r["_id"] == id)
                .ok_or_else(|| CoreError::NotFound {
                    resource: "fake".into(),
                    identifier: id.to_owned(),
                })?;
            if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
                target.extend(patch.clone());
            }
            Ok(row.clone())
        })
    }

    fn delete<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            self.record(Call::Delete(id.to_owned()))?;
            self.state.lock().unwrap().rows.retain(|r| r["_id"] != id);
            Ok(())
        })
    }

    fn bulk_delete<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            self.record(Call::BulkDelete(ids.to_vec()))?;
            self.state
                .lock()
                .unwrap()
                .rows
                .retain(|r| !ids.iter().any(|id| r["_id"] == id.as_str()));
            Ok(())
        })
    }

    fn bulk_create<'a>(
        &'a self,
        _mill_id: &'a str,
        _resource: &'a str,
        rows: &'a [Value],
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            self.record(Call::BulkCreate(rows.to_vec()))?;
            Ok(json!({ "inserted": rows.len() }))
        })
    }
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub(crate) fn scope_with(
    transport: &Arc<FakeTransport>,
    notifier: &Arc<RecordingNotifier>,
) -> Scope {
    Scope::new(
        "mill-1",
        Arc::clone(transport) as Arc<dyn ResourceTransport>,
        Arc::clone(notifier) as Arc<dyn Notifier>,
    )
}

/// `n` rows `r1..=rn` with ascending `createdAt`.
pub(crate) fn seeded_rows(n: u64) -> Vec<Value> {
    (1..=n)
        .map(|i| json!({ "_id": format!("r{i}"), "createdAt": i, "name": format!("row {i}") }))
        .collect()
}
