// ── CRUD facade ──
//
// Every write goes through here. A mutation runs as its own task so that
// dropping the caller (form unmounted, dialog closed) never cancels it.
// On success the whole resource family is invalidated and then one
// success notice is sent; on failure the cache is left alone and one
// error notice is sent. Nothing is retried.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dialog::{DialogHandle, DialogMode, RowSelection};
use crate::error::CoreError;
use crate::form::FormValues;
use crate::import::FileParser;
use crate::model::{Resource, Row, RowId};
use crate::scope::{Notice, Scope};

enum Mutation {
    Create(Value),
    Update(RowId, Value),
    Delete(RowId),
    BulkDelete(Vec<RowId>),
    Import { rows: Vec<Value>, summary: String },
}

impl Mutation {
    fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
            Self::BulkDelete(_) => "bulk-delete",
            Self::Import { .. } => "import",
        }
    }
}

/// A write in flight. Awaiting yields its result; dropping it detaches
/// the write, which still completes and still invalidates.
#[must_use = "dropping a PendingMutation detaches it; await it to observe the result"]
pub struct PendingMutation {
    handle: JoinHandle<Result<Value, CoreError>>,
}

impl Future for PendingMutation {
    type Output = Result<Value, CoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| Err(CoreError::Internal(format!("mutation task failed: {e}"))))
        })
    }
}

/// Create / update / delete / bulk-delete / import for one resource family.
#[derive(Debug, Clone)]
pub struct ResourceCrudFacade {
    scope: Scope,
    resource: Resource,
}

impl ResourceCrudFacade {
    pub fn new(scope: Scope, resource: Resource) -> Self {
        Self { scope, resource }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    // ── Raw mutations ────────────────────────────────────────────────

    /// Must be called from within a tokio runtime, as must the other
    /// mutations.
    pub fn create(&self, payload: Value) -> PendingMutation {
        self.spawn(Mutation::Create(payload))
    }

    pub fn update(&self, id: RowId, payload: Value) -> PendingMutation {
        self.spawn(Mutation::Update(id, payload))
    }

    pub fn delete(&self, id: RowId) -> PendingMutation {
        self.spawn(Mutation::Delete(id))
    }

    pub fn bulk_delete(&self, ids: Vec<RowId>) -> PendingMutation {
        self.spawn(Mutation::BulkDelete(ids))
    }

    /// Parse `path` with `parser` and send the rows to the bulk endpoint.
    ///
    /// A parse failure or a file without rows is reported as a failure
    /// and never reaches the transport.
    pub async fn import(&self, parser: &dyn FileParser, path: &Path) -> Result<Value, CoreError> {
        let parsed = match parser.parse_file(path) {
            Ok(parsed) if parsed.data.is_empty() => Err(CoreError::Import {
                message: format!("No rows found in {}", path.display()),
            }),
            other => other,
        };
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(resource = %self.resource, error = %e, "import rejected before upload");
                self.scope.notifier().notify(failure_notice(&e));
                return Err(e);
            }
        };
        debug!(
            resource = %self.resource,
            rows = parsed.data.len(),
            failed = parsed.stats.failed_rows,
            "parsed import file"
        );
        self.spawn(Mutation::Import {
            rows: parsed.data,
            summary: parsed.stats.summary(),
        })
        .await
    }

    // ── Dialog-bound actions ─────────────────────────────────────────

    /// Submit the form behind `dialog`: create in add mode, update in
    /// edit mode. Closes the dialog on success; leaves it open on failure.
    pub async fn submit(&self, dialog: &DialogHandle, values: &FormValues) -> Result<Row, CoreError> {
        let state = dialog.state();
        let pending = match (state.open, state.current_row.as_ref().and_then(Row::id)) {
            (Some(DialogMode::Add), _) => self.create(values.to_payload()),
            (Some(DialogMode::Edit), Some(id)) => self.update(id.clone(), values.to_payload()),
            (mode, _) => {
                return Err(CoreError::InvalidState {
                    message: format!("cannot submit a form while the dialog is {}", describe(mode)),
                });
            }
        };
        let stored = pending.await?;
        dialog.close();
        Ok(Row::from_value(stored))
    }

    /// Confirm the single-row delete dialog.
    pub async fn confirm_delete(&self, dialog: &DialogHandle) -> Result<(), CoreError> {
        let state = dialog.state();
        let id = match (state.open, state.current_row.as_ref().and_then(Row::id)) {
            (Some(DialogMode::Delete), Some(id)) => id.clone(),
            (mode, _) => {
                return Err(CoreError::InvalidState {
                    message: format!("cannot confirm a delete while the dialog is {}", describe(mode)),
                });
            }
        };
        self.delete(id).await?;
        dialog.close();
        Ok(())
    }

    /// Confirm the bulk-delete dialog for exactly the selected rows.
    /// Clears the selection and closes the dialog on success.
    pub async fn confirm_bulk_delete(
        &self,
        dialog: &DialogHandle,
        selection: &mut RowSelection,
    ) -> Result<(), CoreError> {
        let mode = dialog.mode();
        if mode != Some(DialogMode::DeleteMulti) {
            return Err(CoreError::InvalidState {
                message: format!("cannot confirm a bulk delete while the dialog is {}", describe(mode)),
            });
        }
        if selection.is_empty() {
            return Err(CoreError::InvalidState {
                message: "no rows selected".into(),
            });
        }
        self.bulk_delete(selection.ids()).await?;
        selection.clear();
        dialog.close();
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn spawn(&self, mutation: Mutation) -> PendingMutation {
        let scope = self.scope.clone();
        let resource = self.resource.clone();
        PendingMutation {
            handle: tokio::spawn(run_mutation(scope, resource, mutation)),
        }
    }
}

async fn run_mutation(
    scope: Scope,
    resource: Resource,
    mutation: Mutation,
) -> Result<Value, CoreError> {
    let transport = scope.transport();
    let mill_id = scope.mill_id();
    let family = resource.path();
    let verb = mutation.verb();

    let (result, success) = match mutation {
        Mutation::Create(body) => (
            transport.create(mill_id, family, &body).await,
            Notice::success(format!("{} created", resource.label())),
        ),
        Mutation::Update(id, body) => (
            transport.update(mill_id, family, id.as_str(), &body).await,
            Notice::success(format!("{} updated", resource.label())),
        ),
        Mutation::Delete(id) => (
            transport
                .delete(mill_id, family, id.as_str())
                .await
                .map(|()| Value::Null),
            Notice::success(format!("{} deleted", resource.label())),
        ),
        Mutation::BulkDelete(ids) => {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            (
                transport
                    .bulk_delete(mill_id, family, &ids)
                    .await
                    .map(|()| Value::Null),
                Notice::success(format!("{} records deleted", ids.len())),
            )
        }
        Mutation::Import { rows, summary } => (
            transport.bulk_create(mill_id, family, &rows).await,
            Notice::success(format!("{} import complete", resource.label()))
                .with_description(summary),
        ),
    };

    match &result {
        Ok(_) => {
            scope.cache().invalidate_family(family);
            info!(resource = family, verb, "write acknowledged");
            scope.notifier().notify(success);
        }
        Err(e) => {
            warn!(resource = family, verb, error = %e, "write failed");
            scope.notifier().notify(failure_notice(e));
        }
    }
    result
}

fn failure_notice(err: &CoreError) -> Notice {
    Notice::error(err.notice_message())
}

fn describe(mode: Option<DialogMode>) -> String {
    mode.map_or_else(|| "closed".to_owned(), |m| format!("in {m} mode"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::dialog::RowMode;
    use crate::error::GENERIC_FAILURE;
    use crate::form::FieldValue;
    use crate::import::{ImportStats, ParsedFile};
    use crate::list::ListController;
    use crate::query::{MemoryQueryStore, QueryStore};
    use crate::scope::NoticeKind;
    use crate::testing::{Call, FakeTransport, RecordingNotifier, scope_with, seeded_rows};

    struct Fixture {
        transport: Arc<FakeTransport>,
        notifier: Arc<RecordingNotifier>,
        scope: Scope,
        facade: ResourceCrudFacade,
    }

    fn fixture(rows: u64) -> Fixture {
        let transport = FakeTransport::with_rows(seeded_rows(rows));
        let notifier = Arc::new(RecordingNotifier::default());
        let scope = scope_with(&transport, &notifier);
        let facade = ResourceCrudFacade::new(scope.clone(), Resource::new("brokers", "Broker"));
        Fixture {
            transport,
            notifier,
            scope,
            facade,
        }
    }

    fn mount_list(scope: &Scope) -> ListController {
        ListController::mount(
            scope.clone(),
            Resource::new("brokers", "Broker"),
            Arc::new(MemoryQueryStore::default()) as Arc<dyn QueryStore>,
        )
    }

    fn row(id: &str) -> Row {
        Row::from_value(json!({ "_id": id }))
    }

    #[tokio::test]
    async fn add_flow_puts_new_row_first() {
        let fx = fixture(3);
        let list = mount_list(&fx.scope);
        let mut stream = list.subscribe();
        stream.wait_for(|s| !s.is_loading).await.unwrap();

        let dialog = DialogHandle::new();
        dialog.open_add();
        let values = FormValues::new().with("name", FieldValue::text("Venkat"));
        let created = fx.facade.submit(&dialog, &values).await.unwrap();

        assert_eq!(dialog.mode(), None);
        assert_eq!(created.display_field("name"), "Venkat");

        let state = stream
            .wait_for(|s| !s.is_loading && s.data.len() == 4)
            .await
            .unwrap();
        assert_eq!(state.data[0].id(), created.id());

        let notices = fx.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert_eq!(notices[0].message, "Broker created");
    }

    #[tokio::test]
    async fn edit_mode_updates_current_row() {
        let fx = fixture(2);
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Edit, row("r1"));
        let values = FormValues::new().with("name", FieldValue::text("Renamed"));

        fx.facade.submit(&dialog, &values).await.unwrap();

        assert_eq!(
            fx.transport.calls(),
            vec![Call::Update("r1".into(), json!({"name": "Renamed"}))]
        );
    }

    #[tokio::test]
    async fn bulk_delete_sends_exactly_the_selection() {
        let fx = fixture(5);
        let dialog = DialogHandle::new();
        let mut selection: RowSelection = ["r4", "r1", "r3"].into_iter().map(RowId::from).collect();
        dialog.open_bulk();

        fx.facade
            .confirm_bulk_delete(&dialog, &mut selection)
            .await
            .unwrap();

        assert_eq!(
            fx.transport.calls(),
            vec![Call::BulkDelete(vec!["r4".into(), "r1".into(), "r3".into()])]
        );
        assert!(selection.is_empty());
        assert_eq!(dialog.mode(), None);
        assert_eq!(fx.transport.rows().len(), 2);
        assert_eq!(fx.notifier.notices()[0].message, "3 records deleted");
    }

    #[tokio::test]
    async fn failure_leaves_cache_and_dialog_alone() {
        let fx = fixture(3);
        let list = mount_list(&fx.scope);
        list.subscribe().wait_for(|s| !s.is_loading).await.unwrap();
        let cached_before = fx.scope.cache().len("brokers");
        let version_before = fx.scope.cache().version("brokers");

        fx.transport.fail_with("Rate must be positive");
        let dialog = DialogHandle::new();
        dialog.open_add();
        let err = fx
            .facade
            .submit(&dialog, &FormValues::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { .. }));
        assert_eq!(dialog.mode(), Some(DialogMode::Add));
        assert_eq!(fx.scope.cache().len("brokers"), cached_before);
        assert_eq!(fx.scope.cache().version("brokers"), version_before);
        assert_eq!(
            fx.notifier.notices(),
            vec![Notice::error("Rate must be positive")]
        );
    }

    #[tokio::test]
    async fn failure_without_message_uses_generic_text() {
        let fx = fixture(1);
        fx.transport.fail_with("");
        fx.facade.delete("r1".into()).await.unwrap_err();
        assert_eq!(fx.notifier.notices(), vec![Notice::error(GENERIC_FAILURE)]);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_write() {
        let fx = fixture(2);
        let mut versions = fx.scope.cache().subscribe("brokers");

        drop(fx.facade.delete("r2".into()));

        versions.changed().await.unwrap();
        assert_eq!(fx.transport.calls(), vec![Call::Delete("r2".into())]);
        assert_eq!(fx.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn submit_in_view_mode_is_a_state_error() {
        let fx = fixture(1);
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::View, row("r1"));

        let err = fx
            .facade
            .submit(&dialog, &FormValues::new())
            .await
            .unwrap_err();

        assert!(err.is_state_error());
        assert!(fx.transport.calls().is_empty());
        assert!(fx.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn confirm_delete_closes_dialog() {
        let fx = fixture(2);
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Delete, row("r1"));

        fx.facade.confirm_delete(&dialog).await.unwrap();

        assert_eq!(fx.transport.calls(), vec![Call::Delete("r1".into())]);
        assert_eq!(dialog.mode(), None);
    }

    struct StubParser(ParsedFile);

    impl FileParser for StubParser {
        fn parse_file(&self, _path: &Path) -> Result<ParsedFile, CoreError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn import_posts_rows_and_describes_stats() {
        let fx = fixture(0);
        let parser = StubParser(ParsedFile {
            data: vec![json!({"name": "A"}), json!({"name": "B"})],
            stats: ImportStats {
                total_rows: 3,
                success_rows: 2,
                failed_rows: 1,
                error_details: vec!["row 3: empty".into()],
            },
        });

        fx.facade
            .import(&parser, &PathBuf::from("brokers.csv"))
            .await
            .unwrap();

        assert_eq!(
            fx.transport.calls(),
            vec![Call::BulkCreate(vec![json!({"name": "A"}), json!({"name": "B"})])]
        );
        let notice = &fx.notifier.notices()[0];
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(
            notice.description.as_deref(),
            Some("2 of 3 rows imported, 1 skipped")
        );
    }

    #[tokio::test]
    async fn empty_import_never_reaches_transport() {
        let fx = fixture(0);
        let parser = StubParser(ParsedFile::default());

        let err = fx
            .facade
            .import(&parser, &PathBuf::from("empty.csv"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Import { .. }));
        assert!(fx.transport.calls().is_empty());
        assert_eq!(fx.notifier.notices().len(), 1);
        assert_eq!(fx.notifier.notices()[0].kind, NoticeKind::Error);
    }
}
