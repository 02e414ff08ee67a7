// ── Dialog state machine ──
//
// One dialog per list page: add / edit / view / delete / bulk-delete,
// bound to at most one current row. Transitions are synchronous and do no
// I/O; the only timer is the deferred clear of `current_row` after close.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indexmap::IndexSet;
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tokio::sync::watch;

use crate::model::{Row, RowId};

/// Delay before `current_row` is cleared after a close.
pub const CLEAR_DELAY: Duration = Duration::from_millis(300);

/// Modes that operate on an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RowMode {
    Edit,
    View,
    Delete,
}

/// Which dialog is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DialogMode {
    Add,
    Edit,
    View,
    Delete,
    DeleteMulti,
}

impl From<RowMode> for DialogMode {
    fn from(mode: RowMode) -> Self {
        match mode {
            RowMode::Edit => Self::Edit,
            RowMode::View => Self::View,
            RowMode::Delete => Self::Delete,
        }
    }
}

/// `{open, current_row}`.
///
/// `open` in edit / view / delete implies a row; `open == Add` implies no
/// row. After a close the row may linger until the deferred clear runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogState {
    pub open: Option<DialogMode>,
    pub current_row: Option<Row>,
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Whether the state satisfies the mode/row pairing rules.
    pub fn is_consistent(&self) -> bool {
        match self.open {
            Some(DialogMode::Add) => self.current_row.is_none(),
            Some(DialogMode::Edit | DialogMode::View | DialogMode::Delete) => {
                self.current_row.is_some()
            }
            Some(DialogMode::DeleteMulti) | None => true,
        }
    }
}

/// Shared handle to one dialog. Clones observe and drive the same state.
#[derive(Clone)]
pub struct DialogHandle {
    state: Arc<watch::Sender<DialogState>>,
    /// Bumped on every transition; a pending clear only runs if nothing
    /// happened since it was scheduled.
    generation: Arc<AtomicU64>,
    clear_delay: Duration,
}

impl Default for DialogHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogHandle {
    pub fn new() -> Self {
        Self::with_clear_delay(CLEAR_DELAY)
    }

    pub fn with_clear_delay(clear_delay: Duration) -> Self {
        let (state, _) = watch::channel(DialogState::default());
        Self {
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            clear_delay,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialogState> {
        self.state.subscribe()
    }

    pub fn mode(&self) -> Option<DialogMode> {
        self.state.borrow().open
    }

    pub fn current_row(&self) -> Option<Row> {
        self.state.borrow().current_row.clone()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Open the add dialog with no current row.
    pub fn open_add(&self) {
        self.bump();
        self.state.send_modify(|s| {
            s.current_row = None;
            s.open = Some(DialogMode::Add);
        });
    }

    /// Open an edit / view / delete dialog for `row`.
    pub fn open_for(&self, mode: RowMode, row: Row) {
        self.bump();
        self.state.send_modify(|s| {
            s.current_row = Some(row);
            s.open = Some(mode.into());
        });
    }

    /// Open the bulk-delete confirmation. `current_row` is left as is.
    pub fn open_bulk(&self) {
        self.bump();
        self.state.send_modify(|s| s.open = Some(DialogMode::DeleteMulti));
    }

    /// Close the dialog; `current_row` is cleared after the clear delay.
    ///
    /// Outside a tokio runtime the row is cleared immediately.
    pub fn close(&self) {
        let generation = self.bump();
        self.state.send_modify(|s| s.open = None);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.state.send_modify(|s| s.current_row = None);
            return;
        };
        let state = Arc::clone(&self.state);
        let counter = Arc::clone(&self.generation);
        let delay = self.clear_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if counter.load(Ordering::SeqCst) == generation {
                state.send_if_modified(|s| {
                    let had_row = s.current_row.is_some();
                    if s.open.is_none() {
                        s.current_row = None;
                    }
                    had_row && s.current_row.is_none()
                });
            }
        });
    }

    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl fmt::Debug for DialogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHandle")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

// ── Row selection ───────────────────────────────────────────────────

/// Rows picked for bulk delete, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    ids: IndexSet<RowId>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.ids.shift_remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select(&mut self, id: RowId) {
        self.ids.insert(id);
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<RowId> for RowSelection {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn row(id: &str) -> Row {
        Row::from_value(json!({ "_id": id }))
    }

    #[test]
    fn add_clears_lingering_row() {
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Edit, row("r1"));
        dialog.close();
        dialog.open_add();
        assert_eq!(
            dialog.state(),
            DialogState {
                open: Some(DialogMode::Add),
                current_row: None,
            }
        );
    }

    #[test]
    fn close_without_runtime_clears_immediately() {
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::View, row("r1"));
        dialog.close();
        assert_eq!(dialog.state(), DialogState::default());
    }

    #[test]
    fn bulk_keeps_current_row() {
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Delete, row("r1"));
        dialog.open_bulk();
        assert_eq!(dialog.mode(), Some(DialogMode::DeleteMulti));
        assert_eq!(dialog.current_row(), Some(row("r1")));
    }

    #[test]
    fn any_call_sequence_stays_consistent() {
        let dialog = DialogHandle::new();
        let steps: [&dyn Fn(&DialogHandle); 6] = [
            &|d| d.open_add(),
            &|d| d.open_for(RowMode::Edit, row("a")),
            &|d| d.open_for(RowMode::View, row("b")),
            &|d| d.open_for(RowMode::Delete, row("c")),
            &DialogHandle::open_bulk,
            &DialogHandle::close,
        ];
        // Every ordered pair and triple of transitions.
        for a in &steps {
            for b in &steps {
                for c in &steps {
                    a(&dialog);
                    b(&dialog);
                    c(&dialog);
                    assert!(dialog.state().is_consistent(), "{:?}", dialog.state());
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn close_defers_clear() {
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Edit, row("r1"));
        dialog.close();

        assert_eq!(dialog.mode(), None);
        assert!(dialog.current_row().is_some());

        tokio::time::sleep(CLEAR_DELAY + Duration::from_millis(1)).await;
        assert!(dialog.current_row().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_cancels_pending_clear() {
        let dialog = DialogHandle::new();
        dialog.open_for(RowMode::Edit, row("r1"));
        dialog.close();
        dialog.open_for(RowMode::View, row("r2"));

        tokio::time::sleep(CLEAR_DELAY * 2).await;
        assert_eq!(dialog.mode(), Some(DialogMode::View));
        assert_eq!(dialog.current_row(), Some(row("r2")));
    }

    #[test]
    fn selection_keeps_pick_order() {
        let mut selection = RowSelection::new();
        selection.toggle("c".into());
        selection.toggle("a".into());
        selection.toggle("b".into());
        selection.toggle("a".into());
        selection.select("d".into());
        assert_eq!(
            selection.ids(),
            vec![RowId::from("c"), RowId::from("b"), RowId::from("d")]
        );
    }
}
