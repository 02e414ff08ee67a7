// ── Reactive list-state streams ──
//
// Subscription type for consuming list controller state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::list::ListState;

/// A subscription to one list controller's state.
///
/// Reacts to changes via [`changed()`](Self::changed) and
/// [`wait_for()`](Self::wait_for). Both return `None` once the controller
/// has been dropped.
pub struct ListStream {
    receiver: watch::Receiver<Arc<ListState>>,
}

impl ListStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ListState>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next change, returning the new snapshot.
    pub async fn changed(&mut self) -> Option<Arc<ListState>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until a snapshot satisfies `predicate`, returning it. The
    /// current snapshot is checked first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&ListState) -> bool,
    ) -> Option<Arc<ListState>> {
        let snap = self
            .receiver
            .wait_for(|state| predicate(state))
            .await
            .ok()?
            .clone();
        Some(snap)
    }
}
