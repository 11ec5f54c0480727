// ── State store contract ──
//
// The hierarchical state store is an external collaborator. The bridge
// depends only on this trait; `MemoryStateStore` is the in-process
// implementation used by the CLI and the tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{LeafCommon, NodeCommon, State, StatePath, StateValue};
use crate::subscription::{Listener, SubscriptionId};

/// The two kinds of write the bridge can issue.
///
/// `Confirmed` reports a value the device actually has (ack = true).
/// `Requested` asks for a change that nobody has confirmed yet (ack = false).
/// Write handlers only ever react to `Requested` writes, so a confirmed
/// write can never feed back into the handler that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum StateWrite {
    Confirmed(StateValue),
    Requested(StateValue),
}

impl StateWrite {
    pub fn value(&self) -> &StateValue {
        match self {
            Self::Confirmed(v) | Self::Requested(v) => v,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn into_state(self) -> State {
        match self {
            Self::Confirmed(v) => State::new(v, true),
            Self::Requested(v) => State::new(v, false),
        }
    }
}

/// Result of a write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// `write_if_changed` found value and ack already in place.
    Unchanged,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Payload of a write notification. `None` means the notification carried
/// no state (e.g. the leaf was deleted).
pub type WriteNotification = Option<State>;

/// Primitives the bridge needs from a hierarchical state store.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Create a channel node unless one exists. Returns `true` if created.
    async fn create_node_if_absent(
        &self,
        path: &StatePath,
        common: NodeCommon,
    ) -> Result<bool, CoreError>;

    /// Create a leaf unless one exists. Existing metadata is never touched.
    /// Returns `true` if created.
    async fn create_leaf_if_absent(
        &self,
        path: &StatePath,
        common: LeafCommon,
    ) -> Result<bool, CoreError>;

    /// Unconditionally write a leaf.
    async fn write(&self, path: &StatePath, write: StateWrite) -> Result<WriteOutcome, CoreError>;

    /// Write only if value or acknowledgement differ from the current state.
    async fn write_if_changed(
        &self,
        path: &StatePath,
        write: StateWrite,
    ) -> Result<WriteOutcome, CoreError>;

    async fn get_state(&self, path: &StatePath) -> Result<Option<State>, CoreError>;

    /// Subscribe to every write on `path`, confirmed or requested.
    async fn on_write(
        &self,
        path: &StatePath,
        listener: Arc<dyn Listener<WriteNotification>>,
    ) -> Result<SubscriptionId, CoreError>;

    /// Drop a subscription made with [`on_write`](Self::on_write).
    fn unsubscribe(&self, id: SubscriptionId);

    // ── Provided write variants ──────────────────────────────────────

    async fn write_confirmed(
        &self,
        path: &StatePath,
        value: StateValue,
    ) -> Result<WriteOutcome, CoreError> {
        self.write(path, StateWrite::Confirmed(value)).await
    }

    async fn write_confirmed_if_changed(
        &self,
        path: &StatePath,
        value: StateValue,
    ) -> Result<WriteOutcome, CoreError> {
        self.write_if_changed(path, StateWrite::Confirmed(value)).await
    }

    async fn write_requested(
        &self,
        path: &StatePath,
        value: StateValue,
    ) -> Result<WriteOutcome, CoreError> {
        self.write(path, StateWrite::Requested(value)).await
    }
}
