// ── In-memory state tree ──
//
// Concurrent storage with O(1) lookups and push-based change
// notification. Nodes and leaves live in separate `DashMap`s; every
// applied write is appended to the leaf's history and broadcast.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::store::{StateStore, StateWrite, WriteNotification, WriteOutcome};
use super::stream::StateChangeStream;
use crate::error::CoreError;
use crate::model::{LeafCommon, NodeCommon, State, StatePath, StateValue};
use crate::subscription::{Listener, ListenerRegistry, SubscriptionId};

const CHANGE_CHANNEL_SIZE: usize = 256;

/// One applied write (or deletion) as seen on the change feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange {
    pub path: StatePath,
    pub state: Option<State>,
}

/// Flattened view of one tree entry, ordered by path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entry", rename_all = "lowercase")]
pub enum TreeEntry {
    Node {
        path: StatePath,
        common: NodeCommon,
    },
    Leaf {
        path: StatePath,
        common: LeafCommon,
        state: Option<State>,
    },
}

impl TreeEntry {
    pub fn path(&self) -> &StatePath {
        match self {
            Self::Node { path, .. } | Self::Leaf { path, .. } => path,
        }
    }
}

struct Leaf {
    common: LeafCommon,
    state: Option<State>,
    history: Vec<State>,
}

/// Thread-safe state tree kept entirely in memory.
pub struct MemoryStateStore {
    nodes: DashMap<StatePath, NodeCommon>,
    leaves: DashMap<StatePath, Leaf>,
    listeners: ListenerRegistry<StatePath, WriteNotification>,
    /// Flipped off to simulate an unreachable backend.
    available: AtomicBool,
    /// Applied writes across all leaves.
    write_count: AtomicU64,
    changes: broadcast::Sender<Arc<StateChange>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            nodes: DashMap::new(),
            leaves: DashMap::new(),
            listeners: ListenerRegistry::new(),
            available: AtomicBool::new(true),
            write_count: AtomicU64::new(0),
            changes,
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn state(&self, path: &StatePath) -> Option<State> {
        self.leaves.get(path).and_then(|leaf| leaf.state.clone())
    }

    pub fn value(&self, path: &StatePath) -> Option<StateValue> {
        self.state(path).map(|s| s.val)
    }

    pub fn leaf_common(&self, path: &StatePath) -> Option<LeafCommon> {
        self.leaves.get(path).map(|leaf| leaf.common.clone())
    }

    pub fn node_common(&self, path: &StatePath) -> Option<NodeCommon> {
        self.nodes.get(path).map(|node| node.clone())
    }

    /// Every applied write to `path`, oldest first.
    pub fn history(&self, path: &StatePath) -> Vec<State> {
        self.leaves
            .get(path)
            .map(|leaf| leaf.history.clone())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// All nodes and leaves, sorted by path.
    pub fn snapshot(&self) -> Vec<TreeEntry> {
        let mut entries: Vec<TreeEntry> = self
            .nodes
            .iter()
            .map(|r| TreeEntry::Node {
                path: r.key().clone(),
                common: r.value().clone(),
            })
            .chain(self.leaves.iter().map(|r| TreeEntry::Leaf {
                path: r.key().clone(),
                common: r.value().common.clone(),
                state: r.value().state.clone(),
            }))
            .collect();
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        entries
    }

    /// Entries at or below `root`.
    pub fn subtree(&self, root: &StatePath) -> Vec<TreeEntry> {
        self.snapshot()
            .into_iter()
            .filter(|e| e.path() == root || e.path().starts_with(root))
            .collect()
    }

    // ── Change feed ──────────────────────────────────────────────────

    pub fn changes(&self) -> broadcast::Receiver<Arc<StateChange>> {
        self.changes.subscribe()
    }

    pub fn subscribe_changes(&self) -> StateChangeStream {
        StateChangeStream::new(self.changes.subscribe())
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Remove a leaf; write subscribers receive a payload-less notification.
    pub fn delete_leaf(&self, path: &StatePath) -> bool {
        if self.leaves.remove(path).is_none() {
            return false;
        }
        self.publish(path, None);
        true
    }

    fn ensure_available(&self, path: &StatePath) -> Result<(), CoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoreError::store_unavailable(path, "memory store switched offline"))
        }
    }

    fn apply(&self, path: &StatePath, write: StateWrite, only_if_changed: bool) -> Result<WriteOutcome, CoreError> {
        self.ensure_available(path)?;
        let state = {
            let mut leaf = self
                .leaves
                .get_mut(path)
                .ok_or_else(|| CoreError::UnknownState {
                    path: path.to_string(),
                })?;

            if only_if_changed
                && leaf
                    .state
                    .as_ref()
                    .is_some_and(|s| s.same_as(write.value(), write.is_confirmed()))
            {
                return Ok(WriteOutcome::Unchanged);
            }

            if let Some(kind) = write.value().kind() {
                if kind != leaf.common.kind {
                    warn!(%path, expected = %leaf.common.kind, got = %kind, "value type does not match leaf type");
                }
            }

            let state = write.into_state();
            leaf.state = Some(state.clone());
            leaf.history.push(state.clone());
            state
        };

        self.write_count.fetch_add(1, Ordering::SeqCst);
        debug!(%path, val = %state.val, ack = state.ack, "state written");
        self.publish(path, Some(state));
        Ok(WriteOutcome::Written)
    }

    /// Notify write subscribers and the change feed. Called with no map guard held.
    fn publish(&self, path: &StatePath, state: Option<State>) {
        self.listeners.emit(path, &state);
        let _ = self.changes.send(Arc::new(StateChange {
            path: path.clone(),
            state,
        }));
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn create_node_if_absent(
        &self,
        path: &StatePath,
        common: NodeCommon,
    ) -> Result<bool, CoreError> {
        self.ensure_available(path)?;
        match self.nodes.entry(path.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(common);
                debug!(%path, "node created");
                Ok(true)
            }
        }
    }

    async fn create_leaf_if_absent(
        &self,
        path: &StatePath,
        common: LeafCommon,
    ) -> Result<bool, CoreError> {
        self.ensure_available(path)?;
        match self.leaves.entry(path.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Leaf {
                    common,
                    state: None,
                    history: Vec::new(),
                });
                debug!(%path, "leaf created");
                Ok(true)
            }
        }
    }

    async fn write(&self, path: &StatePath, write: StateWrite) -> Result<WriteOutcome, CoreError> {
        self.apply(path, write, false)
    }

    async fn write_if_changed(
        &self,
        path: &StatePath,
        write: StateWrite,
    ) -> Result<WriteOutcome, CoreError> {
        self.apply(path, write, true)
    }

    async fn get_state(&self, path: &StatePath) -> Result<Option<State>, CoreError> {
        self.ensure_available(path)?;
        Ok(self.state(path))
    }

    async fn on_write(
        &self,
        path: &StatePath,
        listener: Arc<dyn Listener<WriteNotification>>,
    ) -> Result<SubscriptionId, CoreError> {
        self.ensure_available(path)?;
        Ok(self.listeners.register(path.clone(), listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.unregister(id);
    }
}
