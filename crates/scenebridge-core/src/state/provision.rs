// ── Idempotent provisioning ──
//
// Creates nodes and leaves from entity shape. Metadata is written once;
// the value is confirmed on every call.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::store::StateStore;
use crate::error::CoreError;
use crate::model::{LeafCommon, NodeCommon, StatePath, StateValue};

/// Ensures state-tree entries exist before anything writes to them.
///
/// Check-and-create plus the initial write run under one async mutex, so
/// concurrent binders on a multi-threaded runtime cannot interleave on the
/// same path even if the backing store has no atomic create.
pub struct StateProvisioner {
    store: Arc<dyn StateStore>,
    lock: Mutex<()>,
}

impl StateProvisioner {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Create a channel node unless it already exists.
    pub async fn ensure_node(&self, path: &StatePath, common: NodeCommon) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        if self.store.create_node_if_absent(path, common).await? {
            debug!(%path, "provisioned node");
        }
        Ok(())
    }

    /// Create a leaf unless it exists, then confirm `initial` as its value.
    ///
    /// Repeat calls leave the original metadata in place.
    pub async fn ensure_leaf(
        &self,
        path: &StatePath,
        common: LeafCommon,
        initial: impl Into<StateValue>,
    ) -> Result<(), CoreError> {
        let initial = initial.into();
        let _guard = self.lock.lock().await;
        let created = self.store.create_leaf_if_absent(path, common).await?;
        self.store.write_confirmed(path, initial).await?;
        debug!(%path, created, "provisioned leaf");
        Ok(())
    }
}
