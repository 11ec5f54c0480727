// ── State -> entity reaction ──

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::Disposable;
use crate::error::CoreError;
use crate::model::StatePath;
use crate::state::{StateStore, WriteNotification};
use crate::subscription::SubscriptionId;

type Reaction = Arc<dyn Fn(WriteNotification) -> BoxFuture<'static, Result<(), CoreError>> + Send + Sync>;

/// Reacts to externally requested writes on one state path.
///
/// Construction does not subscribe; call [`initialize`](Self::initialize)
/// when the handler should start accepting traffic. Only unacknowledged
/// writes reach the reaction. Confirmed writes (including the ones the
/// reaction itself issues) are dropped before dispatch.
pub struct WriteHandler {
    store: Arc<dyn StateStore>,
    path: StatePath,
    reaction: Reaction,
    subscription: Mutex<Option<SubscriptionId>>,
    initialized: AtomicBool,
    disposed: AtomicBool,
}

impl WriteHandler {
    pub fn new<F, Fut>(store: Arc<dyn StateStore>, path: StatePath, reaction: F) -> Self
    where
        F: Fn(WriteNotification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
    {
        Self {
            store,
            path,
            reaction: Arc::new(move |notification| reaction(notification).boxed()),
            subscription: Mutex::new(None),
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &StatePath {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Subscribe to write notifications and start the reaction task.
    ///
    /// Calling it again is a no-op. Fails if the store refuses the
    /// subscription, in which case the handler may be initialized later.
    pub async fn initialize(&self) -> Result<(), CoreError> {
        if self.is_disposed() || self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Arc::new(move |notification: WriteNotification| {
            let _ = tx.send(notification);
        });
        let id = match self.store.on_write(&self.path, listener).await {
            Ok(id) => id,
            Err(e) => {
                self.initialized.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        {
            let mut slot = self.subscription_slot();
            // dispose() may have run while the subscription was pending.
            if self.is_disposed() {
                drop(slot);
                self.store.unsubscribe(id);
                return Ok(());
            }
            *slot = Some(id);
        }

        tokio::spawn(drain_writes(self.path.clone(), rx, Arc::clone(&self.reaction)));
        debug!(path = %self.path, subscription = %id, "write handler initialized");
        Ok(())
    }

    fn subscription_slot(&self) -> MutexGuard<'_, Option<SubscriptionId>> {
        self.subscription.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the reaction for `notification` directly, bypassing the ack
    /// filter and the queue.
    pub async fn handle(&self, notification: WriteNotification) -> Result<(), CoreError> {
        (self.reaction)(notification).await
    }
}

/// Runs until the store drops the listener and the queue is empty.
async fn drain_writes(path: StatePath, mut rx: mpsc::UnboundedReceiver<WriteNotification>, reaction: Reaction) {
    while let Some(notification) = rx.recv().await {
        if notification.as_ref().is_some_and(|state| state.ack) {
            continue;
        }
        if let Err(e) = reaction(notification).await {
            warn!(%path, error = %e, "write reaction failed");
        }
    }
    debug!(%path, "write handler stopped");
}

impl Disposable for WriteHandler {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let subscription = self.subscription_slot().take();
        // Requests already queued still run once the listener is gone.
        if let Some(id) = subscription {
            self.store.unsubscribe(id);
        }
        debug!(path = %self.path, "write handler disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn label(&self) -> String {
        format!("write({})", self.path)
    }
}

impl Drop for WriteHandler {
    fn drop(&mut self) {
        self.dispose();
    }
}
