// ── Entity -> state projection ──

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::Disposable;
use crate::error::CoreError;
use crate::model::Observable;
use crate::subscription::SubscriptionId;

type Projection<V> = Arc<dyn Fn(V) -> BoxFuture<'static, Result<bool, CoreError>> + Send + Sync>;

/// Projects changes of one entity property into the state tree.
///
/// Each change event runs the projection exactly once, in emission order.
/// Events are queued per handler and drained by a single task, so a slow
/// projection delays later events of the same property but never drops or
/// merges them. Disposing stops new events; those already queued are
/// still projected. Must be created inside a tokio runtime.
pub struct ChangeHandler<E: Observable + ?Sized> {
    entity: Arc<E>,
    property: E::Property,
    subscription: SubscriptionId,
    projection: Projection<E::Value>,
    disposed: AtomicBool,
}

impl<E: Observable + ?Sized> ChangeHandler<E> {
    /// Register for `property` on `entity` and start delivering changes.
    ///
    /// `projection` returns whether it actually wrote; skipping unchanged
    /// values is its responsibility.
    pub fn new<F, Fut>(entity: Arc<E>, property: E::Property, projection: F) -> Self
    where
        F: Fn(E::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, CoreError>> + Send + 'static,
    {
        let projection: Projection<E::Value> = Arc::new(move |value| projection(value).boxed());
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = entity.on_property_change(
            property,
            Arc::new(move |value: E::Value| {
                // Receiver gone means the drain task ended.
                let _ = tx.send(value);
            }),
        );

        tokio::spawn(drain_changes(property, rx, Arc::clone(&projection)));
        debug!(%property, %subscription, "change handler registered");

        Self {
            entity,
            property,
            subscription,
            projection,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn property(&self) -> E::Property {
        self.property
    }

    /// Run the projection for `value` directly, bypassing the queue.
    pub async fn handle(&self, value: E::Value) -> Result<bool, CoreError> {
        (self.projection)(value).await
    }
}

/// Runs until the listener is unregistered and the queue is empty.
async fn drain_changes<P, V>(property: P, mut rx: mpsc::UnboundedReceiver<V>, projection: Projection<V>)
where
    P: std::fmt::Display,
{
    while let Some(value) = rx.recv().await {
        match projection(value).await {
            Ok(applied) => debug!(%property, applied, "projected property change"),
            Err(e) => warn!(%property, error = %e, "property projection failed"),
        }
    }
    debug!(%property, "change handler stopped");
}

impl<E: Observable + ?Sized> Disposable for ChangeHandler<E> {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the listener closes the queue behind pending events.
        self.entity.remove_property_listener(self.subscription);
        debug!(property = %self.property, subscription = %self.subscription, "change handler disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn label(&self) -> String {
        format!("change({})", self.property)
    }
}

impl<E: Observable + ?Sized> Drop for ChangeHandler<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}
