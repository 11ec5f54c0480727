// ── Simulated scene ──
//
// In-process `Scene` implementation. Drives the CLI demo mode and the
// test suite: property setters emit change notifications exactly the
// way a gateway-backed scene would, and actions can be slowed down or
// made to fail.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::debug;

use super::path::EntityId;
use super::scene::{Observable, ProductRef, Scene, SceneProperty, SceneValue};
use crate::error::CoreError;
use crate::subscription::{Listener, ListenerRegistry, SubscriptionId};

#[derive(Debug, Clone)]
struct Snapshot {
    running: bool,
    products: Arc<Vec<ProductRef>>,
}

/// A scene living entirely in memory.
pub struct SimulatedScene {
    id: EntityId,
    name: String,
    state: ArcSwap<Snapshot>,
    listeners: ListenerRegistry<SceneProperty, SceneValue>,
    action_delay: Duration,
    fail_actions: AtomicBool,
    run_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl SimulatedScene {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: ArcSwap::from_pointee(Snapshot {
                running: false,
                products: Arc::new(Vec::new()),
            }),
            listeners: ListenerRegistry::new(),
            action_delay: Duration::ZERO,
            fail_actions: AtomicBool::new(false),
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_products(self, products: Vec<ProductRef>) -> Self {
        self.state.rcu(|snap| Snapshot {
            running: snap.running,
            products: Arc::new(products.clone()),
        });
        self
    }

    pub fn with_running(self, running: bool) -> Self {
        self.state.rcu(|snap| Snapshot {
            running,
            products: Arc::clone(&snap.products),
        });
        self
    }

    /// Latency applied before an action takes effect.
    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = delay;
        self
    }

    /// Make every subsequent `run`/`stop` fail with `ActionFailed`.
    pub fn set_fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Update the running flag, notifying listeners if it changed.
    pub fn set_running(&self, running: bool) {
        let previous = self.state.rcu(|snap| Snapshot {
            running,
            products: Arc::clone(&snap.products),
        });
        if previous.running != running {
            debug!(scene = %self.id, running, "scene running state changed");
            self.listeners
                .emit(&SceneProperty::IsRunning, &SceneValue::Running(running));
        }
    }

    /// Replace the product list, notifying listeners if it changed.
    pub fn set_products(&self, products: Vec<ProductRef>) {
        let products = Arc::new(products);
        let previous = self.state.rcu(|snap| Snapshot {
            running: snap.running,
            products: Arc::clone(&products),
        });
        if previous.products != products {
            debug!(scene = %self.id, count = products.len(), "scene products changed");
            self.listeners
                .emit(&SceneProperty::Products, &SceneValue::Products(products));
        }
    }

    async fn perform(&self, action: &str) -> Result<(), CoreError> {
        if !self.action_delay.is_zero() {
            tokio::time::sleep(self.action_delay).await;
        }
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(CoreError::ActionFailed {
                scene: self.id.to_string(),
                action: action.into(),
                reason: "gateway rejected the command".into(),
            });
        }
        Ok(())
    }
}

impl Observable for SimulatedScene {
    type Property = SceneProperty;
    type Value = SceneValue;

    fn on_property_change(
        &self,
        property: SceneProperty,
        listener: Arc<dyn Listener<SceneValue>>,
    ) -> SubscriptionId {
        self.listeners.register(property, listener)
    }

    fn remove_property_listener(&self, id: SubscriptionId) {
        self.listeners.unregister(id);
    }
}

#[async_trait]
impl Scene for SimulatedScene {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_running(&self) -> bool {
        self.state.load().running
    }

    fn products(&self) -> Arc<Vec<ProductRef>> {
        Arc::clone(&self.state.load().products)
    }

    async fn run(&self) -> Result<(), CoreError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.perform("run").await?;
        self.set_running(true);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CoreError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.perform("stop").await?;
        self.set_running(false);
        Ok(())
    }
}
