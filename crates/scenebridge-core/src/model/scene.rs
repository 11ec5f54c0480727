// ── Scene domain contract ──
//
// A scene is owned by the device gateway. The bridge only ever sees it
// through this capability contract: readable properties, change
// notifications, and async actions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::path::EntityId;
use crate::error::CoreError;
use crate::subscription::{Listener, SubscriptionId};

/// Anything that pushes property change notifications.
pub trait Observable: Send + Sync + 'static {
    /// Names of the observable properties.
    type Property: Copy + Eq + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static;
    /// Payload delivered with each change.
    type Value: Clone + Send + 'static;

    /// Register `listener` for changes of `property`. Notifications for one
    /// property are delivered in emission order.
    fn on_property_change(
        &self,
        property: Self::Property,
        listener: Arc<dyn Listener<Self::Value>>,
    ) -> SubscriptionId;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_property_listener(&self, id: SubscriptionId);
}

/// Properties of a scene the bridge observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum SceneProperty {
    IsRunning,
    Products,
}

/// A product (actuator) taking part in a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub node_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProductRef {
    pub fn new(node_id: u32) -> Self {
        Self {
            node_id,
            name: None,
        }
    }
}

/// New value of a changed scene property.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneValue {
    Running(bool),
    Products(Arc<Vec<ProductRef>>),
}

impl SceneValue {
    pub fn property(&self) -> SceneProperty {
        match self {
            Self::Running(_) => SceneProperty::IsRunning,
            Self::Products(_) => SceneProperty::Products,
        }
    }
}

/// Capability contract of a controllable scene.
#[async_trait]
pub trait Scene: Observable<Property = SceneProperty, Value = SceneValue> {
    fn id(&self) -> EntityId;

    fn name(&self) -> String;

    fn is_running(&self) -> bool;

    fn products(&self) -> Arc<Vec<ProductRef>>;

    /// Start the scene. Resolves once the gateway confirmed the command.
    async fn run(&self) -> Result<(), CoreError>;

    /// Stop a running scene.
    async fn stop(&self) -> Result<(), CoreError>;
}
