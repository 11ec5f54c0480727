//! Bidirectional synchronization between device-gateway scenes and a
//! hierarchical state tree.
//!
//! - **[`StateProvisioner`]**: idempotent creation of nodes and leaves.
//!   Metadata is written once; the value is confirmed on every call.
//!
//! - **[`ChangeHandler`]**: scene → state. Subscribes to one scene
//!   property and runs a projection for every change, in emission order.
//!
//! - **[`WriteHandler`]**: state → scene. After an explicit
//!   [`initialize()`](WriteHandler::initialize), reacts to *requested*
//!   (unacknowledged) writes on one leaf. Confirmed writes never reach the
//!   reaction, which is what keeps handlers from re-triggering themselves.
//!
//! - **[`SceneBinder`]** / **[`setup_scenes`]**: build the
//!   `scenes.<id>.{productsCount,run,stop}` subtree for each scene plus the
//!   `scenes.scenesFound` counter, and hand back every live handler as a
//!   [`DisposableSet`].
//!
//! The state store and the scene are external collaborators, reached only
//! through the [`StateStore`] and [`Scene`] traits. [`MemoryStateStore`]
//! and [`SimulatedScene`] are in-process implementations of both.

pub mod binder;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod state;
pub mod subscription;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binder::{SceneBinder, ScenePaths};
pub use error::CoreError;
pub use orchestrator::{scenes_found_path, setup_scenes};
pub use state::{
    MemoryStateStore, StateChange, StateChangeStream, StateProvisioner, StateStore, StateWrite,
    TreeEntry, WriteNotification, WriteOutcome,
};
pub use subscription::{Listener, ListenerRegistry, SubscriptionId};
pub use sync::{ChangeHandler, Disposable, DisposableSet, WriteHandler};

pub use model::{
    EntityId, LeafCommon, LeafKind, NodeCommon, Observable, ProductRef, Scene, SceneProperty,
    SceneValue, SimulatedScene, State, StatePath, StateValue,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    /// Let spawned handler tasks drain their queues. Tests run with paused
    /// time, so this only advances the virtual clock.
    pub async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
