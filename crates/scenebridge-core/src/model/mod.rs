// ── Domain model ──
//
// Addressing (`StatePath`, `EntityId`), state tree values and metadata,
// and the scene capability contract.

pub mod path;
pub mod scene;
pub mod simulated;
pub mod value;

pub use path::{EntityId, StatePath};
pub use scene::{Observable, ProductRef, Scene, SceneProperty, SceneValue};
pub use simulated::SimulatedScene;
pub use value::{LeafCommon, LeafKind, NodeCommon, State, StateValue};
