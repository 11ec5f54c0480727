// ── Scene orchestration ──

use std::sync::Arc;

use tracing::info;

use crate::binder::{SCENES_ROOT, SceneBinder};
use crate::error::CoreError;
use crate::model::{LeafCommon, Scene, StatePath};
use crate::state::StateProvisioner;
use crate::sync::DisposableSet;

pub const SCENES_FOUND: &str = "scenesFound";

/// Path of the aggregate scene counter.
pub fn scenes_found_path() -> Result<StatePath, CoreError> {
    StatePath::new(SCENES_ROOT)?.join(SCENES_FOUND)
}

/// Bind every scene in `scenes`, skipping empty slots, then record how many
/// were bound in `scenes.scenesFound`.
///
/// Scenes are bound one after another in slice order. The first failure
/// aborts the whole setup; handlers of scenes bound before it are disposed.
pub async fn setup_scenes(
    provisioner: &Arc<StateProvisioner>,
    scenes: &[Option<Arc<dyn Scene>>],
) -> Result<DisposableSet, CoreError> {
    let mut handlers = DisposableSet::new();
    match bind_all(provisioner, scenes, &mut handlers).await {
        Ok(bound) => {
            info!(
                scenes = bound,
                skipped = scenes.len() - bound,
                handlers = handlers.len(),
                "scene setup complete"
            );
            Ok(handlers)
        }
        Err(e) => {
            handlers.dispose_all();
            Err(e)
        }
    }
}

async fn bind_all(
    provisioner: &Arc<StateProvisioner>,
    scenes: &[Option<Arc<dyn Scene>>],
    handlers: &mut DisposableSet,
) -> Result<usize, CoreError> {
    let binder = SceneBinder::new(Arc::clone(provisioner));
    let mut bound = 0usize;
    for scene in scenes.iter().flatten() {
        handlers.append(binder.bind(Arc::clone(scene)).await?);
        bound += 1;
    }

    let summary = LeafCommon::number("Number of scenes found")
        .role("value")
        .min(0.0)
        .def(0u32)
        .desc("Number of scenes defined in the interface");
    provisioner
        .ensure_leaf(&scenes_found_path()?, summary, bound)
        .await?;
    Ok(bound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::model::{SimulatedScene, StateValue};
    use crate::state::MemoryStateStore;

    fn scene(id: u32) -> Option<Arc<dyn Scene>> {
        Some(Arc::new(SimulatedScene::new(id, format!("Scene {id}"))))
    }

    #[tokio::test(start_paused = true)]
    async fn empty_slots_are_skipped_and_not_counted() {
        let store = Arc::new(MemoryStateStore::new());
        let provisioner = Arc::new(StateProvisioner::new(store.clone()));
        let scenes = vec![None, scene(0), None, scene(4), scene(9), None];

        let handlers = setup_scenes(&provisioner, &scenes).await.unwrap();

        assert_eq!(handlers.len(), 12);
        assert_eq!(store.node_count(), 3);
        let found = scenes_found_path().unwrap();
        assert_eq!(store.value(&found), Some(StateValue::Number(3.0)));

        let common = store.leaf_common(&found).unwrap();
        assert_eq!(common.min, Some(0.0));
        assert_eq!(common.def, Some(StateValue::Number(0.0)));
        assert!(common.read && !common.write);
    }

    #[tokio::test(start_paused = true)]
    async fn no_scenes_still_records_zero() {
        let store = Arc::new(MemoryStateStore::new());
        let provisioner = Arc::new(StateProvisioner::new(store.clone()));

        let handlers = setup_scenes(&provisioner, &[None, None]).await.unwrap();

        assert!(handlers.is_empty());
        assert_eq!(
            store.value(&scenes_found_path().unwrap()),
            Some(StateValue::Number(0.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_scene_aborts_and_releases_earlier_bindings() {
        let store = Arc::new(MemoryStateStore::new());
        let provisioner = Arc::new(StateProvisioner::new(store.clone()));
        let first = Arc::new(SimulatedScene::new(1, "First"));
        let bad: Arc<dyn Scene> = Arc::new(SimulatedScene::new("bad.id", "Broken"));
        let scenes = vec![Some(first.clone() as Arc<dyn Scene>), Some(bad)];

        let err = setup_scenes(&provisioner, &scenes).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidPath { .. }));
        assert_eq!(first.listener_count(), 0);
        assert_eq!(store.subscriber_count(), 0);
        assert!(store.value(&scenes_found_path().unwrap()).is_none());
    }
}
