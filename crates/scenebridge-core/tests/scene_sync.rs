#![allow(clippy::unwrap_used)]
// End-to-end scene <-> state tree synchronization through `setup_scenes`.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scenebridge_core::{
    CoreError, MemoryStateStore, ProductRef, Scene, SimulatedScene, State, StatePath,
    StateProvisioner, StateStore, StateValue, scenes_found_path, setup_scenes,
};

struct Harness {
    store: Arc<MemoryStateStore>,
    provisioner: Arc<StateProvisioner>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStateStore::new());
        let provisioner = Arc::new(StateProvisioner::new(store.clone()));
        Self { store, provisioner }
    }

    fn state(&self, raw: &str) -> State {
        self.store.state(&path(raw)).unwrap()
    }

    async fn press(&self, raw: &str, value: bool) {
        self.store
            .write_requested(&path(raw), value.into())
            .await
            .unwrap();
    }
}

fn path(raw: &str) -> StatePath {
    StatePath::new(raw).unwrap()
}

fn products(n: u32) -> Vec<ProductRef> {
    (1..=n).map(ProductRef::new).collect()
}

fn slot(scene: &Arc<SimulatedScene>) -> Option<Arc<dyn Scene>> {
    Some(scene.clone() as Arc<dyn Scene>)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn confirmed(value: bool) -> (StateValue, bool) {
    (StateValue::Bool(value), true)
}

fn val_ack(state: &State) -> (StateValue, bool) {
    (state.val.clone(), state.ack)
}

// ── Provisioning ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn binding_twice_keeps_one_tree_with_latest_values() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(3, "Evening").with_products(products(2)));

    let first = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();
    first.dispose_all();
    scene.set_products(products(5));
    let _second = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    assert_eq!(h.store.leaf_count(), 4);
    assert_eq!(h.store.node_count(), 1);
    assert_eq!(
        h.state("scenes.3.productsCount").val,
        StateValue::Number(5.0)
    );
}

// ── Stop command ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stop_on_idle_scene_resets_trigger_without_action() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(1, "Idle"));
    let _handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    h.press("scenes.1.stop", true).await;
    settle().await;

    assert_eq!(val_ack(&h.state("scenes.1.stop")), confirmed(false));
    assert_eq!(scene.stop_calls(), 0);
    assert!(!scene.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_on_running_scene_acknowledges_then_resets() {
    let h = Harness::new();
    let scene = Arc::new(
        SimulatedScene::new(2, "Party")
            .with_running(true)
            .with_action_delay(Duration::from_millis(100)),
    );
    let _handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    h.press("scenes.2.stop", true).await;
    settle().await;

    // Action still in flight: trigger acknowledged, scene still running.
    assert_eq!(val_ack(&h.state("scenes.2.stop")), confirmed(true));
    assert_eq!(val_ack(&h.state("scenes.2.run")), confirmed(true));
    assert_eq!(scene.stop_calls(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!scene.is_running());
    assert_eq!(val_ack(&h.state("scenes.2.run")), confirmed(false));
    assert_eq!(val_ack(&h.state("scenes.2.stop")), confirmed(false));

    let stop_history: Vec<_> = h
        .store
        .history(&path("scenes.2.stop"))
        .iter()
        .map(val_ack)
        .collect();
    assert_eq!(
        stop_history,
        vec![
            confirmed(false),
            (StateValue::Bool(true), false),
            confirmed(true),
            confirmed(false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_stop_leaves_trigger_acknowledged_and_run_untouched() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(2, "Party").with_running(true));
    scene.set_fail_actions(true);
    let _handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    h.press("scenes.2.stop", true).await;
    settle().await;

    assert_eq!(scene.stop_calls(), 1);
    assert!(scene.is_running());
    assert_eq!(val_ack(&h.state("scenes.2.stop")), confirmed(true));
    assert_eq!(val_ack(&h.state("scenes.2.run")), confirmed(true));
}

// ── Property projection ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn product_count_is_written_only_when_it_changes() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(4, "Morning").with_products(products(2)));
    let _handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();
    let count = path("scenes.4.productsCount");
    assert_eq!(h.store.history(&count).len(), 1);

    scene.set_products(products(3));
    settle().await;
    assert_eq!(
        val_ack(&h.state("scenes.4.productsCount")),
        (StateValue::Number(3.0), true)
    );
    assert_eq!(h.store.history(&count).len(), 2);

    // Different products, same size.
    scene.set_products(vec![
        ProductRef::new(7),
        ProductRef::new(8),
        ProductRef::new(9),
    ]);
    settle().await;
    assert_eq!(h.store.history(&count).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn handler_writes_do_not_feed_back_into_actions() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(5, "Loop"));
    let _handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    for _ in 0..3 {
        scene.set_running(true);
        scene.set_running(false);
    }
    settle().await;

    assert_eq!((scene.run_calls(), scene.stop_calls()), (0, 0));
    assert_eq!(val_ack(&h.state("scenes.5.run")), confirmed(false));
}

// ── Orchestration ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn null_entries_are_skipped_in_binding_and_count() {
    let h = Harness::new();
    let a = Arc::new(SimulatedScene::new(0, "A"));
    let b = Arc::new(SimulatedScene::new(7, "B"));
    let scenes = vec![None, slot(&a), None, None, slot(&b)];

    let handlers = setup_scenes(&h.provisioner, &scenes).await.unwrap();

    assert_eq!(handlers.len(), 8);
    assert_eq!(
        h.store.value(&scenes_found_path().unwrap()),
        Some(StateValue::Number(2.0))
    );
    assert!(h.store.node_common(&path("scenes.0")).is_some());
    assert!(h.store.node_common(&path("scenes.7")).is_some());
}

#[tokio::test(start_paused = true)]
async fn unavailable_store_fails_setup() {
    let h = Harness::new();
    h.store.set_available(false);
    let scene = Arc::new(SimulatedScene::new(1, "A"));

    let err = setup_scenes(&h.provisioner, &[slot(&scene)])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StoreUnavailable { .. }));
    assert_eq!(scene.listener_count(), 0);
}

// ── Disposal ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn disposed_handlers_produce_no_further_writes() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(9, "Gone").with_running(true));
    let handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    assert_eq!(handlers.dispose_all(), 4);
    assert_eq!(handlers.dispose_all(), 0);
    let before = h.store.write_count();

    scene.set_running(false);
    scene.set_products(products(4));
    h.press("scenes.9.stop", true).await;
    h.press("scenes.9.run", true).await;
    settle().await;

    // Only the two external requests themselves were written.
    assert_eq!(h.store.write_count(), before + 2);
    assert_eq!(scene.stop_calls(), 0);
    assert_eq!(scene.run_calls(), 0);
    assert!(!h.state("scenes.9.stop").ack);
}

#[tokio::test(start_paused = true)]
async fn change_made_just_before_dispose_still_reaches_the_tree() {
    let h = Harness::new();
    let scene = Arc::new(SimulatedScene::new(1, "Evening").with_running(true));
    let handlers = setup_scenes(&h.provisioner, &[slot(&scene)]).await.unwrap();

    scene.set_running(false);
    handlers.dispose_all();
    settle().await;

    assert_eq!(val_ack(&h.state("scenes.1.run")), confirmed(false));
    assert_eq!(val_ack(&h.state("scenes.1.stop")), confirmed(false));
    assert_eq!(h.store.subscriber_count(), 0);
}
