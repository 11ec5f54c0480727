// ── Scene binding ──
//
// Mirrors one scene into the state tree:
//
//   scenes.<id>                (channel, role "scene")
//   scenes.<id>.productsCount  number, read-only
//   scenes.<id>.run            boolean, read/write
//   scenes.<id>.stop           boolean, write-only trigger
//
// and wires the handlers keeping both sides in sync.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{EntityId, LeafCommon, NodeCommon, Scene, SceneProperty, SceneValue, StatePath};
use crate::state::{StateProvisioner, StateStore, WriteNotification};
use crate::sync::{ChangeHandler, DisposableSet, WriteHandler};

/// Root segment of every scene path.
pub const SCENES_ROOT: &str = "scenes";
pub const PRODUCTS_COUNT: &str = "productsCount";
pub const RUN: &str = "run";
pub const STOP: &str = "stop";

const BUTTON_ROLE: &str = "button.play";

/// State paths owned by one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePaths {
    pub node: StatePath,
    pub products_count: StatePath,
    pub run: StatePath,
    pub stop: StatePath,
}

impl ScenePaths {
    /// Fails with `InvalidPath` if the id cannot be used as a path segment.
    pub fn for_scene(id: &EntityId) -> Result<Self, CoreError> {
        let node = StatePath::new(SCENES_ROOT)?.join(id)?;
        Ok(Self {
            products_count: node.join(PRODUCTS_COUNT)?,
            run: node.join(RUN)?,
            stop: node.join(STOP)?,
            node,
        })
    }
}

/// Binds scenes to the state tree through a shared provisioner.
pub struct SceneBinder {
    provisioner: Arc<StateProvisioner>,
}

impl SceneBinder {
    pub fn new(provisioner: Arc<StateProvisioner>) -> Self {
        Self { provisioner }
    }

    /// Provision the scene's node and leaves, then start its handlers.
    ///
    /// On error nothing stays subscribed: handlers created so far are
    /// disposed before the error is returned.
    pub async fn bind(&self, scene: Arc<dyn Scene>) -> Result<DisposableSet, CoreError> {
        let id = scene.id();
        let paths = ScenePaths::for_scene(&id)?;
        self.provision(scene.as_ref(), &paths).await?;

        let mut handlers = DisposableSet::new();
        if let Err(e) = self.attach(&scene, &paths, &mut handlers).await {
            handlers.dispose_all();
            return Err(e);
        }

        info!(scene = %id, name = %scene.name(), handlers = handlers.len(), "scene bound");
        Ok(handlers)
    }

    async fn provision(&self, scene: &dyn Scene, paths: &ScenePaths) -> Result<(), CoreError> {
        let p = &self.provisioner;
        p.ensure_node(&paths.node, NodeCommon::new(scene.name(), "scene"))
            .await?;
        p.ensure_leaf(
            &paths.products_count,
            LeafCommon::number(PRODUCTS_COUNT)
                .role("value")
                .desc("Number of products in the scene"),
            scene.products().len(),
        )
        .await?;
        p.ensure_leaf(
            &paths.run,
            LeafCommon::boolean(RUN)
                .role(BUTTON_ROLE)
                .access(true, true)
                .desc("Shows the running state of a scene. Set to true to run a scene."),
            scene.is_running(),
        )
        .await?;
        p.ensure_leaf(
            &paths.stop,
            LeafCommon::boolean(STOP)
                .role(BUTTON_ROLE)
                .access(false, true)
                .desc("Set to true to stop a running scene."),
            false,
        )
        .await
    }

    async fn attach(
        &self,
        scene: &Arc<dyn Scene>,
        paths: &ScenePaths,
        handlers: &mut DisposableSet,
    ) -> Result<(), CoreError> {
        let store = self.provisioner.store();

        handlers.push(running_projection(store, scene, paths));
        handlers.push(products_projection(store, scene, paths));

        let stop = stop_command(store, scene, paths);
        stop.initialize().await?;
        handlers.push(stop);

        let run = run_command(store, scene, paths);
        run.initialize().await?;
        handlers.push(run);

        Ok(())
    }
}

// ── Scene -> state ───────────────────────────────────────────────────

fn running_projection(
    store: &Arc<dyn StateStore>,
    scene: &Arc<dyn Scene>,
    paths: &ScenePaths,
) -> ChangeHandler<dyn Scene> {
    let store = Arc::clone(store);
    let run = paths.run.clone();
    let stop = paths.stop.clone();
    ChangeHandler::new(Arc::clone(scene), SceneProperty::IsRunning, move |value| {
        let store = Arc::clone(&store);
        let run = run.clone();
        let stop = stop.clone();
        async move {
            let SceneValue::Running(running) = value else {
                return Ok(false);
            };
            let outcome = store.write_confirmed(&run, running.into()).await?;
            if !running {
                // A stop triggered through the stop leaf leaves it pressed.
                store.write_confirmed_if_changed(&stop, false.into()).await?;
            }
            Ok(outcome.is_applied())
        }
    })
}

fn products_projection(
    store: &Arc<dyn StateStore>,
    scene: &Arc<dyn Scene>,
    paths: &ScenePaths,
) -> ChangeHandler<dyn Scene> {
    let store = Arc::clone(store);
    let count = paths.products_count.clone();
    ChangeHandler::new(Arc::clone(scene), SceneProperty::Products, move |value| {
        let store = Arc::clone(&store);
        let count = count.clone();
        async move {
            let SceneValue::Products(products) = value else {
                return Ok(false);
            };
            let outcome = store
                .write_confirmed_if_changed(&count, products.len().into())
                .await?;
            Ok(outcome.is_applied())
        }
    })
}

// ── State -> scene ───────────────────────────────────────────────────

fn stop_command(
    store: &Arc<dyn StateStore>,
    scene: &Arc<dyn Scene>,
    paths: &ScenePaths,
) -> WriteHandler {
    let target = Arc::clone(store);
    let scene = Arc::clone(scene);
    let stop = paths.stop.clone();
    WriteHandler::new(Arc::clone(store), paths.stop.clone(), move |notification| {
        let store = Arc::clone(&target);
        let scene = Arc::clone(&scene);
        let stop = stop.clone();
        async move { handle_stop(store.as_ref(), scene.as_ref(), &stop, notification).await }
    })
}

async fn handle_stop(
    store: &dyn StateStore,
    scene: &dyn Scene,
    stop: &StatePath,
    notification: WriteNotification,
) -> Result<(), CoreError> {
    let Some(state) = notification else {
        return Ok(());
    };
    if !state.val.is_true() {
        return Ok(());
    }

    if scene.is_running() {
        store.write_confirmed(stop, true.into()).await?;
        // No rollback if this fails: the stop leaf stays acknowledged and
        // run keeps reflecting the scene.
        scene.stop().await?;
    } else {
        debug!(scene = %scene.id(), "stop requested on idle scene, resetting trigger");
        store.write_confirmed(stop, false.into()).await?;
    }
    Ok(())
}

fn run_command(
    store: &Arc<dyn StateStore>,
    scene: &Arc<dyn Scene>,
    paths: &ScenePaths,
) -> WriteHandler {
    let target = Arc::clone(store);
    let scene = Arc::clone(scene);
    let run = paths.run.clone();
    WriteHandler::new(Arc::clone(store), paths.run.clone(), move |notification| {
        let store = Arc::clone(&target);
        let scene = Arc::clone(&scene);
        let run = run.clone();
        async move { handle_run(store.as_ref(), scene.as_ref(), &run, notification).await }
    })
}

async fn handle_run(
    store: &dyn StateStore,
    scene: &dyn Scene,
    run: &StatePath,
    notification: WriteNotification,
) -> Result<(), CoreError> {
    let Some(state) = notification else {
        return Ok(());
    };

    if !state.val.is_true() {
        // Stopping goes through the stop leaf; show what the scene is doing.
        store.write_confirmed(run, scene.is_running().into()).await?;
        return Ok(());
    }

    store.write_confirmed(run, true.into()).await?;
    if scene.is_running() {
        debug!(scene = %scene.id(), "run requested on running scene");
        return Ok(());
    }
    scene.run().await
}
