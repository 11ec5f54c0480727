//! Command dispatch: bridges CLI args -> a bound scene session -> output.

pub mod config_cmd;
pub mod press;
pub mod tree;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use scenebridge_config::{Config, as_scene_slots};
use scenebridge_core::{
    DisposableSet, MemoryStateStore, Scene, ScenePaths, SimulatedScene, StatePath,
    StateProvisioner, setup_scenes,
};
use tracing::debug;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Time given to handler tasks to drain after a write.
pub const SETTLE: Duration = Duration::from_millis(20);

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Tree(args) => tree::handle(args, config, global).await,
        Command::Press(args) => press::handle(args, config, global).await,
        Command::Watch(args) => watch::handle(args, config, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}

/// Effective output format: flag, then config file.
pub fn output_format(config: &Config, global: &GlobalOpts) -> OutputFormat {
    global.output.unwrap_or(match config.output.as_str() {
        "json" => OutputFormat::Json,
        "json-compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    })
}

// ── Session ─────────────────────────────────────────────────────────

/// The configured scenes bound to a fresh in-memory state tree.
///
/// Handlers are disposed when the session is dropped.
pub struct Session {
    pub store: Arc<MemoryStateStore>,
    pub scenes: Vec<Option<Arc<SimulatedScene>>>,
    pub handlers: DisposableSet,
}

impl Session {
    pub fn new_store() -> Arc<MemoryStateStore> {
        Arc::new(MemoryStateStore::new())
    }

    /// Bind every enabled scene from `config` into `store`.
    pub async fn bind(store: Arc<MemoryStateStore>, config: &Config) -> Result<Self, CliError> {
        let scenes = config.build_scenes();
        let provisioner = Arc::new(StateProvisioner::new(store.clone()));
        let handlers = setup_scenes(&provisioner, &as_scene_slots(&scenes)).await?;
        debug!(handlers = handlers.len(), "session bound");
        Ok(Self {
            store,
            scenes,
            handlers,
        })
    }

    pub async fn start(config: &Config) -> Result<Self, CliError> {
        Self::bind(Self::new_store(), config).await
    }

    /// Look up a bound scene by id as typed on the command line.
    pub fn find_scene(&self, id: &str) -> Result<&Arc<SimulatedScene>, CliError> {
        self.scenes
            .iter()
            .flatten()
            .find(|s| s.id().to_string() == id)
            .ok_or_else(|| CliError::SceneNotFound {
                id: id.into(),
                available: self.scene_ids(),
            })
    }

    fn scene_ids(&self) -> String {
        let ids: Vec<String> = self
            .scenes
            .iter()
            .flatten()
            .map(|s| s.id().to_string())
            .collect();
        if ids.is_empty() {
            "(none)".into()
        } else {
            ids.join(", ")
        }
    }

    pub fn paths_for(&self, scene: &SimulatedScene) -> Result<ScenePaths, CliError> {
        Ok(ScenePaths::for_scene(&scene.id())?)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handlers.dispose_all();
    }
}

/// Parse a user-supplied state path.
pub fn parse_path(raw: &str) -> Result<StatePath, CliError> {
    Ok(StatePath::new(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(output: Option<OutputFormat>) -> GlobalOpts {
        GlobalOpts {
            config: None,
            output,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn config_output_maps_to_every_format() {
        let mut config = Config::default();
        for (name, expected) in [
            ("table", OutputFormat::Table),
            ("json", OutputFormat::Json),
            ("json-compact", OutputFormat::JsonCompact),
            ("yaml", OutputFormat::Yaml),
            ("plain", OutputFormat::Plain),
        ] {
            config.output = name.into();
            assert_eq!(output_format(&config, &global(None)), expected, "{name}");
        }
    }

    #[test]
    fn flag_overrides_config_output() {
        let config = Config {
            output: "json-compact".into(),
            ..Config::default()
        };
        assert_eq!(
            output_format(&config, &global(Some(OutputFormat::Plain))),
            OutputFormat::Plain
        );
    }
}
