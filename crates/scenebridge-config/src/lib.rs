//! Configuration for the scenebridge CLI.
//!
//! A TOML file (platform config dir, or an explicit path) merged with
//! `SCENEBRIDGE_` environment variables, plus translation of `[[scenes]]`
//! fixtures into `scenebridge_core::SimulatedScene`s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenebridge_core::{EntityId, ProductRef, Scene, ScenePaths, SimulatedScene};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default output format: table, json, json-compact, yaml or plain.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log line format: text or json.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Simulated gateway latency applied to every scene action.
    #[serde(default)]
    pub action_delay_ms: u64,

    /// Scenes to bridge, in gateway slot order.
    #[serde(default)]
    pub scenes: Vec<SceneFixture>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: default_output(),
            log_format: default_log_format(),
            action_delay_ms: 0,
            scenes: Vec::new(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_true() -> bool {
    true
}

/// One `[[scenes]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneFixture {
    /// Scene id as reported by the gateway (number or name).
    pub id: EntityId,

    pub name: String,

    /// Node ids of the products taking part in the scene.
    #[serde(default)]
    pub products: Vec<u32>,

    #[serde(default)]
    pub running: bool,

    /// Make every run/stop on this scene fail.
    #[serde(default)]
    pub fail_actions: bool,

    /// A disabled fixture occupies its slot but is not bridged.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SceneFixture {
    /// Build the in-memory scene this fixture describes.
    pub fn to_scene(&self, action_delay: Duration) -> SimulatedScene {
        let scene = SimulatedScene::new(self.id.clone(), self.name.clone())
            .with_products(self.products.iter().copied().map(ProductRef::new).collect())
            .with_running(self.running)
            .with_action_delay(action_delay);
        scene.set_fail_actions(self.fail_actions);
        scene
    }
}

impl Config {
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    /// Scenes in slot order; disabled fixtures become empty slots.
    pub fn build_scenes(&self) -> Vec<Option<Arc<SimulatedScene>>> {
        let delay = self.action_delay();
        self.scenes
            .iter()
            .map(|f| f.enabled.then(|| Arc::new(f.to_scene(delay))))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        one_of("output", &self.output, OUTPUT_FORMATS)?;
        one_of("log_format", &self.log_format, LOG_FORMATS)?;

        let mut seen = HashSet::new();
        for fixture in &self.scenes {
            if let Err(e) = ScenePaths::for_scene(&fixture.id) {
                return Err(ConfigError::Validation {
                    field: "scenes.id".into(),
                    reason: e.to_string(),
                });
            }
            // `4` and `"4"` name the same path segment.
            if !seen.insert(fixture.id.to_string()) {
                return Err(ConfigError::Validation {
                    field: "scenes.id".into(),
                    reason: format!("duplicate scene id '{}'", fixture.id),
                });
            }
        }
        Ok(())
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected one of {}, got '{value}'", allowed.join(", ")),
        })
    }
}

/// Erase the concrete scene type for `setup_scenes`.
pub fn as_scene_slots(scenes: &[Option<Arc<SimulatedScene>>]) -> Vec<Option<Arc<dyn Scene>>> {
    scenes
        .iter()
        .map(|slot| slot.clone().map(|s| s as Arc<dyn Scene>))
        .collect()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "scenebridge", "scenebridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("scenebridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from `path` (or the default location)
/// plus `SCENEBRIDGE_*` environment variables. A missing file is not an
/// error; defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("SCENEBRIDGE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Render a config as pretty TOML.
pub fn render_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"
output = "json"
action_delay_ms = 250

[[scenes]]
id = 0
name = "Evening"
products = [1, 2, 3]

[[scenes]]
id = 1
name = "Retired"
enabled = false

[[scenes]]
id = "party"
name = "Party"
running = true
fail_actions = true
"#;

    #[test]
    fn loads_file_over_defaults() {
        let file = write_config(SAMPLE);
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.output, "json");
        assert_eq!(config.log_format, "text");
        assert_eq!(config.action_delay(), Duration::from_millis(250));
        assert_eq!(config.scenes.len(), 3);
        assert_eq!(config.scenes[0].id, EntityId::Numeric(0));
        assert_eq!(config.scenes[2].id, EntityId::Named("party".into()));
        assert!(!config.scenes[1].enabled);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn fixtures_become_scenes_and_disabled_ones_empty_slots() {
        let file = write_config(SAMPLE);
        let config = load_config(Some(file.path())).unwrap();
        let scenes = config.build_scenes();

        assert_eq!(scenes.len(), 3);
        assert!(scenes[1].is_none());
        let evening = scenes[0].as_ref().unwrap();
        assert_eq!(evening.products().len(), 3);
        assert!(!evening.is_running());
        let party = scenes[2].as_ref().unwrap();
        assert!(party.is_running());
        assert_eq!(as_scene_slots(&scenes).iter().flatten().count(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let file = write_config(
            r#"
[[scenes]]
id = 4
name = "A"

[[scenes]]
id = "4"
name = "B"
"#,
        );
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "scenes.id"));
    }

    #[test]
    fn ids_must_be_path_segments() {
        let mut config = Config::default();
        config.scenes.push(SceneFixture {
            id: EntityId::Named("living room".into()),
            name: "Living".into(),
            products: Vec::new(),
            running: false,
            fail_actions: false,
            enabled: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn every_cli_output_format_is_accepted() {
        for format in ["table", "json", "json-compact", "yaml", "plain"] {
            let file = write_config(&format!("output = \"{format}\"\n"));
            let config = load_config(Some(file.path())).unwrap();
            assert_eq!(config.output, format);
        }
    }

    #[test]
    fn unknown_formats_are_rejected() {
        let file = write_config("log_format = \"xml\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn rendered_config_loads_back() {
        let file = write_config(SAMPLE);
        let config = load_config(Some(file.path())).unwrap();
        let rendered = render_config(&config).unwrap();

        let again = write_config(&rendered);
        assert_eq!(load_config(Some(again.path())).unwrap(), config);
    }
}
