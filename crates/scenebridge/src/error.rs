//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use scenebridge_config::ConfigError;
use scenebridge_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const ACTION_FAILED: i32 = 6;
    pub const STORE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── State store ──────────────────────────────────────────────────

    #[error("State store unavailable at {path}")]
    #[diagnostic(
        code(scenebridge::store_unavailable),
        help("{reason}\nNothing was left subscribed; retry once the store is reachable.")
    )]
    StoreUnavailable { path: String, reason: String },

    #[error("State '{path}' not found")]
    #[diagnostic(
        code(scenebridge::unknown_state),
        help("Run: scenebridge tree to list provisioned states")
    )]
    UnknownState { path: String },

    // ── Scenes ───────────────────────────────────────────────────────

    #[error("Scene '{id}' not found")]
    #[diagnostic(
        code(scenebridge::scene_not_found),
        help("Configured scenes: {available}\nRun: scenebridge tree")
    )]
    SceneNotFound { id: String, available: String },

    #[error("Scene {scene}: {action} failed")]
    #[diagnostic(code(scenebridge::action_failed), help("{reason}"))]
    ActionFailed {
        scene: String,
        action: String,
        reason: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(scenebridge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(scenebridge::config),
        help("Check the config file, or run: scenebridge config path")
    )]
    Config(#[from] ConfigError),

    // ── Internal / IO / Serialization ────────────────────────────────

    #[error("Internal error: {0}")]
    #[diagnostic(code(scenebridge::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(scenebridge::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(scenebridge::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StoreUnavailable { .. } => exit_code::STORE,
            Self::UnknownState { .. } | Self::SceneNotFound { .. } => exit_code::NOT_FOUND,
            Self::ActionFailed { .. } => exit_code::ACTION_FAILED,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StoreUnavailable { path, reason } => Self::StoreUnavailable { path, reason },
            CoreError::UnknownState { path } => Self::UnknownState { path },
            CoreError::InvalidPath { path, reason } => Self::Validation {
                field: format!("path '{path}'"),
                reason,
            },
            CoreError::ActionFailed {
                scene,
                action,
                reason,
            } => Self::ActionFailed {
                scene,
                action,
                reason,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let store: CliError = CoreError::StoreUnavailable {
            path: "scenes.1".into(),
            reason: "offline".into(),
        }
        .into();
        assert_eq!(store.exit_code(), exit_code::STORE);

        let invalid: CliError = CoreError::InvalidPath {
            path: "a..b".into(),
            reason: "empty segment".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        let action: CliError = CoreError::ActionFailed {
            scene: "2".into(),
            action: "stop".into(),
            reason: "rejected".into(),
        }
        .into();
        assert_eq!(action.exit_code(), exit_code::ACTION_FAILED);
    }
}
