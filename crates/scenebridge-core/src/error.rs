// ── Core error types ──
//
// Errors surfaced by the synchronization subsystem. Store and scene
// implementations translate their own failures into these variants so
// callers never see transport details.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── State store errors ───────────────────────────────────────────
    #[error("State store unavailable while accessing {path}: {reason}")]
    StoreUnavailable { path: String, reason: String },

    #[error("State {path} does not exist")]
    UnknownState { path: String },

    #[error("Invalid state path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // ── Scene action errors ──────────────────────────────────────────
    #[error("Scene {scene}: action '{action}' failed: {reason}")]
    ActionFailed {
        scene: String,
        action: String,
        reason: String,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn store_unavailable(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the state store rather than the scene.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::UnknownState { .. }
        )
    }
}
