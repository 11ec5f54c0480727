// ── Core identity types ──
//
// EntityId and StatePath form the foundation of every state-tree address.
// Scene ids reported by the gateway are numeric, but fixtures and other
// entity kinds may use names, so both are accepted behind one type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const SEPARATOR: char = '.';

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for a bridged entity.
///
/// Numeric ids (as reported by the gateway) and free-form names are both
/// valid. Either way the id becomes a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u32),
    Named(String),
}

impl EntityId {
    pub fn as_numeric(&self) -> Option<u32> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Named(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(s) => Some(s),
            Self::Numeric(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<u32> for EntityId {
    fn from(n: u32) -> Self {
        Self::Numeric(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match s.parse::<u32>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Named(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

// ── StatePath ───────────────────────────────────────────────────────

/// Dot-separated address of a node or leaf in the state tree.
///
/// Every segment is non-empty and free of separators, so joining a valid
/// path with a valid segment always yields a valid path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatePath(String);

impl StatePath {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// Append one segment (`scenes` + `3` -> `scenes.3`).
    pub fn join(&self, segment: impl fmt::Display) -> Result<Self, CoreError> {
        let joined = format!("{}{SEPARATOR}{segment}", self.0);
        validate_segment(&joined, &segment.to_string())?;
        Ok(Self(joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Final segment, e.g. `stop` for `scenes.3.stop`.
    pub fn leaf_name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once(SEPARATOR)
            .map(|(parent, _)| Self(parent.to_owned()))
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn starts_with(&self, ancestor: &Self) -> bool {
        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }
}

fn validate(raw: &str) -> Result<(), CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidPath {
            path: raw.into(),
            reason: "path is empty".into(),
        });
    }
    raw.split(SEPARATOR)
        .try_for_each(|segment| validate_segment(raw, segment))
}

fn validate_segment(path: &str, segment: &str) -> Result<(), CoreError> {
    if segment.is_empty() {
        return Err(CoreError::InvalidPath {
            path: path.into(),
            reason: "empty segment".into(),
        });
    }
    if segment.contains(SEPARATOR) {
        return Err(CoreError::InvalidPath {
            path: path.into(),
            reason: format!("segment '{segment}' contains '{SEPARATOR}'"),
        });
    }
    if segment.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidPath {
            path: path.into(),
            reason: format!("segment '{segment}' contains whitespace"),
        });
    }
    Ok(())
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StatePath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StatePath {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<StatePath> for String {
    fn from(path: StatePath) -> Self {
        path.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_numeric_string() {
        let id = EntityId::from("12".to_owned());
        assert_eq!(id.as_numeric(), Some(12));
    }

    #[test]
    fn entity_id_from_named_string() {
        let id = EntityId::from("living-room");
        assert_eq!(id.as_named(), Some("living-room"));
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId::Numeric(7).to_string(), "7");
        assert_eq!(EntityId::from("evening").to_string(), "evening");
    }

    #[test]
    fn path_join_builds_dotted_address() {
        let scenes = StatePath::new("scenes").unwrap();
        let leaf = scenes.join(EntityId::Numeric(3)).unwrap().join("stop").unwrap();
        assert_eq!(leaf.as_str(), "scenes.3.stop");
        assert_eq!(leaf.leaf_name(), "stop");
        assert_eq!(leaf.parent().unwrap().as_str(), "scenes.3");
    }

    #[test]
    fn path_rejects_empty_segments() {
        assert!(StatePath::new("").is_err());
        assert!(StatePath::new("scenes..stop").is_err());
        assert!(StatePath::new("scenes.").is_err());
    }

    #[test]
    fn join_rejects_separator_in_segment() {
        let scenes = StatePath::new("scenes").unwrap();
        assert!(scenes.join("a.b").is_err());
        assert!(scenes.join("with space").is_err());
    }

    #[test]
    fn starts_with_requires_segment_boundary() {
        let scene = StatePath::new("scenes.1").unwrap();
        assert!(StatePath::new("scenes.1.run").unwrap().starts_with(&scene));
        assert!(!StatePath::new("scenes.10.run").unwrap().starts_with(&scene));
        assert!(!scene.starts_with(&scene));
    }

    #[test]
    fn path_deserializes_with_validation() {
        let ok: StatePath = serde_json::from_str("\"scenes.2.run\"").unwrap();
        assert_eq!(ok.segments().count(), 3);
        assert!(serde_json::from_str::<StatePath>("\"scenes..run\"").is_err());
    }
}
