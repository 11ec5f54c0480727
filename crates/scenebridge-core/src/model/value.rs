// ── State tree value and metadata types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// A single value stored in a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl StateValue {
    /// `true` only for the boolean trigger sentinel.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    pub fn kind(&self) -> Option<LeafKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(LeafKind::Boolean),
            Self::Number(_) => Some(LeafKind::Number),
            Self::Text(_) => Some(LeafKind::String),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for StateValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for StateValue {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Current content of a leaf: value plus acknowledgement flag.
///
/// `ack == true` marks a confirmed value reported by the bridge;
/// `ack == false` marks a pending write request from an external writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub val: StateValue,
    pub ack: bool,
    pub ts: DateTime<Utc>,
}

impl State {
    pub fn new(val: impl Into<StateValue>, ack: bool) -> Self {
        Self {
            val: val.into(),
            ack,
            ts: Utc::now(),
        }
    }

    /// Same value and acknowledgement, ignoring the timestamp.
    pub fn same_as(&self, val: &StateValue, ack: bool) -> bool {
        self.ack == ack && self.val == *val
    }
}

/// Declared value type of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeafKind {
    Boolean,
    Number,
    String,
}

/// Leaf metadata. Fixed at creation time; never rewritten by provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafCommon {
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: LeafKind,
    pub read: bool,
    pub write: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<StateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl LeafCommon {
    fn with_kind(name: impl Into<String>, kind: LeafKind) -> Self {
        Self {
            name: name.into(),
            role: "state".into(),
            kind,
            read: true,
            write: false,
            min: None,
            max: None,
            def: None,
            desc: None,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, LeafKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, LeafKind::Boolean)
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn access(mut self, read: bool, write: bool) -> Self {
        self.read = read;
        self.write = write;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn def(mut self, def: impl Into<StateValue>) -> Self {
        self.def = Some(def.into());
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }
}

/// Metadata of a channel node grouping one entity's leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCommon {
    pub name: String,
    pub role: String,
}

impl NodeCommon {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}
