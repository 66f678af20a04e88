//! Core dialog types
//!
//! Identifiers, lifecycle phases and the error taxonomy shared by the
//! controller, the hooks and the surface abstraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered dialog kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DialogKind(pub String);

impl DialogKind {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DialogKind {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DialogKind {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied payload handed to the opening and opened hooks
pub type DialogParams = serde_json::Value;

/// Lifecycle phase marker carried by a surface.
///
/// A surface carries at most one of these at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPhase {
    Opening,
    Opened,
    Closing,
    Closed,
}

impl DialogPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            DialogPhase::Opening => "opening",
            DialogPhase::Opened => "opened",
            DialogPhase::Closing => "closing",
            DialogPhase::Closed => "closed",
        }
    }

    pub fn all() -> [DialogPhase; 4] {
        [
            DialogPhase::Opening,
            DialogPhase::Opened,
            DialogPhase::Closing,
            DialogPhase::Closed,
        ]
    }
}

impl fmt::Display for DialogPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DialogPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DialogPhase::all()
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("unknown dialog phase '{}'", s))
    }
}

/// Return value recorded when a dialog is closed through `close()` without a reason
pub const PROGRAMMATIC_REASON: &str = "programmatic";

/// Return value recorded when a pointer-down lands on the surface backdrop
pub const DISMISS_REASON: &str = "dismiss";

/// Result type for dialog operations
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Dialog lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    /// `open` was called with a kind that is not in the hook registry
    #[error("Dialog kind '{0}' is not registered")]
    UnknownKind(DialogKind),

    /// A configured hook failed; the remaining steps of that pass were skipped
    #[error("{phase} hook for dialog '{kind}' failed: {source}")]
    Hook {
        kind: DialogKind,
        phase: DialogPhase,
        #[source]
        source: anyhow::Error,
    },

    #[error("Dialog lifecycle requires a running tokio runtime")]
    NoRuntime,
}

impl DialogError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, DialogError::UnknownKind(_))
    }

    /// Phase of the failing hook, if this is a hook error
    pub fn phase(&self) -> Option<DialogPhase> {
        match self {
            DialogError::Hook { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
