// SPDX-License-Identifier: MIT

//! Identifier newtypes and server-id generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

crate::str_newtype! {
    /// Unique, case-sensitive identifier of a server instance
    /// (e.g. `lobby` for a static server, `bedwars-3` for a dynamic one).
    pub struct ServerId;
}

crate::str_newtype! {
    /// Identifier of a connected player, opaque to the orchestrator.
    pub struct PlayerId;
}

/// Case-folded unique key of a template.
///
/// Folding happens at construction so every lookup path (config keys,
/// operator input, directory names) converges on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct TemplateName(smol_str::SmolStr);

impl TemplateName {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(smol_str::SmolStr::new(s.as_ref().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for TemplateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::borrow::Borrow<str> for TemplateName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq<str> for TemplateName {
    fn eq(&self, other: &str) -> bool {
        self.0.as_str() == other
    }
}

impl PartialEq<&str> for TemplateName {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == *other
    }
}

impl<'de> serde::Deserialize<'de> for TemplateName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

/// Monotonic generator for dynamic server ids: `{prefix}-{n}`.
///
/// A single counter is shared across all templates; the suffix never
/// repeats within one orchestrator process.
#[derive(Clone)]
pub struct ServerIdGen {
    next: Arc<AtomicU64>,
}

impl ServerIdGen {
    pub fn new() -> Self {
        Self { next: Arc::new(AtomicU64::new(1)) }
    }

    /// Produce the next id for the given template prefix.
    pub fn next(&self, prefix: &str) -> ServerId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ServerId::new(format!("{prefix}-{n}"))
    }
}

impl Default for ServerIdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
