//! Alias resolution for expected answers
//!
//! Maps a canonical answer to alternate phrasings that also count as correct.
//! Keys and aliases are lowercased at registration so lookups and matching
//! are case-insensitive.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lowercased canonical answer → lowercased aliases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    aliases: HashMap<String, Vec<String>>,
}

impl AliasTable {
    /// Empty table: no answer has aliases
    pub fn new() -> Self {
        Self::default()
    }

    /// Register aliases for a canonical answer
    ///
    /// Registering the same canonical answer again replaces its aliases.
    pub fn register<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = aliases
            .into_iter()
            .map(|a| a.as_ref().to_lowercase())
            .collect();
        self.aliases.insert(canonical.to_lowercase(), aliases);
    }

    /// Builder-style `register`
    pub fn with<I, S>(mut self, canonical: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(canonical, aliases);
        self
    }

    /// Aliases for `answer` (case-insensitive), empty if none registered
    pub fn lookup(&self, answer: &str) -> &[String] {
        self.aliases
            .get(&answer.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of canonical answers with aliases
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
