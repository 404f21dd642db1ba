// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The fact provider interface.
//!
//! Facts describe the node being compiled for (`$os`, `$hostname`, …). The
//! compiler consults facts through [`FactProvider`]; acquiring them (from
//! an agent, YAML file, or anywhere else) is the embedder's concern.
//!
//! Top-scope variable lookups fall back to facts, and the `$facts` hash
//! exposes every fact by name.

use std::collections::HashMap;

use ecow::EcoString;

use crate::values::Value;

/// Supplies node facts as a name-to-value mapping.
pub trait FactProvider {
    /// Returns the fact value, or `None` if the fact is unknown.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Returns the known fact names.
    fn names(&self) -> Vec<EcoString>;
}

/// An in-memory fact provider.
#[derive(Debug, Clone, Default)]
pub struct MemoryFacts {
    facts: HashMap<EcoString, Value>,
}

impl MemoryFacts {
    /// Creates an empty fact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fact, replacing any existing value.
    pub fn set(&mut self, name: impl Into<EcoString>, value: impl Into<Value>) {
        self.facts.insert(name.into(), value.into());
    }

    /// Builder-style fact insertion.
    #[must_use]
    pub fn with(mut self, name: impl Into<EcoString>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }
}

impl FactProvider for MemoryFacts {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.facts.get(name).cloned()
    }

    fn names(&self) -> Vec<EcoString> {
        let mut names: Vec<EcoString> = self.facts.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_facts_lookup() {
        let facts = MemoryFacts::new()
            .with("os", "linux")
            .with("processors", Value::Integer(8));
        assert_eq!(facts.lookup("os"), Some(Value::from("linux")));
        assert_eq!(facts.lookup("missing"), None);
        assert_eq!(facts.names(), vec!["os", "processors"]);
    }
}
