// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime scopes.
//!
//! Scopes form a parent-linked chain shared by reference; bindings hold
//! shared, immutable value snapshots with the position of the assignment
//! (so "cannot reassign" errors can point at the previous assignment).
//!
//! The top scope consults the fact provider: a fact materialises as a
//! binding on first lookup, and `$facts` exposes the full fact hash.
//! Scopes also hold the resource defaults installed by `Type { … }`
//! expressions; lookups walk the chain so defaults apply to the installing
//! scope and its descendants.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ecow::EcoString;
use indexmap::IndexMap;

use crate::ast::AttributeOperator;
use crate::catalog::ResourceRef;
use crate::facts::FactProvider;
use crate::values::{Value, ValueHash, to_array};

/// A variable binding: the shared value plus where it was assigned.
#[derive(Debug, Clone)]
pub struct AssignedVariable {
    value: Rc<Value>,
    path: Option<EcoString>,
    line: u32,
}

impl AssignedVariable {
    /// Creates a binding.
    #[must_use]
    pub fn new(value: Rc<Value>, path: Option<EcoString>, line: u32) -> Self {
        Self { value, path, line }
    }

    /// Returns the bound value.
    #[must_use]
    pub fn value(&self) -> &Rc<Value> {
        &self.value
    }

    /// Returns the manifest path of the assignment, if known.
    #[must_use]
    pub fn path(&self) -> Option<&EcoString> {
        self.path.as_ref()
    }

    /// Returns the line of the assignment.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// One default installed by a `Type { … }` expression.
#[derive(Debug, Clone)]
pub struct ScopeDefault {
    /// The attribute name.
    pub name: EcoString,
    /// Assignment or append.
    pub op: AttributeOperator,
    /// The evaluated value.
    pub value: Rc<Value>,
}

/// A runtime scope.
#[derive(Debug)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    facts: Option<Rc<dyn FactProvider>>,
    resource: Option<ResourceRef>,
    variables: RefCell<HashMap<EcoString, AssignedVariable>>,
    defaults: RefCell<HashMap<EcoString, Vec<ScopeDefault>>>,
}

impl std::fmt::Debug for dyn FactProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FactProvider")
    }
}

impl Scope {
    /// Creates a scope with a parent.
    #[must_use]
    pub fn new(parent: Rc<Scope>, resource: Option<ResourceRef>) -> Self {
        Self {
            parent: Some(parent),
            facts: None,
            resource,
            variables: RefCell::new(HashMap::new()),
            defaults: RefCell::new(HashMap::new()),
        }
    }

    /// Creates the top scope with a fact provider.
    #[must_use]
    pub fn top(facts: Option<Rc<dyn FactProvider>>, resource: Option<ResourceRef>) -> Self {
        Self {
            parent: None,
            facts,
            resource,
            variables: RefCell::new(HashMap::new()),
            defaults: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the parent scope, or `None` at top.
    #[must_use]
    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Returns the resource associated with the scope (its container).
    #[must_use]
    pub fn resource(&self) -> Option<&ResourceRef> {
        self.resource.as_ref()
    }

    /// Qualifies a name with the scope's class name.
    #[must_use]
    pub fn qualify(&self, name: &str) -> EcoString {
        if let Some(stripped) = name.strip_prefix("::") {
            return stripped.into();
        }
        match &self.resource {
            Some(resource) if resource.is_class() && resource.title() != "main" => {
                ecow::eco_format!("{}::{name}", resource.title())
            }
            _ => name.into(),
        }
    }

    /// Sets a variable in the scope.
    ///
    /// Returns the previously assigned binding if the name is already bound
    /// (including a fact of the same name at top scope); the caller reports
    /// the error.
    pub fn set(
        &self,
        name: impl Into<EcoString>,
        value: Rc<Value>,
        path: Option<EcoString>,
        line: u32,
    ) -> Option<AssignedVariable> {
        let name = name.into();
        if let Some(existing) = self.variables.borrow().get(&name) {
            return Some(existing.clone());
        }
        // A fact of the same name shadows the assignment
        if self.facts.is_some() {
            if let Some(existing) = self.get_local(&name) {
                return Some(existing);
            }
        }
        self.variables
            .borrow_mut()
            .insert(name, AssignedVariable::new(value, path, line));
        None
    }

    /// Looks up a variable in this scope chain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AssignedVariable> {
        if let Some(found) = self.get_local(name) {
            return Some(found);
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Looks up a variable in this scope only, materialising facts.
    fn get_local(&self, name: &str) -> Option<AssignedVariable> {
        if let Some(existing) = self.variables.borrow().get(name) {
            return Some(existing.clone());
        }

        let facts = self.facts.as_ref()?;
        let value = if name == "facts" {
            let mut hash = ValueHash::new();
            for fact in facts.names() {
                if let Some(value) = facts.lookup(&fact) {
                    hash.insert(Value::String(fact), value);
                }
            }
            Value::Hash(hash)
        } else {
            facts.lookup(name)?
        };

        let binding = AssignedVariable::new(Rc::new(value), None, 0);
        self.variables
            .borrow_mut()
            .insert(name.into(), binding.clone());
        Some(binding)
    }

    /// Installs resource defaults for a type in this scope.
    pub fn add_defaults(&self, type_name: EcoString, defaults: Vec<ScopeDefault>) {
        self.defaults
            .borrow_mut()
            .entry(type_name)
            .or_default()
            .extend(defaults);
    }

    /// Collects the effective defaults for a type: ancestors first, so a
    /// descendant's assignment wins and `+>` appends to the inherited
    /// value.
    #[must_use]
    pub fn defaults_for(&self, type_name: &str) -> IndexMap<EcoString, Rc<Value>> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            chain.push(scope);
            current = scope.parent.as_deref();
        }

        let mut effective: IndexMap<EcoString, Rc<Value>> = IndexMap::new();
        for scope in chain.into_iter().rev() {
            let defaults = scope.defaults.borrow();
            let Some(defaults) = defaults.get(type_name) else {
                continue;
            };
            for default in defaults {
                match default.op {
                    AttributeOperator::Assign => {
                        effective.insert(default.name.clone(), Rc::clone(&default.value));
                    }
                    AttributeOperator::Append => {
                        let mut merged = effective
                            .get(&default.name)
                            .map(|existing| to_array((**existing).clone(), false))
                            .unwrap_or_default();
                        merged.extend(to_array((*default.value).clone(), false));
                        effective.insert(default.name.clone(), Rc::new(Value::Array(merged)));
                    }
                }
            }
        }
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::MemoryFacts;

    fn top_with_facts() -> Rc<Scope> {
        let facts = MemoryFacts::new().with("os", "linux");
        Rc::new(Scope::top(Some(Rc::new(facts)), None))
    }

    #[test]
    fn set_and_get() {
        let top = Rc::new(Scope::top(None, None));
        assert!(top.set("x", Rc::new(Value::Integer(1)), None, 1).is_none());
        let binding = top.get("x").unwrap();
        assert_eq!(**binding.value(), Value::Integer(1));
    }

    #[test]
    fn reassignment_returns_previous_binding() {
        let top = Rc::new(Scope::top(None, None));
        top.set("x", Rc::new(Value::Integer(1)), Some("a.mf".into()), 3);
        let previous = top
            .set("x", Rc::new(Value::Integer(2)), None, 9)
            .expect("previous binding");
        assert_eq!(previous.line(), 3);
        assert_eq!(previous.path().map(EcoString::as_str), Some("a.mf"));
    }

    #[test]
    fn nested_scopes_shadow() {
        let top = Rc::new(Scope::top(None, None));
        top.set("x", Rc::new(Value::Integer(1)), None, 1);
        let child = Scope::new(Rc::clone(&top), None);
        child.set("x", Rc::new(Value::Integer(2)), None, 2);
        assert_eq!(**child.get("x").unwrap().value(), Value::Integer(2));
        assert_eq!(**top.get("x").unwrap().value(), Value::Integer(1));
    }

    #[test]
    fn facts_materialise_at_top() {
        let top = top_with_facts();
        assert_eq!(**top.get("os").unwrap().value(), Value::from("linux"));
        // Facts cannot be reassigned
        assert!(top.set("os", Rc::new(Value::from("bsd")), None, 1).is_some());
    }

    #[test]
    fn facts_hash_is_available() {
        let top = top_with_facts();
        let binding = top.get("facts").unwrap();
        let Value::Hash(hash) = &**binding.value() else {
            panic!("expected hash");
        };
        assert_eq!(hash.get(&Value::from("os")), Some(&Value::from("linux")));
    }

    #[test]
    fn qualify_uses_class_scope() {
        let top = Rc::new(Scope::top(None, None));
        let class_scope = Scope::new(top, Some(ResourceRef::class("apache")));
        assert_eq!(class_scope.qualify("port"), "apache::port");
        assert_eq!(class_scope.qualify("::port"), "port");
    }

    #[test]
    fn defaults_inherit_and_append() {
        let top = Rc::new(Scope::top(None, None));
        top.add_defaults(
            "File".into(),
            vec![ScopeDefault {
                name: "mode".into(),
                op: AttributeOperator::Assign,
                value: Rc::new(Value::from("0644")),
            }],
        );
        let child = Scope::new(Rc::clone(&top), None);
        child.add_defaults(
            "File".into(),
            vec![
                ScopeDefault {
                    name: "mode".into(),
                    op: AttributeOperator::Assign,
                    value: Rc::new(Value::from("0600")),
                },
                ScopeDefault {
                    name: "require".into(),
                    op: AttributeOperator::Append,
                    value: Rc::new(Value::from("File['/etc']")),
                },
            ],
        );

        let effective = child.defaults_for("File");
        assert_eq!(**effective.get("mode").unwrap(), Value::from("0600"));
        assert!(matches!(&**effective.get("require").unwrap(), Value::Array(_)));

        // The parent's defaults are unaffected
        let top_effective = top.defaults_for("File");
        assert_eq!(**top_effective.get("mode").unwrap(), Value::from("0644"));
    }
}
