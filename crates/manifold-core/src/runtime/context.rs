// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The evaluation context.
//!
//! One [`EvaluationContext`] exists per compilation. It owns the catalog
//! (the single writable store), the scope stack, the named (class) scopes,
//! the node scope, the match-variable stack, and the logger. Every catalog
//! mutation and every scope push/pop during evaluation goes through it.

use std::collections::HashMap;
use std::rc::Rc;

use ecow::EcoString;

use crate::catalog::{Catalog, ExportedResourceStore, ResourceRef};
use crate::diagnostics::Logger;
use crate::facts::FactProvider;
use crate::values::Value;

use super::scope::Scope;

/// The evaluation context for a compilation.
pub struct EvaluationContext<'a> {
    /// The catalog being compiled.
    pub catalog: Catalog,
    logger: Logger<'a>,
    store: &'a dyn ExportedResourceStore,
    scope_stack: Vec<Rc<Scope>>,
    named_scopes: HashMap<EcoString, Rc<Scope>>,
    node_scope: Option<Rc<Scope>>,
    match_stack: Vec<Option<Vec<Value>>>,
}

/// The outcome of a qualified variable lookup.
pub struct Lookup {
    /// The value, if the variable was found.
    pub value: Option<Rc<Value>>,
    /// A warning to emit (missing class scope), if any.
    pub warning: Option<String>,
}

impl<'a> EvaluationContext<'a> {
    /// Creates an evaluation context. The top scope consults `facts` and is
    /// associated with `Class[main]`.
    pub fn new(
        catalog: Catalog,
        facts: Option<Rc<dyn FactProvider>>,
        logger: Logger<'a>,
        store: &'a dyn ExportedResourceStore,
    ) -> Self {
        let top = Rc::new(Scope::top(facts, Some(ResourceRef::class("main"))));
        let mut named_scopes = HashMap::new();
        named_scopes.insert(EcoString::new(), Rc::clone(&top));
        Self {
            catalog,
            logger,
            store,
            scope_stack: vec![top],
            named_scopes,
            node_scope: None,
            match_stack: vec![None],
        }
    }

    /// Returns the logger.
    pub fn logger(&mut self) -> &mut Logger<'a> {
        &mut self.logger
    }

    /// Returns the exported-resource store.
    #[must_use]
    pub fn store(&self) -> &'a dyn ExportedResourceStore {
        self.store
    }

    /// Consumes the context, returning the compiled catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// Returns the current scope.
    #[must_use]
    pub fn current_scope(&self) -> Rc<Scope> {
        Rc::clone(self.scope_stack.last().expect("the top scope always exists"))
    }

    /// Returns the top scope.
    #[must_use]
    pub fn top_scope(&self) -> Rc<Scope> {
        Rc::clone(self.scope_stack.first().expect("the top scope always exists"))
    }

    /// Returns the node scope, if a node is being evaluated.
    #[must_use]
    pub fn node_scope(&self) -> Option<Rc<Scope>> {
        self.node_scope.clone()
    }

    /// Returns the node scope if present, otherwise the top scope.
    #[must_use]
    pub fn node_or_top(&self) -> Rc<Scope> {
        self.node_scope().unwrap_or_else(|| self.top_scope())
    }

    /// Pushes a local scope; `None` creates an ephemeral child of the
    /// current scope.
    pub fn push_scope(&mut self, scope: Option<Rc<Scope>>) {
        let scope =
            scope.unwrap_or_else(|| Rc::new(Scope::new(self.current_scope(), None)));
        self.scope_stack.push(scope);
    }

    /// Pops the current local scope.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scope_stack.len() > 1, "cannot pop the top scope");
        if self.scope_stack.len() > 1 {
            self.scope_stack.pop();
        }
    }

    /// Enters the node scope (a child of the top scope).
    pub fn push_node_scope(&mut self, resource: ResourceRef) {
        let scope = Rc::new(Scope::new(self.top_scope(), Some(resource)));
        self.node_scope = Some(Rc::clone(&scope));
        self.scope_stack.push(scope);
    }

    /// Leaves the node scope.
    pub fn pop_node_scope(&mut self) {
        self.scope_stack.pop();
        self.node_scope = None;
    }

    /// Registers a named scope (a class scope or `settings`).
    ///
    /// Returns false if the name is already registered.
    pub fn add_named_scope(&mut self, name: impl Into<EcoString>, scope: Rc<Scope>) -> bool {
        use std::collections::hash_map::Entry;
        match self.named_scopes.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(scope);
                true
            }
        }
    }

    /// Finds a named scope.
    #[must_use]
    pub fn find_scope(&self, name: &str) -> Option<Rc<Scope>> {
        self.named_scopes.get(name).cloned()
    }

    /// Returns the class resources of the current scope's parents,
    /// innermost first. Only class-inheritance parents count (the implicit
    /// `Class[main]`, `Class[settings]`, and node containers do not grant
    /// override rights).
    #[must_use]
    pub fn scope_ancestry(&self) -> Vec<ResourceRef> {
        let mut ancestry = Vec::new();
        let current = self.current_scope();
        let mut scope = current.parent().cloned();
        while let Some(s) = scope {
            if let Some(resource) = s.resource() {
                let implicit = !resource.is_class()
                    || resource.title() == "main"
                    || resource.title() == "settings";
                if !implicit {
                    ancestry.push(resource.clone());
                }
            }
            scope = s.parent().cloned();
        }
        ancestry
    }

    // ------------------------------------------------------------------
    // Match variables
    // ------------------------------------------------------------------

    /// Pushes a match scope (created by `if`/`unless`/`case`/selectors and
    /// lambda invocations).
    pub fn push_match_scope(&mut self) {
        self.match_stack.push(None);
    }

    /// Pops a match scope, restoring the outer `$0…$n`.
    pub fn pop_match_scope(&mut self) {
        debug_assert!(!self.match_stack.is_empty());
        self.match_stack.pop();
    }

    /// Sets the match variables in the innermost match scope.
    pub fn set_matches(&mut self, matches: Vec<Value>) {
        if let Some(slot) = self.match_stack.last_mut() {
            *slot = Some(matches);
        }
    }

    /// Looks up a match variable by index, walking outward to the nearest
    /// scope with matches set.
    #[must_use]
    pub fn match_variable(&self, index: usize) -> Option<Value> {
        for matches in self.match_stack.iter().rev() {
            if let Some(matches) = matches {
                return matches.get(index).cloned();
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Variable lookup
    // ------------------------------------------------------------------

    /// Looks up a (possibly qualified) variable.
    ///
    /// `$name` walks the current scope chain (facts at top); `$a::b::c`
    /// resolves `a::b` as a named scope; `$::x` reads from top scope.
    /// A missing class scope produces a warning describing whether the
    /// class is undefined or merely undeclared.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Lookup {
        let Some(position) = name.rfind("::") else {
            return Lookup {
                value: self
                    .current_scope()
                    .get(name)
                    .map(|binding| Rc::clone(binding.value())),
                warning: None,
            };
        };

        let global = name.starts_with("::");
        let namespace = if global {
            &name[2..position.max(2)]
        } else {
            &name[..position]
        };
        let variable = &name[position + 2..];

        if namespace.is_empty() {
            return Lookup {
                value: self
                    .top_scope()
                    .get(variable)
                    .map(|binding| Rc::clone(binding.value())),
                warning: None,
            };
        }

        if let Some(scope) = self.find_scope(namespace) {
            return Lookup {
                value: scope
                    .get(variable)
                    .map(|binding| Rc::clone(binding.value())),
                warning: None,
            };
        }

        let warning = if self.catalog.find_class(&namespace.to_lowercase()).is_none() {
            Some(format!(
                "could not look up variable ${name} because class '{namespace}' is not defined."
            ))
        } else if self
            .catalog
            .find_resource(&ResourceRef::class(namespace))
            .is_none()
        {
            Some(format!(
                "could not look up variable ${name} because class '{namespace}' has not been declared."
            ))
        } else {
            None
        };
        Lookup {
            value: None,
            warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EmptyStore;
    use crate::diagnostics::{CollectingSink, Logger};
    use crate::facts::MemoryFacts;

    fn context<'a>(
        sink: &'a mut CollectingSink,
        store: &'a EmptyStore,
    ) -> EvaluationContext<'a> {
        let facts: Rc<dyn FactProvider> = Rc::new(MemoryFacts::new().with("os", "linux"));
        EvaluationContext::new(Catalog::new(), Some(facts), Logger::new(sink), store)
    }

    #[test]
    fn top_scope_reads_facts() {
        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let context = context(&mut sink, &store);
        let lookup = context.lookup("os");
        assert_eq!(*lookup.value.unwrap(), Value::from("linux"));
    }

    #[test]
    fn qualified_lookup_reads_named_scopes() {
        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let mut context = context(&mut sink, &store);

        let scope = Rc::new(Scope::new(
            context.top_scope(),
            Some(ResourceRef::class("apache")),
        ));
        scope.set("port", Rc::new(Value::Integer(80)), None, 1);
        assert!(context.add_named_scope("apache", scope));

        let lookup = context.lookup("apache::port");
        assert_eq!(*lookup.value.unwrap(), Value::Integer(80));

        // $::os reads from top
        let lookup = context.lookup("::os");
        assert_eq!(*lookup.value.unwrap(), Value::from("linux"));
    }

    #[test]
    fn missing_class_scope_warns() {
        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let context = context(&mut sink, &store);
        let lookup = context.lookup("nope::x");
        assert!(lookup.value.is_none());
        assert!(lookup.warning.unwrap().contains("is not defined"));
    }

    #[test]
    fn match_scopes_nest_and_restore() {
        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let mut context = context(&mut sink, &store);

        context.push_match_scope();
        context.set_matches(vec![Value::from("outer")]);

        context.push_match_scope();
        assert_eq!(context.match_variable(0), Some(Value::from("outer")));
        context.set_matches(vec![Value::from("inner")]);
        assert_eq!(context.match_variable(0), Some(Value::from("inner")));
        context.pop_match_scope();

        assert_eq!(context.match_variable(0), Some(Value::from("outer")));
        context.pop_match_scope();
        assert_eq!(context.match_variable(0), None);
    }

    #[test]
    fn node_scope_chains_to_top() {
        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let mut context = context(&mut sink, &store);
        context.push_node_scope(ResourceRef::new("node", "web01"));
        assert!(context.node_scope().is_some());
        let lookup = context.lookup("os");
        assert!(lookup.value.is_some());
        context.pop_node_scope();
        assert!(context.node_scope().is_none());
    }
}
