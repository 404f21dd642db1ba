// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The catalog: the single mutable store a compilation builds up.
//!
//! The catalog owns the declared resources (in declaration order), the
//! class/defined-type/node definition registries, the declared-class set,
//! deferred attribute overrides, pending collectors, and — after
//! [`Catalog::finalize`] — the relationship edge set.
//!
//! # Finalisation
//!
//! Finalisation runs in a fixed order: collectors are re-run (realizing
//! virtual resources declared after the collector), deferred overrides are
//! resolved (an override whose target never appeared is an error; one
//! waiting on a never-realized virtual is dropped with it), unrealized
//! virtual and exported resources are culled, relationship metaparameters
//! become edges (`require`/`subscribe` reverse their endpoints), and the
//! edge set is checked for cycles.

mod resource;
mod scanner;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ecow::EcoString;
use indexmap::IndexMap;

use crate::ast::{
    AttributeOperator, ClassDefinitionExpression, DefinedTypeExpression, NodeDefinitionExpression,
    QueryOperator,
};
use crate::runtime::{EvalResult, EvaluationError};
use crate::source_analysis::{SourceFile, Span};
use crate::values::{Value, ValueRegex, equals, is_undef};

pub use resource::{
    Attributes, METAPARAMETERS, Resource, ResourceRef, ResourceState, each_resource,
    is_metaparameter,
};
pub use scanner::DefinitionScanner;

/// Class names reserved for the runtime's bootstrap resources.
pub const RESERVED_CLASS_NAMES: &[&str] = &["main", "settings"];

/// The kind of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// The `before` metaparameter or `->` operator.
    Before,
    /// The `notify` metaparameter or `~>` operator.
    Notify,
    /// The `require` metaparameter or `<-` operator.
    Require,
    /// The `subscribe` metaparameter or `<~` operator.
    Subscribe,
}

impl Relationship {
    /// Returns the metaparameter name for this relationship.
    #[must_use]
    pub const fn parameter(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Notify => "notify",
            Self::Require => "require",
            Self::Subscribe => "subscribe",
        }
    }

    /// Returns true if the edge's endpoints swap (the declared target runs
    /// first).
    #[must_use]
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Require | Self::Subscribe)
    }
}

/// A directed relationship edge: `source` is applied before `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The resource applied first.
    pub source: ResourceRef,
    /// The resource applied second.
    pub target: ResourceRef,
    /// The relationship that created the edge.
    pub relationship: Relationship,
}

/// A registered class definition. A class may be defined multiple times;
/// all definitions must agree on the parent.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    /// The fully-qualified lowercase class name.
    pub name: EcoString,
    /// The lowercase parent class name, if the definition inherits.
    pub parent: Option<EcoString>,
    /// The definition expression.
    pub expression: Rc<ClassDefinitionExpression>,
    /// The manifest the class was defined in.
    pub source: Rc<SourceFile>,
}

impl ClassDefinition {
    /// Returns the 1-based line of the definition.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.source.location(self.expression.span.start()).line
    }
}

/// A registered defined type. Only one definition may exist per name.
#[derive(Debug, Clone)]
pub struct DefinedType {
    /// The fully-qualified lowercase type name.
    pub name: EcoString,
    /// The definition expression.
    pub expression: Rc<DefinedTypeExpression>,
    /// The manifest the type was defined in.
    pub source: Rc<SourceFile>,
}

impl DefinedType {
    /// Returns the 1-based line of the definition.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.source.location(self.expression.span.start()).line
    }
}

/// A registered node definition.
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    /// The definition expression.
    pub expression: Rc<NodeDefinitionExpression>,
    /// The manifest the node was defined in.
    pub source: Rc<SourceFile>,
}

impl NodeDefinition {
    /// Returns the 1-based line of the definition.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.source.location(self.expression.span.start()).line
    }
}

/// One evaluated attribute operation inside an override.
#[derive(Debug, Clone)]
pub struct EvaluatedOperation {
    /// The attribute name.
    pub name: EcoString,
    /// The attribute name's location.
    pub name_span: Span,
    /// Assignment or append.
    pub op: AttributeOperator,
    /// The evaluated value.
    pub value: Value,
}

/// An attribute override (`Ref { attrs }`), evaluated and queued against a
/// resource reference.
#[derive(Debug, Clone)]
pub struct AttributeOverride {
    /// The evaluated operations.
    pub operations: Vec<EvaluatedOperation>,
    /// The container resources of the overriding scope's parents; an
    /// override may re-set attributes of a resource whose container appears
    /// here (class-inheritance override).
    pub ancestry: Vec<ResourceRef>,
    /// The manifest the override appeared in.
    pub source: Rc<SourceFile>,
    /// The override's location.
    pub span: Span,
}

/// A collector query compiled to evaluated values.
#[derive(Debug, Clone)]
pub enum CompiledQuery {
    /// An attribute test.
    Test {
        /// The attribute name; `title` matches the resource title.
        attribute: EcoString,
        /// The test operator.
        op: QueryOperator,
        /// The evaluated expected value.
        value: Value,
    },
    /// Both queries must match.
    And(Box<CompiledQuery>, Box<CompiledQuery>),
    /// Either query must match.
    Or(Box<CompiledQuery>, Box<CompiledQuery>),
}

impl CompiledQuery {
    /// Returns true if the resource satisfies this query.
    #[must_use]
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Self::Test {
                attribute,
                op,
                value,
            } => {
                let actual = if attribute == "title" {
                    Value::String(resource.reference().title().clone())
                } else {
                    resource
                        .attributes()
                        .get(attribute)
                        .map_or(Value::Undef, |v| (**v).clone())
                };
                let result = equals(&actual, value);
                match op {
                    QueryOperator::Equals => result,
                    QueryOperator::NotEquals => !result,
                }
            }
            Self::And(left, right) => left.matches(resource) && right.matches(resource),
            Self::Or(left, right) => left.matches(resource) || right.matches(resource),
        }
    }
}

/// A pending collector, re-run at finalisation.
#[derive(Debug, Clone)]
pub struct Collector {
    /// The normalised resource type being collected.
    pub type_name: EcoString,
    /// Whether the collector also imports exported resources (`<<| |>>`).
    pub exported: bool,
    /// The compiled query; `None` matches everything.
    pub query: Option<CompiledQuery>,
}

/// An exported resource imported from the external store.
#[derive(Debug, Clone)]
pub struct ExportedResource {
    /// The resource reference.
    pub reference: ResourceRef,
    /// The resource attributes.
    pub attributes: Attributes,
}

/// The external exported-resource store consulted by `<<| |>>` collectors.
///
/// The compiler only defines the interface; the default store is empty.
pub trait ExportedResourceStore {
    /// Returns the exported resources of the given type matching the query.
    fn query(&self, type_name: &str, query: Option<&CompiledQuery>) -> Vec<ExportedResource>;
}

/// The built-in store: always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl ExportedResourceStore for EmptyStore {
    fn query(&self, _type_name: &str, _query: Option<&CompiledQuery>) -> Vec<ExportedResource> {
        Vec::new()
    }
}

/// The catalog being compiled.
#[derive(Debug, Default)]
pub struct Catalog {
    resources: IndexMap<ResourceRef, Resource>,
    edges: Vec<Edge>,
    classes: HashMap<EcoString, Vec<ClassDefinition>>,
    defined_types: HashMap<EcoString, DefinedType>,
    nodes: Vec<NodeDefinition>,
    named_nodes: HashMap<EcoString, usize>,
    regex_nodes: Vec<(ValueRegex, usize)>,
    default_node: Option<usize>,
    declared_classes: HashSet<EcoString>,
    pending_overrides: IndexMap<ResourceRef, Vec<AttributeOverride>>,
    collectors: Vec<Collector>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// Adds a resource to the catalog.
    ///
    /// # Errors
    /// Fails if a resource with the same reference was already declared.
    pub fn add_resource(&mut self, resource: Resource) -> EvalResult<()> {
        let reference = resource.reference().clone();
        if let Some(existing) = self.resources.get(&reference) {
            return Err(EvaluationError::new(format!(
                "resource {reference} was previously declared at {}:{}.",
                existing.path(),
                existing.line()
            )));
        }

        let is_real = resource.state().is_real();
        self.resources.insert(reference.clone(), resource);

        // A late-declared real resource resolves any overrides queued for it
        if is_real {
            self.apply_pending_overrides(&reference)?;
        }
        Ok(())
    }

    /// Finds a resource by reference.
    #[must_use]
    pub fn find_resource(&self, reference: &ResourceRef) -> Option<&Resource> {
        self.resources.get(reference)
    }

    /// Finds a resource by reference for mutation.
    pub fn find_resource_mut(&mut self, reference: &ResourceRef) -> Option<&mut Resource> {
        self.resources.get_mut(reference)
    }

    /// Iterates over the resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Returns the relationship edges (populated by [`Catalog::finalize`]).
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Registers a class definition.
    pub fn define_class(&mut self, definition: ClassDefinition) {
        self.classes
            .entry(definition.name.clone())
            .or_default()
            .push(definition);
    }

    /// Finds the definitions of a class by lowercase qualified name.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<&[ClassDefinition]> {
        self.classes
            .get(name)
            .map(Vec::as_slice)
            .filter(|definitions| !definitions.is_empty())
    }

    /// Returns true if the class body has already been evaluated.
    #[must_use]
    pub fn is_class_declared(&self, name: &str) -> bool {
        self.declared_classes.contains(name)
    }

    /// Marks a class as declared.
    pub fn mark_class_declared(&mut self, name: impl Into<EcoString>) {
        self.declared_classes.insert(name.into());
    }

    /// Iterates over the declared class names.
    pub fn declared_classes(&self) -> impl Iterator<Item = &EcoString> {
        self.declared_classes.iter()
    }

    /// Registers a defined type.
    ///
    /// # Errors
    /// Fails if the type was already defined.
    pub fn define_type(&mut self, definition: DefinedType) -> EvalResult<()> {
        if let Some(existing) = self.defined_types.get(&definition.name) {
            return Err(EvaluationError::at(
                format!(
                    "defined type '{}' was previously defined at {}:{}.",
                    definition.name,
                    existing.source.path(),
                    existing.line()
                ),
                Rc::clone(&definition.source),
                definition.expression.name_span,
            ));
        }
        self.defined_types.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Finds a defined type by lowercase qualified name.
    #[must_use]
    pub fn find_defined_type(&self, name: &str) -> Option<&DefinedType> {
        self.defined_types.get(name)
    }

    /// Registers a node definition.
    ///
    /// # Errors
    /// Fails on duplicate names, duplicate regexes, a second default node,
    /// or an invalid regex pattern.
    pub fn define_node(&mut self, definition: NodeDefinition) -> EvalResult<()> {
        use crate::ast::HostnameKind;

        let index = self.nodes.len();
        for hostname in &definition.expression.hostnames {
            match &hostname.kind {
                HostnameKind::Default => {
                    if let Some(previous) = self.default_node {
                        let previous = &self.nodes[previous];
                        return Err(EvaluationError::at(
                            format!(
                                "a default node was previously defined at {}:{}.",
                                previous.source.path(),
                                previous.line()
                            ),
                            Rc::clone(&definition.source),
                            hostname.span,
                        ));
                    }
                    self.default_node = Some(index);
                }
                HostnameKind::Regex(pattern) => {
                    if let Some((_, previous)) = self
                        .regex_nodes
                        .iter()
                        .find(|(existing, _)| existing.pattern() == pattern)
                    {
                        let previous = &self.nodes[*previous];
                        return Err(EvaluationError::at(
                            format!(
                                "node /{pattern}/ was previously defined at {}:{}.",
                                previous.source.path(),
                                previous.line()
                            ),
                            Rc::clone(&definition.source),
                            hostname.span,
                        ));
                    }
                    let regex = ValueRegex::new(pattern.clone()).map_err(|error| {
                        EvaluationError::at(
                            format!("invalid regular expression: {error}"),
                            Rc::clone(&definition.source),
                            hostname.span,
                        )
                    })?;
                    self.regex_nodes.push((regex, index));
                }
                HostnameKind::Name(name) | HostnameKind::String(name) => {
                    let name: EcoString = name.to_lowercase().into();
                    if let Some(previous) = self.named_nodes.get(&name) {
                        let previous = &self.nodes[*previous];
                        return Err(EvaluationError::at(
                            format!(
                                "node '{name}' was previously defined at {}:{}.",
                                previous.source.path(),
                                previous.line()
                            ),
                            Rc::clone(&definition.source),
                            hostname.span,
                        ));
                    }
                    self.named_nodes.insert(name, index);
                }
            }
        }
        self.nodes.push(definition);
        Ok(())
    }

    /// Returns true if any node definitions exist.
    #[must_use]
    pub fn has_node_definitions(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Matches a node against the registered definitions: exact names
    /// first (the caller supplies subnames most-specific-first), then
    /// regexes, then the default node.
    #[must_use]
    pub fn match_node(&self, names: &[EcoString]) -> Option<(EcoString, &NodeDefinition)> {
        for name in names {
            if let Some(&index) = self.named_nodes.get(name) {
                return Some((name.clone(), &self.nodes[index]));
            }
        }
        for name in names {
            for (regex, index) in &self.regex_nodes {
                if regex.regex().is_match(name) {
                    let display = ecow::eco_format!("/{}/", regex.pattern());
                    return Some((display, &self.nodes[*index]));
                }
            }
        }
        self.default_node
            .map(|index| (EcoString::from("default"), &self.nodes[index]))
    }

    // ------------------------------------------------------------------
    // Overrides
    // ------------------------------------------------------------------

    /// Queues or applies an attribute override for a resource.
    ///
    /// Overrides of real resources apply immediately; others wait for the
    /// resource to appear or be realized.
    ///
    /// # Errors
    /// Propagates attribute conflicts from immediate application.
    pub fn add_override(
        &mut self,
        reference: ResourceRef,
        attribute_override: AttributeOverride,
    ) -> EvalResult<()> {
        if let Some(resource) = self.resources.get_mut(&reference) {
            if resource.state().is_real() {
                return apply_override(resource, &attribute_override);
            }
        }
        self.pending_overrides
            .entry(reference)
            .or_default()
            .push(attribute_override);
        Ok(())
    }

    /// Applies any queued overrides for a (now real) resource.
    fn apply_pending_overrides(&mut self, reference: &ResourceRef) -> EvalResult<()> {
        let Some(overrides) = self.pending_overrides.shift_remove(reference) else {
            return Ok(());
        };
        let resource = self
            .resources
            .get_mut(reference)
            .expect("caller ensures the resource exists");
        for attribute_override in &overrides {
            apply_override(resource, attribute_override)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Realization & collectors
    // ------------------------------------------------------------------

    /// Realizes a virtual or exported resource and applies its queued
    /// overrides.
    ///
    /// # Errors
    /// Fails if the resource does not exist in the catalog.
    pub fn realize(&mut self, reference: &ResourceRef) -> EvalResult<()> {
        let Some(resource) = self.resources.get_mut(reference) else {
            return Err(EvaluationError::new(format!(
                "resource {reference} does not exist in the catalog."
            )));
        };
        resource.realize();
        self.apply_pending_overrides(reference)
    }

    /// Adds a collector; it runs immediately and again at finalisation.
    ///
    /// # Errors
    /// Propagates override conflicts surfaced by realization.
    pub fn collect(
        &mut self,
        collector: Collector,
        store: &dyn ExportedResourceStore,
    ) -> EvalResult<()> {
        self.run_collector(&collector, store)?;
        self.collectors.push(collector);
        Ok(())
    }

    /// Runs one collector over the current catalog contents.
    fn run_collector(
        &mut self,
        collector: &Collector,
        store: &dyn ExportedResourceStore,
    ) -> EvalResult<()> {
        let matches: Vec<ResourceRef> = self
            .resources
            .values()
            .filter(|resource| {
                resource.reference().type_name() == &collector.type_name
                    && !resource.state().is_real()
                    && collector
                        .query
                        .as_ref()
                        .is_none_or(|query| query.matches(resource))
            })
            .map(|resource| resource.reference().clone())
            .collect();

        for reference in matches {
            self.realize(&reference)?;
        }

        if collector.exported {
            for imported in store.query(&collector.type_name, collector.query.as_ref()) {
                if self.resources.contains_key(&imported.reference) {
                    continue;
                }
                self.add_resource(Resource::new(
                    imported.reference,
                    imported.attributes,
                    ResourceState::Realized,
                    "<exported>",
                    0,
                    None,
                ))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Finalisation
    // ------------------------------------------------------------------

    /// Finalizes the catalog: collectors, deferred overrides, virtual
    /// culling, relationship edges, and cycle detection.
    ///
    /// # Errors
    /// Fails on unresolved overrides, dangling or self-referential
    /// relationships, or dependency cycles.
    pub fn finalize(&mut self, store: &dyn ExportedResourceStore) -> EvalResult<()> {
        // Re-run collectors to catch virtuals declared after the collector.
        let collectors = std::mem::take(&mut self.collectors);
        for collector in &collectors {
            self.run_collector(collector, store)?;
        }
        self.collectors = collectors;

        // Resolve remaining overrides: a missing target is an error; a
        // target that stayed virtual is culled below along with its
        // overrides.
        let pending = std::mem::take(&mut self.pending_overrides);
        for (reference, overrides) in pending {
            match self.resources.get_mut(&reference) {
                None => {
                    let first = overrides.first().expect("queued overrides are non-empty");
                    return Err(EvaluationError::at(
                        format!("resource {reference} does not exist in the catalog."),
                        Rc::clone(&first.source),
                        first.span,
                    ));
                }
                Some(resource) if resource.state().is_real() => {
                    for attribute_override in &overrides {
                        apply_override(resource, attribute_override)?;
                    }
                }
                Some(_) => {}
            }
        }

        // Cull virtual and exported resources that were never realized.
        self.resources.retain(|_, resource| resource.state().is_real());

        self.populate_edges()?;
        self.detect_cycles()
    }

    /// Builds the edge set from relationship metaparameters.
    fn populate_edges(&mut self) -> EvalResult<()> {
        let mut edges = Vec::new();

        for resource in self.resources.values() {
            for relationship in [
                Relationship::Before,
                Relationship::Notify,
                Relationship::Require,
                Relationship::Subscribe,
            ] {
                let Some(parameter) = resource.attributes().get(relationship.parameter()) else {
                    continue;
                };
                let source_ref = resource.reference().clone();
                let result = each_resource(parameter, &mut |target| {
                    if self.resources.get(&target).is_none() {
                        return Err(format!(
                            "resource {source_ref} (declared at {}:{}) cannot form a '{}' relationship with resource {target}: the resource does not exist in the catalog.",
                            resource.path(),
                            resource.line(),
                            relationship.parameter(),
                        ));
                    }
                    if target == source_ref {
                        return Err(format!(
                            "resource {source_ref} (declared at {}:{}) cannot form a '{}' relationship with resource {target}: the relationship is self-referencing.",
                            resource.path(),
                            resource.line(),
                            relationship.parameter(),
                        ));
                    }
                    let (edge_source, edge_target) = if relationship.is_reversed() {
                        (target, source_ref.clone())
                    } else {
                        (source_ref.clone(), target)
                    };
                    let edge = Edge {
                        source: edge_source,
                        target: edge_target,
                        relationship,
                    };
                    if !edges.contains(&edge) {
                        edges.push(edge);
                    }
                    Ok(())
                });
                if let Err(message) = result {
                    // Callback errors carry the full text; normalisation
                    // failures need the relationship context added.
                    let error = if message.starts_with("resource ") {
                        EvaluationError::new(message)
                    } else {
                        EvaluationError::new(format!(
                            "resource {source_ref} (declared at {}:{}) cannot form a '{}' relationship: {message}",
                            resource.path(),
                            resource.line(),
                            relationship.parameter(),
                        ))
                    };
                    return Err(error);
                }
            }
        }

        self.edges = edges;
        Ok(())
    }

    /// Detects dependency cycles with an iterative depth-first search.
    fn detect_cycles(&self) -> EvalResult<()> {
        let indices: HashMap<&ResourceRef, usize> = self
            .resources
            .keys()
            .enumerate()
            .map(|(i, r)| (r, i))
            .collect();
        let mut adjacency = vec![Vec::new(); self.resources.len()];
        for edge in &self.edges {
            let (Some(&from), Some(&to)) = (indices.get(&edge.source), indices.get(&edge.target))
            else {
                continue;
            };
            adjacency[from].push(to);
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }

        let mut colors = vec![Color::White; adjacency.len()];
        let mut cycles: Vec<String> = Vec::new();

        for start in 0..adjacency.len() {
            if colors[start] != Color::White {
                continue;
            }
            // Stack of (node, next-child-index) with the grey path alongside
            let mut stack = vec![(start, 0usize)];
            let mut path = vec![start];
            colors[start] = Color::Grey;

            while let Some(&(node, child)) = stack.last() {
                if child < adjacency[node].len() {
                    stack.last_mut().expect("stack is non-empty").1 += 1;
                    let next = adjacency[node][child];
                    match colors[next] {
                        Color::Grey => {
                            let position = path
                                .iter()
                                .position(|&n| n == next)
                                .expect("grey nodes are on the path");
                            cycles.push(self.describe_cycle(&path[position..]));
                        }
                        Color::White => {
                            colors[next] = Color::Grey;
                            stack.push((next, 0));
                            path.push(next);
                        }
                        Color::Black => {}
                    }
                } else {
                    colors[node] = Color::Black;
                    stack.pop();
                    path.pop();
                }
            }
        }

        if cycles.is_empty() {
            return Ok(());
        }

        let mut message = format!(
            "found {} resource dependency cycle{}:\n",
            cycles.len(),
            if cycles.len() == 1 { "" } else { "s" }
        );
        for (i, cycle) in cycles.iter().enumerate() {
            if i > 0 {
                message.push('\n');
            }
            message.push_str(&format!("  {}. {cycle}", i + 1));
        }
        Err(EvaluationError::new(message))
    }

    /// Renders one cycle as `A declared at p:l => B declared at p:l => A`.
    fn describe_cycle(&self, path: &[usize]) -> String {
        let mut out = String::new();
        for (i, &index) in path.iter().enumerate() {
            if i > 0 {
                out.push_str(" => ");
            }
            let (reference, resource) = self
                .resources
                .get_index(index)
                .expect("cycle indices are valid");
            out.push_str(&format!(
                "{reference} declared at {}:{}",
                resource.path(),
                resource.line()
            ));
        }
        if let Some(&first) = path.first() {
            let (reference, _) = self
                .resources
                .get_index(first)
                .expect("cycle indices are valid");
            out.push_str(&format!(" => {reference}"));
        }
        out
    }
}

/// Applies one override to a resource.
fn apply_override(resource: &mut Resource, attribute_override: &AttributeOverride) -> EvalResult<()> {
    let inherited = resource
        .container()
        .is_some_and(|container| attribute_override.ancestry.contains(container));

    for operation in &attribute_override.operations {
        let name = operation.name.as_str();
        let already_set = resource.attributes().get(name).is_some();
        let error_at = |message: String| {
            EvaluationError::at(
                message,
                Rc::clone(&attribute_override.source),
                operation.name_span,
            )
        };

        match operation.op {
            AttributeOperator::Assign => {
                if already_set && !inherited {
                    if is_undef(&operation.value) {
                        return Err(error_at(format!(
                            "cannot remove attribute '{name}' from resource {}.",
                            resource.reference()
                        )));
                    }
                    return Err(error_at(format!(
                        "attribute '{name}' has already been set for resource {}.",
                        resource.reference()
                    )));
                }
                if inherited && is_undef(&operation.value) {
                    resource.attributes_mut().remove(name);
                } else {
                    resource
                        .attributes_mut()
                        .set(operation.name.clone(), operation.value.clone());
                }
            }
            AttributeOperator::Append => {
                if already_set && !inherited {
                    return Err(error_at(format!(
                        "attribute '{name}' has already been set for resource {} and cannot be appended to.",
                        resource.reference()
                    )));
                }
                if !resource
                    .attributes_mut()
                    .append(name, operation.value.clone(), true)
                {
                    return Err(error_at(format!("attribute '{name}' is not an array.")));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(type_name: &str, title: &str, state: ResourceState) -> Resource {
        Resource::new(
            ResourceRef::new(type_name, title),
            Attributes::new(),
            state,
            "site.mf",
            1,
            None,
        )
    }

    #[test]
    fn duplicate_resources_are_rejected() {
        let mut catalog = Catalog::new();
        catalog
            .add_resource(resource("file", "/x", ResourceState::Real))
            .unwrap();
        let error = catalog
            .add_resource(resource("File", "/x", ResourceState::Real))
            .unwrap_err();
        assert!(error.message().contains("previously declared"));
    }

    #[test]
    fn resources_iterate_in_declaration_order() {
        let mut catalog = Catalog::new();
        catalog
            .add_resource(resource("file", "/b", ResourceState::Real))
            .unwrap();
        catalog
            .add_resource(resource("file", "/a", ResourceState::Real))
            .unwrap();
        let titles: Vec<_> = catalog
            .resources()
            .map(|r| r.reference().title().clone())
            .collect();
        assert_eq!(titles, vec!["/b", "/a"]);
    }

    #[test]
    fn virtual_resources_are_culled_unless_realized() {
        let mut catalog = Catalog::new();
        catalog
            .add_resource(resource("user", "bob", ResourceState::Virtual))
            .unwrap();
        catalog
            .add_resource(resource("user", "alice", ResourceState::Virtual))
            .unwrap();
        catalog.realize(&ResourceRef::new("user", "bob")).unwrap();
        catalog.finalize(&EmptyStore).unwrap();

        assert!(catalog.find_resource(&ResourceRef::new("user", "bob")).is_some());
        assert!(catalog.find_resource(&ResourceRef::new("user", "alice")).is_none());
    }

    #[test]
    fn collector_realizes_matching_virtuals_including_late_ones() {
        let mut catalog = Catalog::new();
        let mut bob = resource("user", "bob", ResourceState::Virtual);
        bob.attributes_mut().set("group", Value::from("wheel"));
        catalog.add_resource(bob).unwrap();

        catalog
            .collect(
                Collector {
                    type_name: "User".into(),
                    exported: false,
                    query: Some(CompiledQuery::Test {
                        attribute: "group".into(),
                        op: QueryOperator::Equals,
                        value: Value::from("wheel"),
                    }),
                },
                &EmptyStore,
            )
            .unwrap();

        // Declared after the collector; caught by the finalisation re-run.
        let mut alice = resource("user", "alice", ResourceState::Virtual);
        alice.attributes_mut().set("group", Value::from("wheel"));
        catalog.add_resource(alice).unwrap();

        let mut carol = resource("user", "carol", ResourceState::Virtual);
        carol.attributes_mut().set("group", Value::from("other"));
        catalog.add_resource(carol).unwrap();

        catalog.finalize(&EmptyStore).unwrap();
        assert!(catalog.find_resource(&ResourceRef::new("user", "bob")).is_some());
        assert!(catalog.find_resource(&ResourceRef::new("user", "alice")).is_some());
        assert!(catalog.find_resource(&ResourceRef::new("user", "carol")).is_none());
    }

    #[test]
    fn overrides_defer_until_the_resource_appears() {
        let mut catalog = Catalog::new();
        let source = Rc::new(SourceFile::new("site.mf", "File['/x'] { mode => '0644' }"));
        catalog
            .add_override(
                ResourceRef::new("file", "/x"),
                AttributeOverride {
                    operations: vec![EvaluatedOperation {
                        name: "mode".into(),
                        name_span: Span::new(0, 4),
                        op: AttributeOperator::Assign,
                        value: Value::from("0644"),
                    }],
                    ancestry: Vec::new(),
                    source,
                    span: Span::new(0, 10),
                },
            )
            .unwrap();

        catalog
            .add_resource(resource("file", "/x", ResourceState::Real))
            .unwrap();
        let file = catalog
            .find_resource(&ResourceRef::new("file", "/x"))
            .unwrap();
        assert!(file.attributes().get("mode").is_some());
    }

    #[test]
    fn unresolved_override_fails_finalisation() {
        let mut catalog = Catalog::new();
        let source = Rc::new(SourceFile::new("site.mf", "File['/x'] { mode => '0644' }"));
        catalog
            .add_override(
                ResourceRef::new("file", "/missing"),
                AttributeOverride {
                    operations: Vec::new(),
                    ancestry: Vec::new(),
                    source,
                    span: Span::new(0, 10),
                },
            )
            .unwrap();
        let error = catalog.finalize(&EmptyStore).unwrap_err();
        assert!(error.message().contains("does not exist in the catalog"));
    }

    #[test]
    fn override_conflicts_are_errors() {
        let mut catalog = Catalog::new();
        let mut file = resource("file", "/x", ResourceState::Real);
        file.attributes_mut().set("mode", Value::from("0600"));
        catalog.add_resource(file).unwrap();

        let source = Rc::new(SourceFile::new("site.mf", "File['/x'] { mode => '0644' }"));
        let error = catalog
            .add_override(
                ResourceRef::new("file", "/x"),
                AttributeOverride {
                    operations: vec![EvaluatedOperation {
                        name: "mode".into(),
                        name_span: Span::new(13, 17),
                        op: AttributeOperator::Assign,
                        value: Value::from("0644"),
                    }],
                    ancestry: Vec::new(),
                    source,
                    span: Span::new(0, 10),
                },
            )
            .unwrap_err();
        assert!(error.message().contains("has already been set"));
    }

    #[test]
    fn inherited_scope_may_override() {
        let container = ResourceRef::class("base");
        let mut catalog = Catalog::new();
        let mut file = Resource::new(
            ResourceRef::new("file", "/x"),
            Attributes::new(),
            ResourceState::Real,
            "site.mf",
            1,
            Some(container.clone()),
        );
        file.attributes_mut().set("mode", Value::from("0600"));
        catalog.add_resource(file).unwrap();

        let source = Rc::new(SourceFile::new("site.mf", "…"));
        catalog
            .add_override(
                ResourceRef::new("file", "/x"),
                AttributeOverride {
                    operations: vec![EvaluatedOperation {
                        name: "mode".into(),
                        name_span: Span::new(0, 4),
                        op: AttributeOperator::Assign,
                        value: Value::from("0644"),
                    }],
                    ancestry: vec![container],
                    source,
                    span: Span::new(0, 1),
                },
            )
            .unwrap();

        let file = catalog
            .find_resource(&ResourceRef::new("file", "/x"))
            .unwrap();
        assert_eq!(
            **file.attributes().get("mode").unwrap(),
            Value::from("0644")
        );
    }

    #[test]
    fn edges_from_metaparameters_with_reversal() {
        let mut catalog = Catalog::new();
        let mut a = resource("file", "/a", ResourceState::Real);
        a.attributes_mut()
            .set("before", Value::Array(vec![Value::from("File['/b']")]));
        catalog.add_resource(a).unwrap();

        let mut b = resource("file", "/b", ResourceState::Real);
        b.attributes_mut()
            .set("require", Value::Array(vec![Value::from("File['/a']")]));
        catalog.add_resource(b).unwrap();

        catalog.finalize(&EmptyStore).unwrap();

        // Both metaparameters produce a /a -> /b ordering; the duplicate
        // edge from `require` has a different relationship kind so both
        // survive, each pointing /a => /b.
        for edge in catalog.edges() {
            assert_eq!(edge.source, ResourceRef::new("file", "/a"));
            assert_eq!(edge.target, ResourceRef::new("file", "/b"));
        }
        assert_eq!(catalog.edges().len(), 2);
    }

    #[test]
    fn dangling_edge_is_an_error() {
        let mut catalog = Catalog::new();
        let mut a = resource("file", "/a", ResourceState::Real);
        a.attributes_mut().set("before", Value::from("File['/nope']"));
        catalog.add_resource(a).unwrap();
        let error = catalog.finalize(&EmptyStore).unwrap_err();
        assert!(error.message().contains("does not exist in the catalog"));
    }

    #[test]
    fn self_edge_is_an_error() {
        let mut catalog = Catalog::new();
        let mut a = resource("file", "/a", ResourceState::Real);
        a.attributes_mut().set("notify", Value::from("File['/a']"));
        catalog.add_resource(a).unwrap();
        let error = catalog.finalize(&EmptyStore).unwrap_err();
        assert!(error.message().contains("self-referencing"));
    }

    #[test]
    fn cycles_are_detected() {
        let mut catalog = Catalog::new();
        let mut a = resource("file", "/a", ResourceState::Real);
        a.attributes_mut().set("before", Value::from("File['/b']"));
        catalog.add_resource(a).unwrap();
        let mut b = resource("file", "/b", ResourceState::Real);
        b.attributes_mut().set("before", Value::from("File['/a']"));
        catalog.add_resource(b).unwrap();

        let error = catalog.finalize(&EmptyStore).unwrap_err();
        assert!(error.message().contains("dependency cycle"));
        assert!(error.message().contains("File[/a]"));
        assert!(error.message().contains("File[/b]"));
    }

    #[test]
    fn node_matching_precedence() {
        use crate::ast::{Hostname, HostnameKind, NodeDefinitionExpression};

        let source = Rc::new(SourceFile::new("site.mf", "node web01 { } node /db/ { } node default { }"));
        let mut catalog = Catalog::new();

        let make = |kind: HostnameKind| NodeDefinition {
            expression: Rc::new(NodeDefinitionExpression {
                hostnames: vec![Hostname {
                    kind,
                    span: Span::new(0, 1),
                }],
                body: Vec::new(),
                span: Span::new(0, 1),
            }),
            source: Rc::clone(&source),
        };

        catalog
            .define_node(make(HostnameKind::Name("web01".into())))
            .unwrap();
        catalog
            .define_node(make(HostnameKind::Regex("^db".into())))
            .unwrap();
        catalog.define_node(make(HostnameKind::Default)).unwrap();

        let names = vec![EcoString::from("web01.example.com"), EcoString::from("web01")];
        let (matched, _) = catalog.match_node(&names).unwrap();
        assert_eq!(matched, "web01");

        let names = vec![EcoString::from("db42")];
        let (matched, _) = catalog.match_node(&names).unwrap();
        assert_eq!(matched, "/^db/");

        let names = vec![EcoString::from("other")];
        let (matched, _) = catalog.match_node(&names).unwrap();
        assert_eq!(matched, "default");
    }

    #[test]
    fn duplicate_node_definitions_fail() {
        use crate::ast::{Hostname, HostnameKind, NodeDefinitionExpression};

        let source = Rc::new(SourceFile::new("site.mf", "node a { } node a { }"));
        let mut catalog = Catalog::new();
        let make = |kind: HostnameKind| NodeDefinition {
            expression: Rc::new(NodeDefinitionExpression {
                hostnames: vec![Hostname {
                    kind,
                    span: Span::new(0, 1),
                }],
                body: Vec::new(),
                span: Span::new(0, 1),
            }),
            source: Rc::clone(&source),
        };

        catalog
            .define_node(make(HostnameKind::Name("a".into())))
            .unwrap();
        let error = catalog
            .define_node(make(HostnameKind::Name("a".into())))
            .unwrap_err();
        assert!(error.message().contains("previously defined"));

        catalog.define_node(make(HostnameKind::Default)).unwrap();
        let error = catalog
            .define_node(make(HostnameKind::Default))
            .unwrap_err();
        assert!(error.message().contains("default node"));
    }
}
