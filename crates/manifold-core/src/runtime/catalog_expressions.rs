// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Catalog expression evaluation: resource declarations (normal, virtual,
//! exported), resource defaults, resource overrides, collectors, and the
//! declaration of classes and defined types.
//!
//! Class declaration evaluates every registered definition body exactly
//! once (parent class first, the class scope chained to the parent's
//! scope); defined types evaluate their body per declared instance with
//! `$title` and `$name` bound.

use std::rc::Rc;

use ecow::EcoString;

use crate::ast::{
    AttributeOperation, AttributeOperator, CollectionExpression, Expression, QueryExpression,
    QueryJoin, ResourceDefaultsExpression, ResourceExpression, ResourceOverrideExpression,
    ResourceStatus,
};
use crate::catalog::{
    AttributeOverride, Attributes, ClassDefinition, Collector, CompiledQuery, EvaluatedOperation,
    Resource, ResourceRef, ResourceState,
};
use crate::source_analysis::Span;
use crate::values::types::normalize_type_name;
use crate::values::{TypeSpec, Value, dereference, get_type, mutate, to_array};

use super::error::EvalResult;
use super::evaluator::Evaluator;
use super::executor::Executor;
use super::scope::{Scope, ScopeDefault};

impl Evaluator<'_, '_> {
    /// Evaluates a resource declaration; its value is the array of declared
    /// resource references.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn evaluate_resource_expression(
        &mut self,
        expression: &ResourceExpression,
    ) -> EvalResult<Value> {
        // Resolve the type name: a name, the `class` keyword, or an
        // unqualified resource type.
        let type_value = self.evaluate(&expression.type_expr)?;
        let type_name: EcoString = match dereference(&type_value) {
            Value::String(name) => name.clone(),
            Value::Type(TypeSpec::Resource {
                type_name: Some(name),
                title: None,
            }) => name.clone(),
            other => {
                return Err(self.raise(
                    expression.type_expr.span(),
                    format!(
                        "expected String or qualified Resource for resource type but found {}.",
                        get_type(other)
                    ),
                ));
            }
        };
        let is_class = type_name.eq_ignore_ascii_case("class");
        let state = match expression.status {
            ResourceStatus::Realized => ResourceState::Real,
            ResourceStatus::Virtual => ResourceState::Virtual,
            ResourceStatus::Exported => ResourceState::Exported,
        };
        if is_class && expression.status != ResourceStatus::Realized {
            return Err(self.raise(
                expression.span,
                "classes cannot be virtual or exported.",
            ));
        }

        // Locate the per-expression defaults body (`default:`), if any
        let mut default_body = None;
        for body in &expression.bodies {
            if !matches!(body.title, Expression::Default(_)) {
                continue;
            }
            if default_body.is_some() {
                return Err(self.raise(
                    body.span,
                    "only one default body is supported in a resource expression.",
                ));
            }
            default_body = Some(body);
        }
        let default_operations = match default_body {
            Some(body) => self.evaluate_attribute_operations(&body.operations)?,
            None => Vec::new(),
        };

        let normalized = normalize_type_name(&type_name);
        let scope_defaults = self.context.current_scope().defaults_for(&normalized);
        let is_defined_type = !is_class
            && self
                .context
                .catalog
                .find_defined_type(type_name.to_lowercase().as_str())
                .is_some();

        let mut references = Vec::new();
        for body in &expression.bodies {
            if matches!(body.title, Expression::Default(_)) {
                continue;
            }

            // Evaluate the titles
            let title_value = self.evaluate(&body.title)?;
            let mut titles: Vec<EcoString> = Vec::new();
            for title in to_array(title_value, false) {
                match mutate(title) {
                    Value::String(title) => titles.push(title),
                    other => {
                        return Err(self.raise(
                            body.title.span(),
                            format!(
                                "expected String or Array[String] for resource title but found {}.",
                                get_type(&other)
                            ),
                        ));
                    }
                }
            }

            // Evaluate the attribute operations once per body
            let operations = self.evaluate_attribute_operations(&body.operations)?;

            // Layer the attributes: scope defaults, then the defaults body,
            // then the body's own operations.
            let mut attributes = Attributes::new();
            for (name, value) in &scope_defaults {
                attributes.set_shared(name.clone(), Rc::clone(value));
            }
            self.apply_operations(&mut attributes, &default_operations, false)?;
            self.apply_operations(&mut attributes, &operations, true)?;

            for title in titles {
                if title.is_empty() {
                    return Err(self.raise(body.title.span(), "resource title cannot be empty."));
                }

                if is_class {
                    let reference =
                        self.declare_class(&title, Some(attributes.clone()), body.span)?;
                    references.push(Value::Type(reference.to_type()));
                    continue;
                }

                let reference = ResourceRef::new(&type_name, title);
                if is_defined_type {
                    if state != ResourceState::Real {
                        return Err(self.raise(
                            expression.span,
                            "defined type resources cannot be virtual or exported.",
                        ));
                    }
                    self.declare_defined_type(&reference, attributes.clone(), body.span)?;
                } else {
                    let line = self.source().location(body.span.start()).line;
                    let resource = Resource::new(
                        reference.clone(),
                        attributes.clone(),
                        state,
                        self.source().path(),
                        line,
                        self.context.current_scope().resource().cloned(),
                    );
                    self.context
                        .catalog
                        .add_resource(resource)
                        .map_err(|error| error.or_at(self.source(), body.span))?;
                }
                references.push(Value::Type(reference.to_type()));
            }
        }

        Ok(Value::Array(references))
    }

    /// Evaluates attribute operations, validating metaparameter types.
    pub(crate) fn evaluate_attribute_operations(
        &mut self,
        operations: &[AttributeOperation],
    ) -> EvalResult<Vec<EvaluatedOperation>> {
        let mut evaluated: Vec<EvaluatedOperation> = Vec::with_capacity(operations.len());
        for operation in operations {
            if evaluated.iter().any(|existing| existing.name == operation.name) {
                return Err(self.raise(
                    operation.name_span,
                    format!(
                        "attribute '{}' already exists in this resource body.",
                        operation.name
                    ),
                ));
            }
            let value = self.evaluate(&operation.value)?;
            let value = self.validate_attribute(&operation.name, value, operation.value.span())?;
            evaluated.push(EvaluatedOperation {
                name: operation.name.clone(),
                name_span: operation.name_span,
                op: operation.op,
                value,
            });
        }
        Ok(evaluated)
    }

    /// Applies evaluated operations onto an attribute collection.
    /// `strict_append` makes `+>` require an existing array value.
    fn apply_operations(
        &self,
        attributes: &mut Attributes,
        operations: &[EvaluatedOperation],
        strict_append: bool,
    ) -> EvalResult<()> {
        for operation in operations {
            match operation.op {
                AttributeOperator::Assign => {
                    attributes.set(operation.name.clone(), operation.value.clone());
                }
                AttributeOperator::Append => {
                    if strict_append && attributes.get(&operation.name).is_none() {
                        return Err(self.raise(
                            operation.name_span,
                            format!("attribute '{}' is not an array.", operation.name),
                        ));
                    }
                    if !attributes.append(&operation.name, operation.value.clone(), true) {
                        return Err(self.raise(
                            operation.name_span,
                            format!("attribute '{}' is not an array.", operation.name),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validates a metaparameter value, converting scalars to arrays where
    /// the metaparameter expects one.
    fn validate_attribute(&self, name: &str, value: Value, span: Span) -> EvalResult<Value> {
        let string_array = TypeSpec::Array {
            element: Box::new(TypeSpec::String {
                min: None,
                max: None,
            }),
            min: None,
            max: None,
        };
        let relationship = TypeSpec::Array {
            element: Box::new(TypeSpec::Variant(vec![
                TypeSpec::String {
                    min: None,
                    max: None,
                },
                TypeSpec::CatalogEntry,
            ])),
            min: None,
            max: None,
        };

        let (expected, value): (TypeSpec, Value) = match name {
            "alias" | "tag" => (string_array, Value::Array(to_array(value, false))),
            "before" | "notify" | "require" | "subscribe" => {
                (relationship, Value::Array(to_array(value, false)))
            }
            "audit" => (
                TypeSpec::Variant(vec![
                    TypeSpec::String {
                        min: None,
                        max: None,
                    },
                    string_array,
                ]),
                value,
            ),
            "loglevel" => (
                TypeSpec::Enum(vec![
                    "debug".into(),
                    "info".into(),
                    "notice".into(),
                    "warning".into(),
                    "err".into(),
                    "alert".into(),
                    "emerg".into(),
                    "crit".into(),
                    "verbose".into(),
                ]),
                value,
            ),
            "noop" => (TypeSpec::Boolean, value),
            "schedule" | "stage" => (
                TypeSpec::String {
                    min: None,
                    max: None,
                },
                value,
            ),
            // Not a metaparameter: no validation at declaration time
            _ => return Ok(mutate(value)),
        };

        if !expected.is_instance(&value) {
            return Err(self.raise(
                span,
                format!(
                    "expected {expected} for attribute '{name}' but found {}.",
                    get_type(&value)
                ),
            ));
        }
        Ok(mutate(value))
    }

    /// Declares a class: adds the `Class[name]` resource and evaluates
    /// every definition body exactly once. Passing `attributes` marks a
    /// resource-style declaration, which cannot re-declare; `None` is
    /// `include`-style and idempotent.
    pub(crate) fn declare_class(
        &mut self,
        title: &str,
        attributes: Option<Attributes>,
        span: Span,
    ) -> EvalResult<ResourceRef> {
        let reference = ResourceRef::class(title);
        let name = reference.title().clone();
        if name.is_empty() {
            return Err(self.raise(span, "cannot declare a class with an unspecified title."));
        }

        if let Some(existing) = self.context.catalog.find_resource(&reference) {
            if attributes.is_some() {
                return Err(self.raise(
                    span,
                    format!(
                        "class '{name}' was previously declared at {}:{}.",
                        existing.path(),
                        existing.line()
                    ),
                ));
            }
            return Ok(reference);
        }

        let Some(definitions) = self.context.catalog.find_class(&name) else {
            return Err(self.raise(
                span,
                format!("cannot declare class '{name}' because it has not been defined."),
            ));
        };
        let definitions: Vec<ClassDefinition> = definitions.to_vec();

        let line = self.source().location(span.start()).line;
        let resource = Resource::new(
            reference.clone(),
            attributes.unwrap_or_default(),
            ResourceState::Real,
            self.source().path(),
            line,
            self.context.current_scope().resource().cloned(),
        );
        self.context
            .catalog
            .add_resource(resource)
            .map_err(|error| error.or_at(self.source(), span))?;
        self.context.catalog.mark_class_declared(name.clone());

        // Resolve the parent scope: the inherited class's scope (declaring
        // the parent first if needed), otherwise the node or top scope.
        let parent = definitions
            .iter()
            .find_map(|definition| definition.parent.clone());
        let parent_scope = match &parent {
            Some(parent_name) => {
                let parent_ref = ResourceRef::class(parent_name);
                if self.context.catalog.find_resource(&parent_ref).is_none() {
                    self.declare_class(parent_name, None, span)?;
                }
                self.context
                    .find_scope(parent_name)
                    .unwrap_or_else(|| self.context.node_or_top())
            }
            None => self.context.node_or_top(),
        };

        let class_scope = Rc::new(Scope::new(parent_scope, Some(reference.clone())));
        self.context
            .add_named_scope(name.clone(), Rc::clone(&class_scope));

        let attribute_snapshot = self.attribute_snapshot(&reference);

        tracing::debug!(class = %name, definitions = definitions.len(), "declaring class");
        for definition in &definitions {
            let expression = &definition.expression;
            let executor = Executor::new(
                expression.span,
                &expression.parameters,
                &expression.body,
            );
            let mut sub = self.sub(Rc::clone(&definition.source));
            executor.execute_resource(
                &mut sub,
                Rc::clone(&class_scope),
                &reference,
                &attribute_snapshot,
            )?;
        }

        Ok(reference)
    }

    /// Declares a defined type instance: adds the resource and evaluates
    /// the definition body with `$title` and `$name` bound.
    pub(crate) fn declare_defined_type(
        &mut self,
        reference: &ResourceRef,
        attributes: Attributes,
        span: Span,
    ) -> EvalResult<()> {
        let type_name = reference.type_name().to_lowercase();
        let Some(definition) = self.context.catalog.find_defined_type(&type_name) else {
            return Err(self.raise(
                span,
                format!(
                    "cannot declare defined type {reference} because it has not been defined."
                ),
            ));
        };
        let source = Rc::clone(&definition.source);
        let expression = Rc::clone(&definition.expression);

        let line = self.source().location(span.start()).line;
        let resource = Resource::new(
            reference.clone(),
            attributes,
            ResourceState::Real,
            self.source().path(),
            line,
            self.context.current_scope().resource().cloned(),
        );
        self.context
            .catalog
            .add_resource(resource)
            .map_err(|error| error.or_at(self.source(), span))?;

        let scope = Rc::new(Scope::new(
            self.context.node_or_top(),
            Some(reference.clone()),
        ));
        let attribute_snapshot = self.attribute_snapshot(reference);

        let executor = Executor::new(expression.span, &expression.parameters, &expression.body);
        let mut sub = self.sub(source);
        executor.execute_resource(&mut sub, scope, reference, &attribute_snapshot)?;
        Ok(())
    }

    /// Snapshots a catalog resource's attributes for parameter binding.
    fn attribute_snapshot(&self, reference: &ResourceRef) -> Vec<(EcoString, Rc<Value>)> {
        self.context
            .catalog
            .find_resource(reference)
            .map(|resource| {
                resource
                    .attributes()
                    .iter()
                    .map(|(name, value)| (name.clone(), Rc::clone(value)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Evaluates `Type { attrs }`: installs defaults in the current scope.
    pub(crate) fn evaluate_resource_defaults(
        &mut self,
        expression: &ResourceDefaultsExpression,
    ) -> EvalResult<Value> {
        let type_name = normalize_type_name(&expression.type_name);
        let operations = self.evaluate_attribute_operations(&expression.operations)?;
        let defaults = operations
            .into_iter()
            .map(|operation| ScopeDefault {
                name: operation.name,
                op: operation.op,
                value: Rc::new(operation.value),
            })
            .collect();
        self.context
            .current_scope()
            .add_defaults(type_name, defaults);
        Ok(Value::Undef)
    }

    /// Evaluates `Ref { attrs }`: queues or applies attribute overrides.
    pub(crate) fn evaluate_resource_override(
        &mut self,
        expression: &ResourceOverrideExpression,
    ) -> EvalResult<Value> {
        let reference_value = self.evaluate(&expression.reference)?;
        let reference_span = expression.reference.span();

        let mut references = Vec::new();
        let mut collect = |value: &Value| -> Result<(), String> {
            match dereference(value) {
                Value::Type(TypeSpec::Resource {
                    type_name: Some(type_name),
                    title: Some(title),
                }) => {
                    references.push(ResourceRef::new(type_name, title.clone()));
                    Ok(())
                }
                Value::Type(TypeSpec::Class(Some(_))) => {
                    Err("cannot override attributes of a class resource.".to_string())
                }
                other => Err(format!(
                    "expected qualified Resource but found {}.",
                    get_type(other)
                )),
            }
        };
        let result = match dereference(&reference_value) {
            Value::Array(elements) => elements.iter().try_for_each(&mut collect),
            other => collect(other),
        };
        if let Err(message) = result {
            return Err(self.raise(reference_span, message));
        }

        let operations = self.evaluate_attribute_operations(&expression.operations)?;
        let ancestry = self.context.scope_ancestry();

        for reference in references {
            self.context
                .catalog
                .add_override(
                    reference,
                    AttributeOverride {
                        operations: operations.clone(),
                        ancestry: ancestry.clone(),
                        source: Rc::clone(self.source()),
                        span: expression.span,
                    },
                )
                .map_err(|error| error.or_at(self.source(), expression.span))?;
        }

        Ok(reference_value)
    }

    /// Evaluates a collector: realizes matching virtual resources now and
    /// registers the collector for the finalisation re-run.
    pub(crate) fn evaluate_collection(
        &mut self,
        expression: &CollectionExpression,
    ) -> EvalResult<Value> {
        let query = match &expression.query {
            Some(query) => Some(self.compile_query(query)?),
            None => None,
        };
        let collector = Collector {
            type_name: normalize_type_name(&expression.type_name),
            exported: expression.exported,
            query,
        };
        let store = self.context.store();
        self.context
            .catalog
            .collect(collector, store)
            .map_err(|error| error.or_at(self.source(), expression.span))?;
        Ok(Value::Undef)
    }

    /// Compiles a collector query by evaluating its value expressions.
    fn compile_query(&mut self, query: &QueryExpression) -> EvalResult<CompiledQuery> {
        match query {
            QueryExpression::Test {
                attribute,
                op,
                value,
                ..
            } => {
                let value = mutate(self.evaluate(value)?);
                Ok(CompiledQuery::Test {
                    attribute: attribute.clone(),
                    op: *op,
                    value,
                })
            }
            QueryExpression::Binary {
                op, left, right, ..
            } => {
                let left = Box::new(self.compile_query(left)?);
                let right = Box::new(self.compile_query(right)?);
                Ok(match op {
                    QueryJoin::And => CompiledQuery::And(left, right),
                    QueryJoin::Or => CompiledQuery::Or(left, right),
                })
            }
        }
    }
}
