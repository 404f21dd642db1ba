// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameter binding and body execution.
//!
//! An [`Executor`] runs a parameterised body — a lambda, a class body, or a
//! defined type body — binding parameters into a fresh scope first. Lambdas
//! bind positional arguments; classes and defined types bind resource
//! attributes, with `$title` and `$name` established automatically.

use std::rc::Rc;

use ecow::EcoString;

use crate::ast::{Expression, Parameter};
use crate::catalog::{ResourceRef, is_metaparameter};
use crate::source_analysis::Span;
use crate::values::{TypeSpec, Value, dereference, get_type};

use super::error::{EvalResult, EvaluationError};
use super::evaluator::Evaluator;
use super::scope::Scope;

/// Executes a parameterised body.
pub struct Executor<'e> {
    span: Span,
    parameters: &'e [Parameter],
    body: &'e [Expression],
}

impl<'e> Executor<'e> {
    /// Creates an executor for a body.
    #[must_use]
    pub fn new(span: Span, parameters: &'e [Parameter], body: &'e [Expression]) -> Self {
        Self {
            span,
            parameters,
            body,
        }
    }

    /// Returns the parameter count.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Executes the body with positional arguments (lambda invocation).
    ///
    /// Pushes a local scope (an ephemeral child of the current scope when
    /// `scope` is `None`), binds the parameters, evaluates the body, and
    /// returns its last expression's value.
    pub fn execute(
        &self,
        evaluator: &mut Evaluator<'_, '_>,
        scope: Option<Rc<Scope>>,
        mut arguments: Vec<Value>,
    ) -> EvalResult<Value> {
        if arguments.len() > self.parameters.len()
            && !self.parameters.last().is_some_and(|p| p.captures)
        {
            return Err(evaluator.raise(
                self.span,
                format!(
                    "expected at most {} arguments but {} were given.",
                    self.parameters.len(),
                    arguments.len()
                ),
            ));
        }

        evaluator.with_local_scope(scope, |evaluator| {
            let mut has_optional = false;
            let mut remaining = std::mem::take(&mut arguments).into_iter();

            for (index, parameter) in self.parameters.iter().enumerate() {
                let value = if parameter.captures {
                    if index + 1 != self.parameters.len() {
                        return Err(evaluator.raise(
                            parameter.span,
                            format!(
                                "parameter ${} \"captures rest\" but is not the last parameter.",
                                parameter.name
                            ),
                        ));
                    }
                    let mut captured: Vec<Value> = remaining.by_ref().collect();
                    if captured.is_empty() {
                        if let Some(default) = &parameter.default {
                            captured.push(evaluator.evaluate(default)?);
                        }
                    }
                    Value::Array(captured)
                } else {
                    if !has_optional && parameter.default.is_some() {
                        has_optional = true;
                    } else if has_optional && parameter.default.is_none() {
                        return Err(evaluator.raise(
                            parameter.span,
                            format!(
                                "parameter ${} is required but appears after optional parameters.",
                                parameter.name
                            ),
                        ));
                    }

                    match remaining.next() {
                        Some(value) => value,
                        None => match &parameter.default {
                            Some(default) => evaluator.evaluate(default)?,
                            None => {
                                return Err(evaluator.raise(
                                    parameter.span,
                                    format!(
                                        "parameter ${} is required but no value was given.",
                                        parameter.name
                                    ),
                                ));
                            }
                        },
                    }
                };

                validate_parameter_type(evaluator, parameter, &value)?;
                bind(evaluator, parameter, value)?;
            }

            evaluator.evaluate_block(self.body)
        })
    }

    /// Executes the body for a class or defined-type resource: attributes
    /// bind to parameters, `$title` and `$name` are set, and unknown
    /// attributes (other than metaparameters) are rejected.
    pub fn execute_resource(
        &self,
        evaluator: &mut Evaluator<'_, '_>,
        scope: Rc<Scope>,
        reference: &ResourceRef,
        attributes: &[(EcoString, Rc<Value>)],
    ) -> EvalResult<Value> {
        evaluator.with_local_scope(Some(Rc::clone(&scope)), |evaluator| {
            // Defaults for parameters the resource does not set
            for parameter in self.parameters {
                let Some(default) = &parameter.default else {
                    if !attributes
                        .iter()
                        .any(|(name, _)| *name == parameter.name)
                    {
                        return Err(evaluator.raise(
                            parameter.span,
                            format!(
                                "parameter ${} is required but no value was given.",
                                parameter.name
                            ),
                        ));
                    }
                    continue;
                };
                if attributes.iter().any(|(name, _)| *name == parameter.name) {
                    continue;
                }
                let value = evaluator.evaluate(default)?;
                validate_parameter_type(evaluator, parameter, &value)?;
                bind(evaluator, parameter, value)?;
            }

            let title = Rc::new(Value::String(reference.title().clone()));
            let mut name_value = Rc::clone(&title);

            for (attribute, value) in attributes {
                if attribute == "name" {
                    name_value = Rc::clone(value);
                    continue;
                }
                let parameter = self
                    .parameters
                    .iter()
                    .find(|parameter| parameter.name == *attribute);
                if let Some(parameter) = parameter {
                    validate_parameter_type(evaluator, parameter, value)?;
                } else if !is_metaparameter(attribute) {
                    let message = if reference.is_class() {
                        format!(
                            "'{attribute}' is not a valid parameter for class '{}'.",
                            reference.title()
                        )
                    } else {
                        format!(
                            "'{attribute}' is not a valid parameter for defined type '{}'.",
                            reference.type_name()
                        )
                    };
                    return Err(evaluator.raise(self.span, message));
                }

                let current = evaluator.context.current_scope();
                current.set(attribute.clone(), Rc::clone(value), None, 0);
            }

            let line = evaluator
                .source()
                .location(self.span.start())
                .line;
            let path: EcoString = evaluator.source().path().as_str().into();
            scope.set("title", title, Some(path.clone()), line);
            scope.set("name", name_value, Some(path), line);

            evaluator.evaluate_block(self.body)
        })
    }
}

/// Validates a value against a parameter's declared type.
fn validate_parameter_type(
    evaluator: &mut Evaluator<'_, '_>,
    parameter: &Parameter,
    value: &Value,
) -> EvalResult<()> {
    let Some(type_expr) = &parameter.type_expr else {
        return Ok(());
    };

    let type_value = evaluator.evaluate(type_expr)?;
    let Value::Type(expected) = dereference(&type_value) else {
        return Err(evaluator.raise(
            type_expr.span(),
            format!(
                "expected Type for parameter type but found {}.",
                get_type(&type_value)
            ),
        ));
    };
    let expected: &TypeSpec = expected;
    if !expected.is_instance(value) {
        return Err(evaluator.raise(
            parameter.span,
            format!(
                "parameter ${} has expected type {expected} but was given {}.",
                parameter.name,
                get_type(value)
            ),
        ));
    }
    Ok(())
}

/// Binds a parameter into the current scope.
fn bind(
    evaluator: &mut Evaluator<'_, '_>,
    parameter: &Parameter,
    value: Value,
) -> Result<(), EvaluationError> {
    let line = evaluator.source().location(parameter.span.start()).line;
    let path: EcoString = evaluator.source().path().as_str().into();
    let previous = evaluator.context.current_scope().set(
        parameter.name.clone(),
        Rc::new(value),
        Some(path),
        line,
    );
    if previous.is_some() {
        return Err(evaluator.raise(
            parameter.span,
            format!(
                "parameter ${} already exists in the parameter list.",
                parameter.name
            ),
        ));
    }
    Ok(())
}
