// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Function dispatch.
//!
//! Built-in functions are registered by name in the `functions` module;
//! each receives a [`CallContext`] carrying the evaluator, the evaluated
//! argument vector with per-argument spans, the optional lambda, and the
//! call span. Method calls dispatch through the same table with the
//! receiver prepended as the first argument.

use ecow::EcoString;

use crate::ast::{Expression, Lambda};
use crate::source_analysis::Span;
use crate::values::Value;

use super::error::{EvalResult, EvaluationError};
use super::evaluator::Evaluator;
use super::executor::Executor;
use super::functions;

/// Runtime context for one built-in function call.
pub struct CallContext<'e, 'c, 'a> {
    pub(crate) evaluator: &'e mut Evaluator<'c, 'a>,
    name: EcoString,
    span: Span,
    arguments: Vec<Value>,
    argument_spans: Vec<Span>,
    lambda: Option<&'e Lambda>,
}

impl<'e, 'c, 'a> CallContext<'e, 'c, 'a> {
    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    /// Returns the span of the call itself.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns the evaluated arguments.
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Takes the evaluated arguments out of the context.
    pub fn take_arguments(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.arguments)
    }

    /// Returns the span of an argument (the call span when out of range).
    #[must_use]
    pub fn argument_span(&self, index: usize) -> Span {
        self.argument_spans.get(index).copied().unwrap_or(self.span)
    }

    /// Returns the evaluator.
    pub fn evaluator(&mut self) -> &mut Evaluator<'c, 'a> {
        self.evaluator
    }

    /// Creates an evaluation error at a span in the calling manifest.
    #[must_use]
    pub fn raise(&self, span: Span, message: impl Into<String>) -> EvaluationError {
        self.evaluator.raise(span, message)
    }

    /// Checks the exact argument count, reporting the surplus argument's
    /// span on mismatch.
    pub fn check_argument_count(&self, expected: usize) -> EvalResult<()> {
        let count = self.arguments.len();
        if count == expected {
            return Ok(());
        }
        let span = if count > expected {
            self.argument_span(expected)
        } else {
            self.span
        };
        Err(self.raise(
            span,
            format!(
                "expected {expected} argument{} to '{}' function but {count} were given.",
                if expected == 1 { "" } else { "s" },
                self.name
            ),
        ))
    }

    /// Returns true if a lambda was passed.
    #[must_use]
    pub fn lambda_given(&self) -> bool {
        self.lambda.is_some()
    }

    /// Returns the lambda's parameter count (0 without a lambda).
    #[must_use]
    pub fn lambda_parameter_count(&self) -> usize {
        self.lambda.map_or(0, |lambda| lambda.parameters.len())
    }

    /// Returns the lambda's span, or the call span without one.
    #[must_use]
    pub fn lambda_span(&self) -> Span {
        self.lambda.map_or(self.span, |lambda| lambda.span)
    }

    /// Requires a lambda, erroring in the original's wording otherwise.
    pub fn require_lambda(&self) -> EvalResult<()> {
        if self.lambda_given() {
            return Ok(());
        }
        Err(self.raise(
            self.span,
            format!(
                "expected a lambda to '{}' function but one was not given.",
                self.name
            ),
        ))
    }

    /// Requires the lambda to take between `min` and `max` parameters.
    pub fn check_lambda_parameters(&self, min: usize, max: usize) -> EvalResult<()> {
        let count = self.lambda_parameter_count();
        if count >= min && count <= max {
            return Ok(());
        }
        Err(self.raise(
            self.lambda_span(),
            format!("expected {min} or {max} lambda parameters but {count} were given."),
        ))
    }

    /// Yields to the lambda: pushes an ephemeral scope and a match scope,
    /// binds the parameters, and evaluates the body.
    pub fn yield_(&mut self, arguments: Vec<Value>) -> EvalResult<Value> {
        let Some(lambda) = self.lambda else {
            return Err(self.raise(
                self.span,
                format!(
                    "expected a lambda to '{}' function but one was not given.",
                    self.name
                ),
            ));
        };
        let executor = Executor::new(lambda.span, &lambda.parameters, &lambda.body);
        executor.execute(self.evaluator, None, arguments)
    }
}

impl<'c, 'a> Evaluator<'c, 'a> {
    /// Dispatches a function call.
    pub(crate) fn dispatch_function(
        &mut self,
        name: &EcoString,
        name_span: Span,
        arguments: &[Expression],
        lambda: Option<&Lambda>,
    ) -> EvalResult<Value> {
        let Some(function) = functions::find(name) else {
            return Err(self.raise(name_span, format!("unknown function '{name}'.")));
        };
        let (values, spans) = self.evaluate_arguments(arguments)?;

        tracing::trace!(function = %name, arity = values.len(), "dispatching function call");
        let mut context = CallContext {
            evaluator: self,
            name: name.clone(),
            span: name_span,
            arguments: values,
            argument_spans: spans,
            lambda,
        };
        function(&mut context)
    }

    /// Dispatches a method call: the receiver becomes the first argument.
    pub(crate) fn dispatch_method(
        &mut self,
        name: &EcoString,
        name_span: Span,
        receiver: Value,
        receiver_span: Span,
        arguments: &[Expression],
        lambda: Option<&Lambda>,
    ) -> EvalResult<Value> {
        let Some(function) = functions::find(name) else {
            return Err(self.raise(name_span, format!("unknown function '{name}'.")));
        };
        let (mut values, mut spans) = self.evaluate_arguments(arguments)?;
        values.insert(0, receiver);
        spans.insert(0, receiver_span);

        let mut context = CallContext {
            evaluator: self,
            name: name.clone(),
            span: name_span,
            arguments: values,
            argument_spans: spans,
            lambda,
        };
        function(&mut context)
    }
}
