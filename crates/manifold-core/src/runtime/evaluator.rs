// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The expression evaluator.
//!
//! Walks the AST producing [`Value`]s, with side effects on the scope chain
//! and the catalog. Binary operator semantics live in the `operators`
//! module, `[]` access in `access`, function dispatch in `dispatch`, and
//! catalog expressions (resources, defaults, overrides, collectors,
//! definitions) in `catalog_expressions` — all as further `impl Evaluator`
//! blocks.
//!
//! One evaluator is tied to one manifest (for error positions); evaluating
//! a class or defined type body re-enters through [`Evaluator::sub`] with
//! the defining manifest's source file.

use std::rc::Rc;

use crate::ast::{
    BinaryOperator, CaseExpression, Expression, IfExpression, Manifest, StringLiteral,
    StringSegment, UnaryOperator, UnlessExpression,
};
use crate::diagnostics::Level;
use crate::source_analysis::{SourceFile, Span};
use crate::values::{
    TypeSpec, Value, ValueRegex, VariableValue, dereference, is_default, is_truthy, mutate,
    to_array,
};

use super::context::EvaluationContext;
use super::error::{EvalResult, EvaluationError};
use super::scope::Scope;

/// Evaluates expressions from one manifest against a shared context.
pub struct Evaluator<'c, 'a> {
    source: Rc<SourceFile>,
    pub(crate) context: &'c mut EvaluationContext<'a>,
}

impl<'c, 'a> Evaluator<'c, 'a> {
    /// Creates an evaluator for a manifest.
    pub fn new(source: Rc<SourceFile>, context: &'c mut EvaluationContext<'a>) -> Self {
        Self { source, context }
    }

    /// Returns the manifest being evaluated.
    #[must_use]
    pub fn source(&self) -> &Rc<SourceFile> {
        &self.source
    }

    /// Creates a sub-evaluator over the same context for another manifest
    /// (class and defined type bodies evaluate in their defining manifest).
    pub(crate) fn sub(&mut self, source: Rc<SourceFile>) -> Evaluator<'_, 'a> {
        Evaluator {
            source,
            context: &mut *self.context,
        }
    }

    /// Creates an evaluation error at a position in this manifest.
    #[must_use]
    pub fn raise(&self, span: Span, message: impl Into<String>) -> EvaluationError {
        EvaluationError::at(message, Rc::clone(&self.source), span)
    }

    /// Emits a warning at a position in this manifest.
    pub fn warn(&mut self, span: Span, message: impl Into<ecow::EcoString>) {
        let source = Rc::clone(&self.source);
        self.context
            .logger()
            .log_at(Level::Warning, &source, span, message);
    }

    /// Evaluates a manifest's top-level body. Top-level expressions must be
    /// productive.
    pub fn evaluate_manifest(&mut self, manifest: &Manifest) -> EvalResult<()> {
        tracing::debug!(path = %self.source.path(), "evaluating the syntax tree");
        for expression in &manifest.body {
            if !expression.is_productive() {
                return Err(self.raise(
                    expression.span(),
                    "unproductive expressions may only appear last in a block.",
                ));
            }
            self.evaluate(expression)?;
        }
        Ok(())
    }

    /// Evaluates a block: every expression but the last must be productive;
    /// the last expression's value is the block's value.
    pub fn evaluate_block(&mut self, body: &[Expression]) -> EvalResult<Value> {
        let mut result = Value::Undef;
        for (i, expression) in body.iter().enumerate() {
            if i + 1 < body.len() && !expression.is_productive() {
                return Err(self.raise(
                    expression.span(),
                    "unproductive expressions may only appear last in a block.",
                ));
            }
            result = self.evaluate(expression)?;
        }
        Ok(result)
    }

    /// Runs `body` with a match scope pushed.
    pub(crate) fn with_match_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        self.context.push_match_scope();
        let result = body(self);
        self.context.pop_match_scope();
        result
    }

    /// Runs `body` with a local scope (and a match scope) pushed; `None`
    /// pushes an ephemeral scope.
    pub(crate) fn with_local_scope<T>(
        &mut self,
        scope: Option<Rc<Scope>>,
        body: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        self.context.push_match_scope();
        self.context.push_scope(scope);
        let result = body(self);
        self.context.pop_scope();
        self.context.pop_match_scope();
        result
    }

    /// Evaluates an expression.
    #[allow(clippy::too_many_lines)]
    pub fn evaluate(&mut self, expression: &Expression) -> EvalResult<Value> {
        match expression {
            Expression::Undef(_) => Ok(Value::Undef),
            Expression::Default(_) => Ok(Value::Default),
            Expression::Boolean(value, _) => Ok(Value::Boolean(*value)),
            Expression::Integer(value, _) => Ok(Value::Integer(*value)),
            Expression::Float(value, _) => Ok(Value::Float(*value)),
            Expression::String(literal) => self.evaluate_string(literal),
            Expression::Regex(pattern, span) => match ValueRegex::new(pattern.clone()) {
                Ok(regex) => Ok(Value::Regex(regex)),
                Err(error) => Err(self.raise(*span, format!("invalid regular expression: {error}"))),
            },
            Expression::Variable(name, span) => Ok(self.evaluate_variable(name, *span)),
            Expression::Name(name, _) | Expression::BareWord(name, _) => {
                Ok(Value::String(name.clone()))
            }
            Expression::TypeName(name, _) => Ok(Value::Type(TypeSpec::from_name(name))),

            Expression::Array(elements, _) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.evaluate(element)?;
                    match unfold(element, value) {
                        Unfolded::Spliced(unfolded) => values.extend(unfolded),
                        Unfolded::Single(value) => values.push(value),
                    }
                }
                Ok(Value::Array(values))
            }

            Expression::Hash(pairs, _) => {
                let mut hash = crate::values::ValueHash::new();
                for (key_expr, value_expr) in pairs {
                    let key = mutate(self.evaluate(key_expr)?);
                    let value = mutate(self.evaluate(value_expr)?);
                    hash.insert(key, value);
                }
                Ok(Value::Hash(hash))
            }

            Expression::Unary { op, operand, span } => {
                let value = self.evaluate(operand)?;
                self.unary_operation(*op, value, *span)
            }

            Expression::Binary {
                op, left, right, ..
            } => self.binary_expression(*op, left, right),

            Expression::Access {
                target, arguments, ..
            } => {
                let target_value = self.evaluate(target)?;
                let mut evaluated = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let value = self.evaluate(argument)?;
                    match unfold(argument, value) {
                        Unfolded::Spliced(unfolded) => {
                            for element in unfolded {
                                evaluated.push((element, argument.span()));
                            }
                        }
                        Unfolded::Single(value) => evaluated.push((value, argument.span())),
                    }
                }
                self.access(target_value, target.span(), &evaluated)
            }

            Expression::MethodCall {
                target,
                name,
                name_span,
                arguments,
                lambda,
                ..
            } => {
                let receiver = self.evaluate(target)?;
                self.dispatch_method(
                    name,
                    *name_span,
                    receiver,
                    target.span(),
                    arguments,
                    lambda.as_ref(),
                )
            }

            Expression::Selector { target, cases, .. } => {
                let value = self.evaluate(target)?;
                self.evaluate_selector(value, target.span(), cases)
            }

            Expression::If(expression) => self.evaluate_if(expression),
            Expression::Unless(expression) => self.evaluate_unless(expression),
            Expression::Case(expression) => self.evaluate_case(expression),

            Expression::FunctionCall {
                name,
                name_span,
                arguments,
                lambda,
                ..
            } => self.dispatch_function(name, *name_span, arguments, lambda.as_ref()),

            Expression::Resource(resource) => self.evaluate_resource_expression(resource),
            Expression::ResourceDefaults(defaults) => self.evaluate_resource_defaults(defaults),
            Expression::ResourceOverride(over) => self.evaluate_resource_override(over),
            Expression::Collection(collection) => self.evaluate_collection(collection),

            Expression::ClassDefinition(class) => {
                // Registered by the definition scanner; the expression's
                // value is a reference to the class.
                let qualified = self.context.current_scope().qualify(&class.name);
                Ok(Value::Type(TypeSpec::Class(Some(
                    qualified.to_lowercase().into(),
                ))))
            }
            Expression::DefinedType(defined) => {
                let qualified = self.context.current_scope().qualify(&defined.name);
                Ok(Value::Type(TypeSpec::from_name(&qualified)))
            }
            Expression::NodeDefinition(_) => Ok(Value::Undef),

            Expression::Error(span) => Err(self.raise(*span, "invalid expression.")),
        }
    }

    /// Evaluates a string literal by joining its segments.
    fn evaluate_string(&mut self, literal: &StringLiteral) -> EvalResult<Value> {
        if let Some(text) = literal.as_literal() {
            return Ok(Value::String(text.clone()));
        }
        let mut out = String::new();
        for segment in &literal.segments {
            match segment {
                StringSegment::Literal(text) => out.push_str(text),
                StringSegment::Variable(name, span) => {
                    let value = self.evaluate_variable(name, *span);
                    out.push_str(&value.to_string());
                }
                StringSegment::Expression(expression) => {
                    let value = self.evaluate(expression)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::String(out.into()))
    }

    /// Resolves a variable reference to a variable value.
    fn evaluate_variable(&mut self, name: &str, span: Span) -> Value {
        if name.bytes().all(|b| b.is_ascii_digit()) {
            let value = name
                .parse::<usize>()
                .ok()
                .and_then(|index| self.context.match_variable(index))
                .map(Rc::new);
            return Value::Variable(VariableValue::new(name, value));
        }

        let lookup = self.context.lookup(name);
        if let Some(warning) = lookup.warning {
            self.warn(span, warning);
        }
        Value::Variable(VariableValue::new(name, lookup.value))
    }

    /// Applies a unary operator.
    fn unary_operation(&self, op: UnaryOperator, value: Value, span: Span) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => match dereference(&value) {
                Value::Integer(i) => i.checked_neg().map(Value::Integer).ok_or_else(|| {
                    self.raise(span, format!("negation of {i} results in an arithmetic overflow."))
                }),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(self.raise(
                    span,
                    format!(
                        "expected Numeric for unary negation but found {}.",
                        crate::values::get_type(other)
                    ),
                )),
            },
            UnaryOperator::Not => Ok(Value::Boolean(!is_truthy(&value))),
            UnaryOperator::Splat => Ok(Value::Array(to_array(value, true))),
        }
    }

    /// Evaluates a binary expression, handling short-circuiting and
    /// assignment before delegating to the operator table.
    fn binary_expression(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> EvalResult<Value> {
        match op {
            BinaryOperator::And => {
                if !is_truthy(&self.evaluate(left)?) {
                    return Ok(Value::Boolean(false));
                }
                let right = self.evaluate(right)?;
                Ok(Value::Boolean(is_truthy(&right)))
            }
            BinaryOperator::Or => {
                if is_truthy(&self.evaluate(left)?) {
                    return Ok(Value::Boolean(true));
                }
                let right = self.evaluate(right)?;
                Ok(Value::Boolean(is_truthy(&right)))
            }
            BinaryOperator::Assign => self.evaluate_assignment(left, right),
            BinaryOperator::Before
            | BinaryOperator::Notify
            | BinaryOperator::Require
            | BinaryOperator::Subscribe => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                self.add_relationship(op, left_value, left.span(), right_value, right.span())
            }
            _ => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                self.binary_operation(op, left_value, left.span(), right_value, right.span())
            }
        }
    }

    /// Evaluates `$x = value`.
    fn evaluate_assignment(&mut self, left: &Expression, right: &Expression) -> EvalResult<Value> {
        let Expression::Variable(name, span) = left else {
            let value = self.evaluate(left)?;
            return Err(self.raise(
                left.span(),
                format!(
                    "cannot assign to {}: assignment can only be performed on variables.",
                    crate::values::get_type(&value)
                ),
            ));
        };

        if name.bytes().next().is_some_and(|b| b.is_ascii_digit()) {
            return Err(self.raise(
                *span,
                format!("cannot assign to ${name}: the name is reserved as a match variable."),
            ));
        }
        if name.contains(':') {
            return Err(self.raise(
                *span,
                format!(
                    "cannot assign to ${name}: assignment can only be performed on variables local to the current scope."
                ),
            ));
        }

        let right_value = self.evaluate(right)?;
        let shared = match &right_value {
            Value::Variable(variable) => Rc::clone(variable.value()),
            other => Rc::new(other.clone()),
        };

        let path: ecow::EcoString = self.source.path().as_str().into();
        let line = self.source.location(span.start()).line;
        let previous =
            self.context
                .current_scope()
                .set(name.clone(), Rc::clone(&shared), Some(path), line);
        if let Some(previous) = previous {
            return Err(match previous.path() {
                Some(path) => self.raise(
                    *span,
                    format!(
                        "cannot assign to ${name}: variable was previously assigned at {path}:{}.",
                        previous.line()
                    ),
                ),
                None => self.raise(
                    *span,
                    format!(
                        "cannot assign to ${name}: a fact or node parameter exists with the same name."
                    ),
                ),
            });
        }

        Ok(Value::Variable(VariableValue::new(
            name.clone(),
            Some(shared),
        )))
    }

    /// Determines whether `actual` matches `expected` for `case` and
    /// selector propositions: regexes match strings (setting `$0…$n`),
    /// types test instances, everything else compares for equality.
    pub(crate) fn is_match(&mut self, actual: &Value, expected: &Value) -> bool {
        match dereference(expected) {
            Value::Regex(regex) => match dereference(actual) {
                Value::String(subject) => {
                    if let Some(captures) = regex.regex().captures(subject) {
                        self.set_match_variables(&captures);
                        true
                    } else {
                        false
                    }
                }
                _ => false,
            },
            Value::Type(t) => t.is_instance(actual),
            _ => crate::values::equals(actual, expected),
        }
    }

    /// Publishes regex captures as `$0…$n`.
    pub(crate) fn set_match_variables(&mut self, captures: &regex::Captures<'_>) {
        let matches: Vec<Value> = (0..captures.len())
            .map(|i| {
                captures
                    .get(i)
                    .map_or(Value::Undef, |m| Value::String(m.as_str().into()))
            })
            .collect();
        self.context.set_matches(matches);
    }

    fn evaluate_if(&mut self, expression: &IfExpression) -> EvalResult<Value> {
        self.with_match_scope(|evaluator| {
            let condition = evaluator.evaluate(&expression.condition)?;
            if is_truthy(&condition) {
                return evaluator.evaluate_block(&expression.body);
            }
            for elsif in &expression.elsifs {
                let condition = evaluator.evaluate(&elsif.condition)?;
                if is_truthy(&condition) {
                    return evaluator.evaluate_block(&elsif.body);
                }
            }
            match &expression.else_body {
                Some(body) => evaluator.evaluate_block(body),
                None => Ok(Value::Undef),
            }
        })
    }

    fn evaluate_unless(&mut self, expression: &UnlessExpression) -> EvalResult<Value> {
        self.with_match_scope(|evaluator| {
            let condition = evaluator.evaluate(&expression.condition)?;
            if !is_truthy(&condition) {
                return evaluator.evaluate_block(&expression.body);
            }
            match &expression.else_body {
                Some(body) => evaluator.evaluate_block(body),
                None => Ok(Value::Undef),
            }
        })
    }

    fn evaluate_case(&mut self, expression: &CaseExpression) -> EvalResult<Value> {
        self.with_match_scope(|evaluator| {
            let control = evaluator.evaluate(&expression.expression)?;

            let mut default_index = None;
            for (index, proposition) in expression.propositions.iter().enumerate() {
                for option in &proposition.options {
                    let value = evaluator.evaluate(option)?;
                    if is_default(&value) {
                        default_index = Some(index);
                        continue;
                    }
                    match unfold(option, value) {
                        Unfolded::Spliced(unfolded) => {
                            for element in unfolded {
                                if evaluator.is_match(&control, &element) {
                                    return evaluator.evaluate_block(&proposition.body);
                                }
                            }
                        }
                        Unfolded::Single(value) => {
                            if evaluator.is_match(&control, &value) {
                                return evaluator.evaluate_block(&proposition.body);
                            }
                        }
                    }
                }
            }

            match default_index {
                Some(index) => evaluator.evaluate_block(&expression.propositions[index].body),
                None => Ok(Value::Undef),
            }
        })
    }

    fn evaluate_selector(
        &mut self,
        value: Value,
        _target_span: Span,
        cases: &[crate::ast::SelectorCase],
    ) -> EvalResult<Value> {
        self.with_match_scope(|evaluator| {
            let mut default_index = None;
            for (index, case) in cases.iter().enumerate() {
                let option = evaluator.evaluate(&case.option)?;
                if is_default(&option) {
                    default_index = Some(index);
                    continue;
                }
                match unfold(&case.option, option) {
                    Unfolded::Spliced(unfolded) => {
                        for element in unfolded {
                            if evaluator.is_match(&value, &element) {
                                return evaluator.evaluate(&case.result);
                            }
                        }
                    }
                    Unfolded::Single(option) => {
                        if evaluator.is_match(&value, &option) {
                            return evaluator.evaluate(&case.result);
                        }
                    }
                }
            }
            match default_index {
                Some(index) => evaluator.evaluate(&cases[index].result),
                None => Ok(Value::Undef),
            }
        })
    }

    /// Evaluates call arguments, unfolding splats, and pairs each value
    /// with its span.
    pub(crate) fn evaluate_arguments(
        &mut self,
        arguments: &[Expression],
    ) -> EvalResult<(Vec<Value>, Vec<Span>)> {
        let mut values = Vec::with_capacity(arguments.len());
        let mut spans = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.evaluate(argument)?;
            match unfold(argument, value) {
                Unfolded::Spliced(unfolded) => {
                    for element in unfolded {
                        values.push(element);
                        spans.push(argument.span());
                    }
                }
                Unfolded::Single(value) => {
                    values.push(value);
                    spans.push(argument.span());
                }
            }
        }
        Ok((values, spans))
    }
}

/// The result of checking an evaluated expression for splat unfolding.
enum Unfolded {
    /// The expression was a splat; splice the elements into the list.
    Spliced(Vec<Value>),
    /// Not a splat; use the value as-is.
    Single(Value),
}

/// Unfolds a splat expression's evaluated value into its elements.
fn unfold(expression: &Expression, value: Value) -> Unfolded {
    if !matches!(
        expression,
        Expression::Unary {
            op: UnaryOperator::Splat,
            ..
        }
    ) {
        return Unfolded::Single(value);
    }
    match mutate(value) {
        Value::Array(elements) => Unfolded::Spliced(elements),
        other => Unfolded::Spliced(vec![other]),
    }
}
