// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Type assertions: `assert_type` and `defined`.

use crate::catalog::ResourceRef;
use crate::values::{TypeSpec, Value, dereference, get_type, is_truthy, mutate};

use super::super::dispatch::CallContext;
use super::super::error::EvalResult;

/// Asserts that the second argument is an instance of the first argument's
/// type. On mismatch, yields `(expected, actual)` types to the lambda if
/// one is given, otherwise fails.
pub(super) fn assert_type(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    context.check_argument_count(2)?;

    let expected = match dereference(&context.arguments()[0]) {
        Value::Type(t) => t.clone(),
        Value::String(name) => TypeSpec::from_name(name),
        other => {
            return Err(context.raise(
                context.argument_span(0),
                format!(
                    "expected Type or String for first argument but found {}.",
                    get_type(other)
                ),
            ));
        }
    };

    let value = context.arguments()[1].clone();
    if expected.is_instance(&value) {
        return Ok(mutate(value));
    }

    let actual = get_type(&value);
    if context.lambda_given() {
        return context.yield_(vec![
            Value::Type(expected),
            Value::Type(actual),
        ]);
    }
    Err(context.raise(
        context.argument_span(1),
        format!("expected {expected} but found {actual}."),
    ))
}

/// Returns true if every argument names something known: a defined class,
/// a defined (or built-in-declared) resource type, a resource in the
/// catalog, or an assigned variable.
pub(super) fn defined(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    if context.arguments().is_empty() {
        return Err(context.raise(
            context.span(),
            format!(
                "expected at least one argument to '{}' function.",
                context.name()
            ),
        ));
    }

    for index in 0..context.arguments().len() {
        let argument = context.arguments()[index].clone();
        let known = match dereference(&argument) {
            Value::String(name) => {
                if let Some(variable) = name.strip_prefix('$') {
                    is_truthy(&Value::Boolean(
                        context.evaluator().context.lookup(variable).value.is_some(),
                    ))
                } else {
                    let lowered = name.to_lowercase();
                    context.evaluator().context.catalog.find_class(&lowered).is_some()
                        || context
                            .evaluator()
                            .context
                            .catalog
                            .find_defined_type(&lowered)
                            .is_some()
                }
            }
            Value::Type(TypeSpec::Class(Some(name))) => {
                let name = name.to_lowercase();
                context.evaluator().context.catalog.find_class(&name).is_some()
            }
            Value::Type(TypeSpec::Resource {
                type_name: Some(type_name),
                title: Some(title),
            }) => {
                let reference = ResourceRef::new(type_name, title.clone());
                context
                    .evaluator()
                    .context
                    .catalog
                    .find_resource(&reference)
                    .is_some()
            }
            Value::Type(TypeSpec::Resource {
                type_name: Some(type_name),
                title: None,
            }) => context
                .evaluator()
                .context
                .catalog
                .find_defined_type(&type_name.to_lowercase())
                .is_some(),
            other => {
                return Err(context.raise(
                    context.argument_span(index),
                    format!(
                        "expected String, Class, or Resource for argument but found {}.",
                        get_type(other)
                    ),
                ));
            }
        };
        if !known {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}
