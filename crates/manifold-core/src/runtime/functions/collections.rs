// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Enumeration functions: `each`, `filter`, `map`, and `with`.
//!
//! Enumerable values: strings (by character), arrays, hashes, integers
//! (`0..n`), and enumerable `Integer[from, to]` types. A one-parameter
//! lambda receives the value (hashes: a `[key, value]` pair); a
//! two-parameter lambda receives index-and-value (hashes: key-and-value).

use ecow::EcoString;

use crate::values::{TypeSpec, Value, dereference, get_type, is_true, mutate};

use super::super::dispatch::CallContext;
use super::super::error::EvalResult;

/// One enumerated item: the one-parameter shape and the two-parameter
/// shape.
type Enumerated = (Value, [Value; 2]);

/// Enumerates an argument into lambda-shaped items.
fn enumerate(
    context: &CallContext<'_, '_, '_>,
    argument: &Value,
) -> EvalResult<Vec<Enumerated>> {
    #[allow(clippy::cast_possible_wrap)]
    let items = match dereference(argument) {
        Value::String(text) => text
            .chars()
            .enumerate()
            .map(|(index, c)| {
                let value = Value::String(EcoString::from(c.to_string()));
                (value.clone(), [Value::Integer(index as i64), value])
            })
            .collect(),
        Value::Array(elements) => elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                (
                    element.clone(),
                    [Value::Integer(index as i64), element.clone()],
                )
            })
            .collect(),
        Value::Hash(hash) => hash
            .iter()
            .map(|(key, value)| {
                (
                    Value::Array(vec![key.clone(), value.clone()]),
                    [key.clone(), value.clone()],
                )
            })
            .collect(),
        Value::Integer(count) => (0..*count.max(&0))
            .map(|i| (Value::Integer(i), [Value::Integer(i), Value::Integer(i)]))
            .collect(),
        Value::Type(TypeSpec::Integer {
            from: Some(from),
            to: Some(to),
        }) => (*from..=*to)
            .enumerate()
            .map(|(index, i)| {
                (
                    Value::Integer(i),
                    [Value::Integer(index as i64), Value::Integer(i)],
                )
            })
            .collect(),
        Value::Type(TypeSpec::Integer { .. }) => {
            return Err(context.raise(
                context.argument_span(0),
                format!("{} is not enumerable.", get_type(argument)),
            ));
        }
        other => {
            return Err(context.raise(
                context.argument_span(0),
                format!(
                    "expected enumerable type for first argument but found {}.",
                    get_type(other)
                ),
            ));
        }
    };
    Ok(items)
}

fn check_enumeration_call(context: &CallContext<'_, '_, '_>) -> EvalResult<()> {
    context.check_argument_count(1)?;
    context.require_lambda()?;
    context.check_lambda_parameters(1, 2)
}

/// Yields one item to the lambda with the right parameter shape.
fn yield_item(
    context: &mut CallContext<'_, '_, '_>,
    item: Enumerated,
) -> EvalResult<Value> {
    let (single, pair) = item;
    if context.lambda_parameter_count() == 1 {
        context.yield_(vec![single])
    } else {
        let [first, second] = pair;
        context.yield_(vec![first, second])
    }
}

/// Calls the lambda for each element; the value is the receiver.
pub(super) fn each(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    check_enumeration_call(context)?;
    let argument = context.arguments()[0].clone();
    for item in enumerate(context, &argument)? {
        yield_item(context, item)?;
    }
    Ok(mutate(argument))
}

/// Keeps the elements for which the lambda returns `true`.
pub(super) fn filter(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    check_enumeration_call(context)?;
    let argument = context.arguments()[0].clone();

    // Hashes filter to hashes; everything else filters to an array
    if let Value::Hash(hash) = dereference(&argument) {
        let hash = hash.clone();
        let mut result = crate::values::ValueHash::new();
        for (key, value) in hash {
            let kept = if context.lambda_parameter_count() == 1 {
                context.yield_(vec![Value::Array(vec![key.clone(), value.clone()])])?
            } else {
                context.yield_(vec![key.clone(), value.clone()])?
            };
            if is_true(&kept) {
                result.insert(key, value);
            }
        }
        return Ok(Value::Hash(result));
    }

    let mut result = Vec::new();
    for item in enumerate(context, &argument)? {
        let value = item.0.clone();
        if is_true(&yield_item(context, item)?) {
            result.push(value);
        }
    }
    Ok(Value::Array(result))
}

/// Collects the lambda's results for each element.
pub(super) fn map(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    check_enumeration_call(context)?;
    let argument = context.arguments()[0].clone();

    let mut result = Vec::new();
    for item in enumerate(context, &argument)? {
        result.push(mutate(yield_item(context, item)?));
    }
    Ok(Value::Array(result))
}

/// Yields all arguments to the lambda and returns its value.
pub(super) fn with(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    context.require_lambda()?;
    let arguments = context.take_arguments();
    context.yield_(arguments)
}
