// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! String functions: `split` and `shellquote`.

use ecow::EcoString;

use crate::values::{TypeSpec, Value, ValueRegex, dereference, get_type};

use super::super::dispatch::CallContext;
use super::super::error::EvalResult;

/// Splits a string by a string, regex, or `Regexp` type separator. An
/// empty separator splits into characters; empty fields are kept.
pub(super) fn split(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    context.check_argument_count(2)?;

    let Value::String(subject) = dereference(&context.arguments()[0]).clone() else {
        let found = get_type(&context.arguments()[0]);
        return Err(context.raise(
            context.argument_span(0),
            format!("expected String for first argument but found {found}."),
        ));
    };

    let fields: Vec<Value> = match dereference(&context.arguments()[1]) {
        Value::String(separator) => {
            if separator.is_empty() {
                split_characters(&subject)
            } else {
                subject
                    .split(separator.as_str())
                    .map(|field| Value::String(field.into()))
                    .collect()
            }
        }
        Value::Regex(regex) => split_pattern(&subject, regex),
        Value::Type(TypeSpec::Regexp(Some(pattern))) => {
            let regex = ValueRegex::new(pattern.clone()).map_err(|error| {
                context.raise(
                    context.argument_span(1),
                    format!("invalid regular expression: {error}"),
                )
            })?;
            split_pattern(&subject, &regex)
        }
        other => {
            return Err(context.raise(
                context.argument_span(1),
                format!(
                    "expected String or Regexp for second argument but found {}.",
                    get_type(other)
                ),
            ));
        }
    };

    Ok(Value::Array(fields))
}

fn split_characters(subject: &str) -> Vec<Value> {
    subject
        .chars()
        .map(|c| Value::String(EcoString::from(c.to_string())))
        .collect()
}

fn split_pattern(subject: &str, regex: &ValueRegex) -> Vec<Value> {
    if regex.pattern().is_empty() {
        return split_characters(subject);
    }
    regex
        .regex()
        .split(subject)
        .map(|field| Value::String(field.into()))
        .collect()
}

/// Quotes each argument for a POSIX shell and joins them with spaces.
pub(super) fn shellquote(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    let mut quoted = Vec::new();
    for (index, argument) in context.arguments().iter().enumerate() {
        match dereference(argument) {
            Value::String(text) => quoted.push(quote(text)),
            Value::Array(elements) => {
                for element in elements {
                    match dereference(element) {
                        Value::String(text) => quoted.push(quote(text)),
                        other => {
                            return Err(context.raise(
                                context.argument_span(index),
                                format!(
                                    "expected String for argument but found {}.",
                                    get_type(other)
                                ),
                            ));
                        }
                    }
                }
            }
            other => quoted.push(quote(&other.to_string())),
        }
    }
    Ok(Value::String(quoted.join(" ").into()))
}

/// Quotes a word when it contains shell-special characters.
fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b':' | b'=' | b'@'));
    if safe {
        return word.to_string();
    }
    let mut out = String::with_capacity(word.len() + 2);
    out.push('\'');
    for c in word.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
