// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! `[]` access: string and array indexing/slicing, hash lookup, and type
//! parameterisation.
//!
//! Negative indices count from the end. An out-of-range array or hash
//! access yields `undef`; an out-of-range string access yields the empty
//! string. Accessing a type parameterises it (`Integer[1, 10]`,
//! `File['/x']`).

use crate::source_analysis::Span;
use crate::values::{Value, dereference, get_type};

use super::error::EvalResult;
use super::evaluator::Evaluator;

impl Evaluator<'_, '_> {
    /// Applies `target[arguments…]`.
    pub(crate) fn access(
        &mut self,
        target: Value,
        target_span: Span,
        arguments: &[(Value, Span)],
    ) -> EvalResult<Value> {
        if arguments.is_empty() {
            return Err(self.raise(target_span, "expected at least one access argument."));
        }

        match dereference(&target) {
            Value::String(text) => self.access_string(text, target_span, arguments),
            Value::Array(elements) => self.access_array(elements, target_span, arguments),
            Value::Hash(hash) => {
                if arguments.len() == 1 {
                    let key = dereference(&arguments[0].0);
                    return Ok(hash.get(key).cloned().unwrap_or(Value::Undef));
                }
                let values = arguments
                    .iter()
                    .map(|(key, _)| hash.get(dereference(key)).cloned().unwrap_or(Value::Undef))
                    .collect();
                Ok(Value::Array(values))
            }
            Value::Type(t) => {
                let values: Vec<Value> = arguments.iter().map(|(value, _)| value.clone()).collect();
                t.parameterize(&values)
                    .map(Value::Type)
                    .map_err(|message| self.raise(target_span, format!("{message}.")))
            }
            other => Err(self.raise(
                target_span,
                format!(
                    "expected String, Array, Hash, or Type for access but found {}.",
                    get_type(other)
                ),
            )),
        }
    }

    /// `string[index]` and `string[start, count]`.
    fn access_string(
        &self,
        text: &str,
        target_span: Span,
        arguments: &[(Value, Span)],
    ) -> EvalResult<Value> {
        let characters: Vec<char> = text.chars().collect();
        let (start, count) = self.slice_bounds(characters.len(), target_span, arguments)?;
        let result: String = characters.iter().skip(start).take(count).collect();
        Ok(Value::String(result.into()))
    }

    /// `array[index]` and `array[start, count]`.
    fn access_array(
        &self,
        elements: &[Value],
        target_span: Span,
        arguments: &[(Value, Span)],
    ) -> EvalResult<Value> {
        if arguments.len() == 1 {
            let index = self.index_argument(&arguments[0])?;
            let index = normalize_index(index, elements.len());
            return Ok(index
                .and_then(|i| elements.get(i))
                .cloned()
                .unwrap_or(Value::Undef));
        }
        let (start, count) = self.slice_bounds(elements.len(), target_span, arguments)?;
        Ok(Value::Array(
            elements.iter().skip(start).take(count).cloned().collect(),
        ))
    }

    /// Resolves `[index]` / `[start, count]` arguments against a length.
    fn slice_bounds(
        &self,
        length: usize,
        target_span: Span,
        arguments: &[(Value, Span)],
    ) -> EvalResult<(usize, usize)> {
        if arguments.len() > 2 {
            return Err(self.raise(
                target_span,
                "expected at most two access arguments for a slice.",
            ));
        }

        let start = self.index_argument(&arguments[0])?;
        let Some(start) = normalize_index(start, length) else {
            return Ok((0, 0));
        };

        let count = match arguments.get(1) {
            None => 1,
            Some(argument) => {
                let count = self.index_argument(argument)?;
                usize::try_from(count.max(0)).unwrap_or(0)
            }
        };
        Ok((start, count))
    }

    /// An access index must be an integer.
    fn index_argument(&self, (value, span): &(Value, Span)) -> EvalResult<i64> {
        match dereference(value) {
            Value::Integer(index) => Ok(*index),
            other => Err(self.raise(
                *span,
                format!("expected Integer for access index but found {}.", get_type(other)),
            )),
        }
    }
}

/// Normalises a possibly-negative index; `None` when out of range.
fn normalize_index(index: i64, length: usize) -> Option<usize> {
    let length = i64::try_from(length).unwrap_or(i64::MAX);
    let resolved = if index < 0 { length + index } else { index };
    if (0..length).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}
