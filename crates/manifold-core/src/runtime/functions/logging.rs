// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging functions (`debug` through `crit`) and `fail`.

use crate::diagnostics::Level;
use crate::values::{Value, join};

use super::super::dispatch::CallContext;
use super::super::error::EvalResult;

/// Logs the space-joined arguments at `level` and returns the message.
pub(super) fn log(context: &mut CallContext<'_, '_, '_>, level: Level) -> EvalResult<Value> {
    let message = join(context.arguments(), " ");
    context
        .evaluator()
        .context
        .logger()
        .log_message(level, message.clone());
    Ok(Value::String(message.into()))
}

/// Fails the compilation with the space-joined arguments as the message.
pub(super) fn fail(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    let message = join(context.arguments(), " ");
    Err(context.raise(context.span(), message))
}
