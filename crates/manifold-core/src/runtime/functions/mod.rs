// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Built-in functions.
//!
//! Functions are registered by name and called through
//! [`CallContext`](super::dispatch::CallContext); each checks its own arity
//! and argument types and raises structured errors with the offending
//! argument's span.

mod assertions;
mod catalog;
mod collections;
mod logging;
mod strings;

use crate::diagnostics::Level;
use crate::values::Value;

use super::dispatch::CallContext;
use super::error::EvalResult;

/// The type of a built-in function.
pub(crate) type BuiltinFunction = fn(&mut CallContext<'_, '_, '_>) -> EvalResult<Value>;

/// Finds a built-in function by name.
pub(crate) fn find(name: &str) -> Option<BuiltinFunction> {
    Some(match name {
        "include" => catalog::include,
        "require" => catalog::require,
        "contain" => catalog::contain,
        "realize" => catalog::realize,
        "tag" => catalog::tag,
        "defined" => assertions::defined,
        "assert_type" => assertions::assert_type,
        "fail" => logging::fail,
        "debug" => |context| logging::log(context, Level::Debug),
        "info" => |context| logging::log(context, Level::Info),
        "notice" => |context| logging::log(context, Level::Notice),
        "warning" => |context| logging::log(context, Level::Warning),
        "err" => |context| logging::log(context, Level::Error),
        "alert" => |context| logging::log(context, Level::Alert),
        "emerg" => |context| logging::log(context, Level::Emergency),
        "crit" => |context| logging::log(context, Level::Critical),
        "each" => collections::each,
        "filter" => collections::filter,
        "map" => collections::map,
        "with" => collections::with,
        "split" => strings::split,
        "shellquote" => strings::shellquote,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_functions_resolve() {
        for name in [
            "include",
            "require",
            "contain",
            "realize",
            "notice",
            "err",
            "fail",
            "each",
            "filter",
            "map",
            "with",
            "split",
            "shellquote",
            "assert_type",
            "defined",
        ] {
            assert!(find(name).is_some(), "function {name} should resolve");
        }
        assert!(find("no_such_function").is_none());
    }
}
