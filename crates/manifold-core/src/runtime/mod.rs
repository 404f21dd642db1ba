// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The evaluation runtime.
//!
//! This module contains everything that runs after parsing and scanning:
//! scopes and the evaluation context, the expression evaluator (with its
//! operator, access, dispatch, and catalog-expression impl blocks), the
//! parameter-binding executor, and the built-in functions.

mod access;
mod catalog_expressions;
mod context;
mod dispatch;
mod error;
mod evaluator;
mod executor;
mod functions;
mod operators;
mod scope;

pub use context::{EvaluationContext, Lookup};
pub use dispatch::CallContext;
pub use error::{EvalResult, EvaluationError};
pub use evaluator::Evaluator;
pub use executor::Executor;
pub use scope::{AssignedVariable, Scope, ScopeDefault};
