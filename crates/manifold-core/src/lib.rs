// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Manifold compiler core.
//!
//! This crate contains the compiler front-end and evaluator for the
//! Manifold configuration language:
//! - Lexical analysis (tokenization, including heredocs and interpolation)
//! - Parsing (AST construction with error recovery)
//! - Definition scanning (classes, defined types, and nodes, pre-pass)
//! - Evaluation (operators, functions, scopes, catalog expressions)
//! - The catalog (resources, overrides, collectors, relationship edges)
//!
//! Compilation takes a node name, a fact provider, and manifest sources,
//! and produces a catalog: a directed graph of fully-resolved resources
//! that a downstream agent applies. The CLI surface, fact acquisition, log
//! rendering, and catalog serialization are external collaborators behind
//! the interfaces in [`facts`], [`diagnostics`], and [`catalog`].
//!
//! ```
//! use std::rc::Rc;
//! use manifold_core::prelude::*;
//!
//! let facts = Rc::new(MemoryFacts::new().with("os", "linux"));
//! let mut sink = CollectingSink::new();
//! let catalog = compile(
//!     "web01.example.com",
//!     facts,
//!     vec![SourceFile::new("site.mf", "file { '/motd': ensure => present }")],
//!     &mut sink,
//! )
//! .expect("compilation succeeds");
//! assert_eq!(catalog.resources().count(), 4); // 3 bootstrap + File[/motd]
//! ```

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod diagnostics;
pub mod facts;
pub mod runtime;
pub mod source_analysis;
pub mod unparse;
pub mod values;

/// Re-export of commonly used types.
pub mod prelude {
    pub use crate::catalog::{Catalog, Resource, ResourceRef, ResourceState};
    pub use crate::compiler::{CompilationError, Node, compile, compile_with_store};
    pub use crate::diagnostics::{CollectingSink, Level, LogRecord, LoggingSink};
    pub use crate::facts::{FactProvider, MemoryFacts};
    pub use crate::source_analysis::SourceFile;
    pub use crate::values::{TypeSpec, Value};
}
