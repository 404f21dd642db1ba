// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Source analysis for Manifold manifests.
//!
//! This module contains the lexer, the parser, and the source-location
//! plumbing shared by both.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts manifest text into a stream of [`Token`]s. Each
//! token carries its source location via [`Span`] and its surrounding
//! trivia (whitespace and comments).
//!
//! ```
//! use manifold_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("$x + 1").collect();
//! assert_eq!(tokens.len(), 3); // $x, +, 1
//! ```
//!
//! # Parsing
//!
//! The [`parse`] function converts tokens into a
//! [`Manifest`](crate::ast::Manifest) AST. Binary operator precedence uses
//! Pratt parsing over the language's climb table.
//!
//! # Error Handling
//!
//! The lexer uses error recovery: invalid input becomes
//! [`TokenKind::Error`] tokens rather than stopping. The parser reports
//! [`Diagnostic`]s and produces error placeholders; a file with error
//! diagnostics fails compilation, but parsing always completes.

mod lexer;
mod parser;
mod source;
mod span;
pub mod token;


pub use lexer::{Lexer, lex, lex_with_eof};
pub use parser::{Diagnostic, Severity, parse, parse_source};
pub use source::{Location, SourceFile};
pub use span::Span;
pub use token::{Token, TokenKind, Trivia, is_statement_call};
