// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Manifold source code.
//!
//! The parser builds a [`Manifest`] AST from a token stream. Binary operator
//! precedence uses Pratt parsing (top-down operator precedence) over the
//! language's climb table; see [`binary_binding_power`].
//!
//! # Statements vs expressions
//!
//! Statements are just expressions separated by optional `;`, but several
//! constructs parse *only* in statement position: resource declarations,
//! resource defaults, resource overrides, and `class`/`define`/`node`
//! definitions. Collectors parse in expression position.
//!
//! # Error handling
//!
//! The parser always produces a `Manifest`; syntax errors become
//! [`Diagnostic`]s ("expected `}` but found `<eof>`") plus
//! [`Expression::Error`] placeholders, with synchronisation at statement
//! boundaries.
//!
//! # Usage
//!
//! ```
//! use manifold_core::source_analysis::{lex_with_eof, parse};
//!
//! let (manifest, diagnostics) = parse(lex_with_eof("$x = 3 + 4"));
//! assert!(diagnostics.is_empty());
//! assert_eq!(manifest.body.len(), 1);
//! ```

use ecow::EcoString;

use crate::ast::{BinaryOperator, Expression, Manifest};

use super::{Span, Token, TokenKind, lex_with_eof};

mod expressions;
mod statements;
mod strings;


/// Parses a token stream into a manifest.
///
/// Always returns a [`Manifest`]; check the diagnostics for errors.
#[must_use]
pub fn parse(tokens: Vec<Token>) -> (Manifest, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let manifest = parser.parse_manifest();
    (manifest, parser.diagnostics)
}

/// Lexes and parses source text in one step.
#[must_use]
pub fn parse_source(source: &str) -> (Manifest, Vec<Diagnostic>) {
    parse(lex_with_eof(source))
}

/// A diagnostic message (error or warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message text.
    pub message: EcoString,
    /// The source location.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An error that fails the compilation of the file.
    Error,
    /// A warning that should be addressed.
    Warning,
}

// ============================================================================
// Pratt binding powers
// ============================================================================

/// Binding power for binary operators (Pratt parsing).
///
/// Higher values bind tighter. Left- and right-associativity come from the
/// left/right pair ordering.
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    /// How tightly the operator binds to its left operand.
    pub(super) left: u8,
    /// How tightly the operator binds to its right operand.
    pub(super) right: u8,
}

impl BindingPower {
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }

    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
        }
    }
}

/// Gets the binding power and AST operator for a binary operator token.
///
/// The climb table, lowest to highest: relationship edges, assignment
/// (right-associative), `or`, `and`, relational, equality, shifts,
/// additive, multiplicative, match, `in`.
pub(super) fn binary_binding_power(kind: &TokenKind) -> Option<(BinaryOperator, BindingPower)> {
    let (op, power) = match kind {
        TokenKind::RightArrow => (BinaryOperator::Before, BindingPower::left_assoc(2)),
        TokenKind::RightTildeArrow => (BinaryOperator::Notify, BindingPower::left_assoc(2)),
        TokenKind::LeftArrow => (BinaryOperator::Require, BindingPower::left_assoc(2)),
        TokenKind::LeftTildeArrow => (BinaryOperator::Subscribe, BindingPower::left_assoc(2)),

        TokenKind::Equals => (BinaryOperator::Assign, BindingPower::right_assoc(4)),

        TokenKind::KeywordOr => (BinaryOperator::Or, BindingPower::left_assoc(6)),
        TokenKind::KeywordAnd => (BinaryOperator::And, BindingPower::left_assoc(8)),

        TokenKind::Greater => (BinaryOperator::GreaterThan, BindingPower::left_assoc(10)),
        TokenKind::GreaterEquals => (BinaryOperator::GreaterEquals, BindingPower::left_assoc(10)),
        TokenKind::Less => (BinaryOperator::LessThan, BindingPower::left_assoc(10)),
        TokenKind::LessEquals => (BinaryOperator::LessEquals, BindingPower::left_assoc(10)),

        TokenKind::EqualsEquals => (BinaryOperator::Equals, BindingPower::left_assoc(12)),
        TokenKind::NotEquals => (BinaryOperator::NotEquals, BindingPower::left_assoc(12)),

        TokenKind::LeftShift => (BinaryOperator::LeftShift, BindingPower::left_assoc(14)),
        TokenKind::RightShift => (BinaryOperator::RightShift, BindingPower::left_assoc(14)),

        TokenKind::Plus => (BinaryOperator::Plus, BindingPower::left_assoc(16)),
        TokenKind::Minus => (BinaryOperator::Minus, BindingPower::left_assoc(16)),

        TokenKind::Star => (BinaryOperator::Multiply, BindingPower::left_assoc(18)),
        TokenKind::Slash => (BinaryOperator::Divide, BindingPower::left_assoc(18)),
        TokenKind::Percent => (BinaryOperator::Modulo, BindingPower::left_assoc(18)),

        TokenKind::MatchOp => (BinaryOperator::Match, BindingPower::left_assoc(20)),
        TokenKind::NotMatchOp => (BinaryOperator::NotMatch, BindingPower::left_assoc(20)),

        TokenKind::KeywordIn => (BinaryOperator::In, BindingPower::left_assoc(22)),

        _ => return None,
    };
    Some((op, power))
}

// ============================================================================
// Parser state
// ============================================================================

/// The parser state.
pub(super) struct Parser {
    /// The tokens being parsed.
    pub(super) tokens: Vec<Token>,
    /// Current token index.
    pub(super) current: usize,
    /// Accumulated diagnostics.
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Creates a new parser for the given tokens.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Token management
    // ------------------------------------------------------------------

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            self.tokens
                .last()
                .expect("parser has no tokens; expected at least an EOF token")
        }
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Returns the current token's span.
    pub(super) fn current_span(&self) -> Span {
        self.current_token().span()
    }

    /// Peeks at a token kind at the given offset from the current position.
    pub(super) fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(Token::kind)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Advances to the next token and returns the previous one.
    pub(super) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    /// Checks if the current token matches the given kind (by discriminant).
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match the given kind, advancing if so.
    ///
    /// Reports "expected `<kind>` but found `<token>`" and returns false
    /// otherwise.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            self.expected(&format!("`{kind}`"));
            false
        }
    }

    // ------------------------------------------------------------------
    // Error handling & recovery
    // ------------------------------------------------------------------

    /// Reports an error at the current token.
    pub(super) fn error(&mut self, message: impl Into<EcoString>) {
        let span = self.current_span();
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    /// Reports an "expected X but found `<token>`" error at the current token.
    pub(super) fn expected(&mut self, what: &str) {
        let found = self.current_kind().to_string();
        self.error(ecow::eco_format!("expected {what} but found `{found}`"));
    }

    /// Synchronizes to a statement boundary after an error.
    pub(super) fn synchronize(&mut self) {
        if self.is_at_end() {
            return;
        }
        self.advance();
        while !self.is_at_end() {
            if matches!(
                self.current_kind(),
                TokenKind::Semicolon | TokenKind::RightBrace
            ) {
                self.advance();
                return;
            }
            if self.at_statement_start() {
                return;
            }
            self.advance();
        }
    }

    /// Returns true if the current token plausibly begins a new statement.
    fn at_statement_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::KeywordClass
                | TokenKind::KeywordDefine
                | TokenKind::KeywordNode
                | TokenKind::KeywordIf
                | TokenKind::KeywordUnless
                | TokenKind::KeywordCase
                | TokenKind::StatementCall(_)
        )
    }

    // ------------------------------------------------------------------
    // Manifest parsing
    // ------------------------------------------------------------------

    /// Parses a complete manifest (top level).
    fn parse_manifest(&mut self) -> Manifest {
        let start = self.current_span();
        let mut body = Vec::new();

        while !self.is_at_end() {
            // Statements are separated by optional semicolons.
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let statement = self.parse_statement();
            let is_error = statement.is_error();
            body.push(statement);
            if is_error {
                self.synchronize();
            }
        }

        let end = if self.current > 0 {
            self.tokens[self.current - 1].span()
        } else {
            start
        };
        Manifest {
            body,
            span: start.merge(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AttributeOperator, BinaryOperator, HostnameKind, ResourceStatus, StringSegment,
        UnaryOperator,
    };

    /// Parses source expecting no diagnostics.
    #[track_caller]
    fn parse_ok(source: &str) -> Manifest {
        let (manifest, diagnostics) = parse_source(source);
        assert!(
            diagnostics.is_empty(),
            "expected no diagnostics for {source:?}, got: {diagnostics:?}"
        );
        manifest
    }

    /// Parses source expecting at least one error diagnostic.
    #[track_caller]
    fn parse_err(source: &str) -> Vec<Diagnostic> {
        let (_manifest, diagnostics) = parse_source(source);
        assert!(
            diagnostics.iter().any(|d| d.severity == Severity::Error),
            "expected an error for {source:?}"
        );
        diagnostics
    }

    #[test]
    fn parses_literals() {
        let manifest = parse_ok("42; 3.14; true; false; undef; default; 'hi'; /re/");
        assert_eq!(manifest.body.len(), 8);
        assert!(matches!(manifest.body[0], Expression::Integer(42, _)));
        assert!(matches!(manifest.body[1], Expression::Float(f, _) if (f - 3.14).abs() < 1e-9));
        assert!(matches!(manifest.body[2], Expression::Boolean(true, _)));
        assert!(matches!(manifest.body[3], Expression::Boolean(false, _)));
        assert!(matches!(manifest.body[4], Expression::Undef(_)));
        assert!(matches!(manifest.body[5], Expression::Default(_)));
        assert!(matches!(&manifest.body[6], Expression::String(s) if s.as_literal().is_some()));
        assert!(matches!(&manifest.body[7], Expression::Regex(p, _) if p == "re"));
    }

    #[test]
    fn parses_hex_and_octal_numbers() {
        let manifest = parse_ok("0x1F; 0755");
        assert!(matches!(manifest.body[0], Expression::Integer(31, _)));
        assert!(matches!(manifest.body[1], Expression::Integer(493, _)));
    }

    #[test]
    fn parses_assignment_right_associative() {
        let manifest = parse_ok("$x = $y = 2");
        let Expression::Binary {
            op: BinaryOperator::Assign,
            right,
            ..
        } = &manifest.body[0]
        else {
            panic!("expected assignment");
        };
        assert!(matches!(
            **right,
            Expression::Binary {
                op: BinaryOperator::Assign,
                ..
            }
        ));
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let manifest = parse_ok("$x = 1 + 2 * 3");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::Binary {
            op: BinaryOperator::Plus,
            right: product,
            ..
        } = &**right
        else {
            panic!("expected plus at top");
        };
        assert!(matches!(
            **product,
            Expression::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let manifest = parse_ok("$x = true or false and false");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(
            **right,
            Expression::Binary {
                op: BinaryOperator::Or,
                ..
            }
        ));
    }

    #[test]
    fn parses_unary_operators() {
        let manifest = parse_ok("$x = -1; $y = !true; $z = *$arr");
        assert!(matches!(
            &manifest.body[0],
            Expression::Binary { right, .. }
                if matches!(**right, Expression::Unary { op: UnaryOperator::Negate, .. })
        ));
        assert!(matches!(
            &manifest.body[1],
            Expression::Binary { right, .. }
                if matches!(**right, Expression::Unary { op: UnaryOperator::Not, .. })
        ));
        assert!(matches!(
            &manifest.body[2],
            Expression::Binary { right, .. }
                if matches!(**right, Expression::Unary { op: UnaryOperator::Splat, .. })
        ));
    }

    #[test]
    fn parses_arrays_and_hashes() {
        let manifest = parse_ok("$x = [1, 2, 3,]; $y = { 'a' => 1, 'b' => 2 }");
        assert!(matches!(
            &manifest.body[0],
            Expression::Binary { right, .. } if matches!(&**right, Expression::Array(e, _) if e.len() == 3)
        ));
        assert!(matches!(
            &manifest.body[1],
            Expression::Binary { right, .. } if matches!(&**right, Expression::Hash(p, _) if p.len() == 2)
        ));
    }

    #[test]
    fn parses_access_and_method_calls() {
        let manifest = parse_ok("$x = $a[1]; $y = [1, 2, 3].filter |$v| { $v > 1 }");
        assert!(matches!(
            &manifest.body[0],
            Expression::Binary { right, .. } if matches!(&**right, Expression::Access { .. })
        ));
        let Expression::Binary { right, .. } = &manifest.body[1] else {
            panic!("expected assignment");
        };
        let Expression::MethodCall { name, lambda, .. } = &**right else {
            panic!("expected method call, got {right:?}");
        };
        assert_eq!(name, "filter");
        assert!(lambda.is_some());
    }

    #[test]
    fn parses_selector() {
        let manifest = parse_ok("$x = $os ? { 'linux' => 1, default => 2 }");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::Selector { cases, .. } = &**right else {
            panic!("expected selector, got {right:?}");
        };
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn parses_if_elsif_else() {
        let manifest = parse_ok("if 1 == 1 { $x = 2 } elsif 2 > 1 { $x = 3 } else { $x = 4 }");
        let Expression::If(expr) = &manifest.body[0] else {
            panic!("expected if");
        };
        assert_eq!(expr.elsifs.len(), 1);
        assert!(expr.else_body.is_some());
    }

    #[test]
    fn parses_unless() {
        let manifest = parse_ok("unless $x { notice('no') } else { notice('yes') }");
        assert!(matches!(&manifest.body[0], Expression::Unless(u) if u.else_body.is_some()));
    }

    #[test]
    fn parses_case() {
        let manifest = parse_ok("case $os { 'linux', 'bsd': { notice('unixy') } default: { } }");
        let Expression::Case(expr) = &manifest.body[0] else {
            panic!("expected case");
        };
        assert_eq!(expr.propositions.len(), 2);
        assert_eq!(expr.propositions[0].options.len(), 2);
    }

    #[test]
    fn parses_function_calls_and_statement_calls() {
        let manifest = parse_ok("notice('hi'); include apache; split('a,b', ',')");
        assert!(matches!(
            &manifest.body[0],
            Expression::FunctionCall { name, is_statement: false, .. } if name == "notice"
        ));
        assert!(matches!(
            &manifest.body[1],
            Expression::FunctionCall { name, is_statement: true, arguments, .. }
                if name == "include" && arguments.len() == 1
        ));
        assert!(matches!(
            &manifest.body[2],
            Expression::FunctionCall { name, .. } if name == "split"
        ));
    }

    #[test]
    fn parses_resource_declaration() {
        let manifest = parse_ok("file { '/tmp/x': ensure => present, mode => '0644' }");
        let Expression::Resource(resource) = &manifest.body[0] else {
            panic!("expected resource, got {:?}", manifest.body[0]);
        };
        assert_eq!(resource.status, ResourceStatus::Realized);
        assert_eq!(resource.bodies.len(), 1);
        assert_eq!(resource.bodies[0].operations.len(), 2);
        assert!(matches!(
            resource.bodies[0].operations[0].op,
            AttributeOperator::Assign
        ));
    }

    #[test]
    fn parses_virtual_and_exported_resources() {
        let manifest = parse_ok("@user { 'bob': }\n@@host { 'web': }");
        assert!(matches!(
            &manifest.body[0],
            Expression::Resource(r) if r.status == ResourceStatus::Virtual
        ));
        assert!(matches!(
            &manifest.body[1],
            Expression::Resource(r) if r.status == ResourceStatus::Exported
        ));
    }

    #[test]
    fn parses_multiple_resource_bodies() {
        let manifest = parse_ok("file { '/a': ensure => present; '/b': ensure => absent }");
        let Expression::Resource(resource) = &manifest.body[0] else {
            panic!("expected resource");
        };
        assert_eq!(resource.bodies.len(), 2);
    }

    #[test]
    fn parses_class_resource_declaration() {
        let manifest = parse_ok("class { 'motd': content => 'hi' }");
        let Expression::Resource(resource) = &manifest.body[0] else {
            panic!("expected resource");
        };
        assert!(matches!(&*resource.type_expr, Expression::Name(n, _) if n == "class"));
    }

    #[test]
    fn parses_resource_defaults() {
        let manifest = parse_ok("File { mode => '0644', owner +> 'root' }");
        let Expression::ResourceDefaults(defaults) = &manifest.body[0] else {
            panic!("expected defaults, got {:?}", manifest.body[0]);
        };
        assert_eq!(defaults.type_name, "File");
        assert_eq!(defaults.operations.len(), 2);
        assert!(matches!(
            defaults.operations[1].op,
            AttributeOperator::Append
        ));
    }

    #[test]
    fn parses_resource_override() {
        let manifest = parse_ok("File['/tmp/x'] { mode => '0644' }");
        let Expression::ResourceOverride(over) = &manifest.body[0] else {
            panic!("expected override, got {:?}", manifest.body[0]);
        };
        assert!(matches!(&*over.reference, Expression::Access { .. }));
    }

    #[test]
    fn parses_class_definition() {
        let manifest = parse_ok("class webserver($port = 80) inherits baseline { notice($port) }");
        let Expression::ClassDefinition(class) = &manifest.body[0] else {
            panic!("expected class definition");
        };
        assert_eq!(class.name, "webserver");
        assert_eq!(class.parameters.len(), 1);
        assert_eq!(class.parent.as_ref().map(|(n, _)| n.as_str()), Some("baseline"));
        assert_eq!(class.body.len(), 1);
    }

    #[test]
    fn parses_defined_type() {
        let manifest = parse_ok("define mymod::thing(String $msg) { notice($msg) }");
        let Expression::DefinedType(defined) = &manifest.body[0] else {
            panic!("expected defined type");
        };
        assert_eq!(defined.name, "mymod::thing");
        assert!(defined.parameters[0].type_expr.is_some());
    }

    #[test]
    fn parses_node_definitions() {
        let manifest = parse_ok("node 'web01.example.com', /^db\\d+$/, default { notice('n') }");
        let Expression::NodeDefinition(node) = &manifest.body[0] else {
            panic!("expected node definition");
        };
        assert_eq!(node.hostnames.len(), 3);
        assert!(matches!(node.hostnames[0].kind, HostnameKind::String(_)));
        assert!(matches!(node.hostnames[1].kind, HostnameKind::Regex(_)));
        assert!(matches!(node.hostnames[2].kind, HostnameKind::Default));
    }

    #[test]
    fn parses_dotted_node_name() {
        let manifest = parse_ok("node web01.example.com { }");
        let Expression::NodeDefinition(node) = &manifest.body[0] else {
            panic!("expected node definition");
        };
        assert!(
            matches!(&node.hostnames[0].kind, HostnameKind::Name(n) if n == "web01.example.com")
        );
    }

    #[test]
    fn parses_collectors() {
        let manifest = parse_ok("User <| title == 'bob' |>; Sshkey <<| |>>");
        let Expression::Collection(collect) = &manifest.body[0] else {
            panic!("expected collection, got {:?}", manifest.body[0]);
        };
        assert!(!collect.exported);
        assert!(collect.query.is_some());
        assert!(matches!(
            &manifest.body[1],
            Expression::Collection(c) if c.exported && c.query.is_none()
        ));
    }

    #[test]
    fn parses_collector_query_joins() {
        let manifest = parse_ok("User <| group == 'wheel' and shell != '/bin/false' |>");
        let Expression::Collection(collect) = &manifest.body[0] else {
            panic!("expected collection");
        };
        assert!(matches!(
            collect.query.as_ref().unwrap(),
            crate::ast::QueryExpression::Binary { .. }
        ));
    }

    #[test]
    fn parses_relationship_chains() {
        let manifest = parse_ok("File['/a'] -> File['/b'] ~> Service['x']");
        let Expression::Binary {
            op: BinaryOperator::Notify,
            left,
            ..
        } = &manifest.body[0]
        else {
            panic!("expected notify edge at top, got {:?}", manifest.body[0]);
        };
        assert!(matches!(
            **left,
            Expression::Binary {
                op: BinaryOperator::Before,
                ..
            }
        ));
    }

    #[test]
    fn parses_interpolated_strings() {
        let manifest = parse_ok(r#"$msg = "a ${1 + 2} b $x c""#);
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::String(s) = &**right else {
            panic!("expected string, got {right:?}");
        };
        let kinds: Vec<&str> = s
            .segments
            .iter()
            .map(|seg| match seg {
                StringSegment::Literal(_) => "lit",
                StringSegment::Variable(..) => "var",
                StringSegment::Expression(_) => "expr",
            })
            .collect();
        assert_eq!(kinds, vec!["lit", "expr", "lit", "var", "lit"]);
    }

    #[test]
    fn parses_escape_sequences() {
        let manifest = parse_ok(r#"$x = "a\tb\nc\$d""#);
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::String(s) = &**right else {
            panic!("expected string");
        };
        assert_eq!(
            s.as_literal().map(EcoString::as_str),
            Some("a\tb\nc$d")
        );
    }

    #[test]
    fn reports_expected_token_errors() {
        let diagnostics = parse_err("file { '/x' ensure => present }");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message.contains("expected") && d.message.contains("but found"))
        );
        parse_err("$x = ");
        parse_err("if { }");
        parse_err("class { }");
    }

    #[test]
    fn error_recovery_continues_parsing() {
        let (manifest, diagnostics) = parse_source("$x = ; notice('ok')");
        assert!(!diagnostics.is_empty());
        assert!(
            manifest
                .body
                .iter()
                .any(|e| matches!(e, Expression::FunctionCall { name, .. } if name == "notice"))
        );
    }

    #[test]
    fn statement_only_expressions_rejected_in_expression_position() {
        parse_err("$x = (class foo { })");
    }

    #[test]
    fn parses_heredoc_literal() {
        let source = "$content = @(END)\n  hello\n  | END\nnotice($content)";
        let manifest = parse_ok(source);
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(&**right, Expression::String(_)));
    }

    #[test]
    fn parses_chained_access() {
        let manifest = parse_ok("$x = $data['a'][0]");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::Access { target, .. } = &**right else {
            panic!("expected access");
        };
        assert!(matches!(**target, Expression::Access { .. }));
    }

    #[test]
    fn parses_type_access() {
        let manifest = parse_ok("$t = Integer[1, 10]");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(
            &**right,
            Expression::Access { target, arguments, .. }
                if matches!(&**target, Expression::TypeName(n, _) if n == "Integer")
                    && arguments.len() == 2
        ));
    }

    #[test]
    fn parses_parenthesized_expressions() {
        let manifest = parse_ok("$x = (1 + 2) * 3");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(
            &**right,
            Expression::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn parses_lambda_with_defaults_and_captures() {
        let manifest = parse_ok("with(1) |Integer $a, $b = 2, *$rest| { $a }");
        let Expression::FunctionCall { lambda, .. } = &manifest.body[0] else {
            panic!("expected call");
        };
        let lambda = lambda.as_ref().unwrap();
        assert_eq!(lambda.parameters.len(), 3);
        assert!(lambda.parameters[0].type_expr.is_some());
        assert!(lambda.parameters[1].default.is_some());
        assert!(lambda.parameters[2].captures);
    }
}
