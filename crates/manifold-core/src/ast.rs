// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for the Manifold language.
//!
//! The AST represents the structure of a manifest after parsing. Every node
//! carries a [`Span`] for error reporting. Statements are expressions: a
//! [`Manifest`] body is simply a list of expressions, and blocks (`if`
//! bodies, class bodies, lambda bodies) are lists of expressions too.
//!
//! Definitions (`class`, `define`, `node`) are wrapped in [`Rc`] handles so
//! the definition scanner can register them in the catalog without copying
//! the subtree; the evaluator later walks the shared body when the class or
//! defined type is declared.
//!
//! # Statement-only expressions
//!
//! Resource declarations, resource defaults, resource overrides, and
//! definitions parse only in statement position. Collector expressions
//! (`Type <| query |>`) are ordinary expressions.

use std::rc::Rc;

use ecow::EcoString;

use crate::source_analysis::Span;

/// A parsed manifest: the top-level expression body.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Top-level expressions in source order.
    pub body: Vec<Expression>,
    /// Source location spanning the entire manifest.
    pub span: Span,
}

/// An expression (and therefore also a statement).
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The `undef` literal.
    Undef(Span),
    /// The `default` marker literal.
    Default(Span),
    /// A boolean literal.
    Boolean(bool, Span),
    /// An integer literal.
    Integer(i64, Span),
    /// A floating-point literal.
    Float(f64, Span),
    /// A string literal (single-quoted, double-quoted, or heredoc) as a
    /// sequence of interpolation segments.
    String(StringLiteral),
    /// A regex literal: `/pattern/`.
    Regex(EcoString, Span),
    /// A variable reference: `$name` (stored without the sigil).
    Variable(EcoString, Span),
    /// A lowercase name: `file`, `foo::bar`.
    Name(EcoString, Span),
    /// A bare word: `present`, `x86-64`.
    BareWord(EcoString, Span),
    /// A type reference: `File`, `Integer`.
    TypeName(EcoString, Span),
    /// An array literal.
    Array(Vec<Expression>, Span),
    /// A hash literal with ordered pairs.
    Hash(Vec<(Expression, Expression)>, Span),

    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        operand: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOperator,
        /// The left operand.
        left: Box<Expression>,
        /// The right operand.
        right: Box<Expression>,
        /// Source location.
        span: Span,
    },

    /// An access expression: `x[a, b]`.
    Access {
        /// The expression being accessed.
        target: Box<Expression>,
        /// The access arguments.
        arguments: Vec<Expression>,
        /// Source location.
        span: Span,
    },

    /// A method call: `x.m(args) |…| { … }`.
    MethodCall {
        /// The receiver.
        target: Box<Expression>,
        /// The method name.
        name: EcoString,
        /// The method name's location.
        name_span: Span,
        /// The call arguments.
        arguments: Vec<Expression>,
        /// An optional lambda.
        lambda: Option<Lambda>,
        /// Source location.
        span: Span,
    },

    /// A selector: `x ? { a => 1, default => 2 }`.
    Selector {
        /// The expression being selected on.
        target: Box<Expression>,
        /// The selector cases in order.
        cases: Vec<SelectorCase>,
        /// Source location.
        span: Span,
    },

    /// An `if`/`elsif`/`else` expression.
    If(IfExpression),
    /// An `unless`/`else` expression.
    Unless(UnlessExpression),
    /// A `case` expression.
    Case(CaseExpression),

    /// A function call: `name(args)` or statement-style `name args`.
    FunctionCall {
        /// The function name.
        name: EcoString,
        /// The function name's location.
        name_span: Span,
        /// The call arguments.
        arguments: Vec<Expression>,
        /// An optional lambda.
        lambda: Option<Lambda>,
        /// Whether this was a parenthesis-free statement call.
        is_statement: bool,
        /// Source location.
        span: Span,
    },

    /// A resource declaration: `file { '/x': ensure => present }`.
    Resource(ResourceExpression),
    /// Resource defaults: `File { mode => '0644' }`.
    ResourceDefaults(ResourceDefaultsExpression),
    /// A resource override: `File['/x'] { mode => '0644' }`.
    ResourceOverride(ResourceOverrideExpression),
    /// A class definition.
    ClassDefinition(Rc<ClassDefinitionExpression>),
    /// A defined type definition.
    DefinedType(Rc<DefinedTypeExpression>),
    /// A node definition.
    NodeDefinition(Rc<NodeDefinitionExpression>),
    /// A collector: `Type <| query |>` or `Type <<| query |>>`.
    Collection(CollectionExpression),

    /// A placeholder produced during parser error recovery.
    Error(Span),
}

impl Expression {
    /// Returns the source span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Undef(span)
            | Self::Default(span)
            | Self::Boolean(_, span)
            | Self::Integer(_, span)
            | Self::Float(_, span)
            | Self::Regex(_, span)
            | Self::Variable(_, span)
            | Self::Name(_, span)
            | Self::BareWord(_, span)
            | Self::TypeName(_, span)
            | Self::Array(_, span)
            | Self::Hash(_, span)
            | Self::Unary { span, .. }
            | Self::Binary { span, .. }
            | Self::Access { span, .. }
            | Self::MethodCall { span, .. }
            | Self::Selector { span, .. }
            | Self::FunctionCall { span, .. }
            | Self::Error(span) => *span,
            Self::String(s) => s.span,
            Self::If(e) => e.span,
            Self::Unless(e) => e.span,
            Self::Case(e) => e.span,
            Self::Resource(e) => e.span,
            Self::ResourceDefaults(e) => e.span,
            Self::ResourceOverride(e) => e.span,
            Self::ClassDefinition(e) => e.span,
            Self::DefinedType(e) => e.span,
            Self::NodeDefinition(e) => e.span,
            Self::Collection(e) => e.span,
        }
    }

    /// Returns `true` if this is an error placeholder.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns `true` if evaluating this expression can have an effect.
    ///
    /// Top-level and non-final block expressions must be productive; a bare
    /// `1 + 1` in statement position is reported as an error.
    #[must_use]
    pub fn is_productive(&self) -> bool {
        match self {
            Self::Resource(_)
            | Self::ResourceDefaults(_)
            | Self::ResourceOverride(_)
            | Self::ClassDefinition(_)
            | Self::DefinedType(_)
            | Self::NodeDefinition(_)
            | Self::Collection(_)
            | Self::If(_)
            | Self::Unless(_)
            | Self::Case(_)
            | Self::FunctionCall { .. }
            | Self::MethodCall { .. }
            | Self::Error(_) => true,
            Self::Binary { op, left, right, .. } => {
                matches!(
                    op,
                    BinaryOperator::Assign
                        | BinaryOperator::Before
                        | BinaryOperator::Notify
                        | BinaryOperator::Require
                        | BinaryOperator::Subscribe
                ) || left.is_productive()
                    || right.is_productive()
            }
            Self::Unary { operand, .. } => operand.is_productive(),
            _ => false,
        }
    }
}

/// A string literal as a list of interpolation segments.
///
/// Single-quoted strings and quoted-tag heredocs have exactly one
/// [`StringSegment::Literal`] segment.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    /// The segments in order.
    pub segments: Vec<StringSegment>,
    /// Source location of the whole literal.
    pub span: Span,
}

impl StringLiteral {
    /// Creates a literal with a single raw segment.
    #[must_use]
    pub fn plain(text: impl Into<EcoString>, span: Span) -> Self {
        Self {
            segments: vec![StringSegment::Literal(text.into())],
            span,
        }
    }

    /// Returns the literal text if this string has no interpolation.
    #[must_use]
    pub fn as_literal(&self) -> Option<&EcoString> {
        match self.segments.as_slice() {
            [StringSegment::Literal(text)] => Some(text),
            _ => None,
        }
    }
}

/// One segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum StringSegment {
    /// Raw text (escapes already applied).
    Literal(EcoString),
    /// A `$name` or `${name}` variable reference.
    Variable(EcoString, Span),
    /// A `${expr}` interpolated expression.
    Expression(Box<Expression>),
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation: `-x`.
    Negate,
    /// Logical not: `!x`.
    Not,
    /// Splat unfolding: `*x`.
    Splat,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::Not => write!(f, "!"),
            Self::Splat => write!(f, "*"),
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `in`
    In,
    /// `=~`
    Match,
    /// `!~`
    NotMatch,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessEquals,
    /// `and`
    And,
    /// `or`
    Or,
    /// `=`
    Assign,
    /// `->` (a `before` edge)
    Before,
    /// `~>` (a `notify` edge)
    Notify,
    /// `<-` (a `require` edge)
    Require,
    /// `<~` (a `subscribe` edge)
    Subscribe,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::In => "in",
            Self::Match => "=~",
            Self::NotMatch => "!~",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterEquals => ">=",
            Self::LessThan => "<",
            Self::LessEquals => "<=",
            Self::And => "and",
            Self::Or => "or",
            Self::Assign => "=",
            Self::Before => "->",
            Self::Notify => "~>",
            Self::Require => "<-",
            Self::Subscribe => "<~",
        };
        write!(f, "{text}")
    }
}

/// A lambda: `|$a, Integer $b = 1| { … }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// The typed parameters.
    pub parameters: Vec<Parameter>,
    /// The body expressions.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// A parameter of a lambda, class, or defined type.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// An optional type expression (e.g. `Integer[0]`).
    pub type_expr: Option<Expression>,
    /// Whether this parameter captures the remaining arguments (`*$rest`).
    pub captures: bool,
    /// The parameter name (without the sigil).
    pub name: EcoString,
    /// An optional default value.
    pub default: Option<Expression>,
    /// Source location.
    pub span: Span,
}

/// An `if` expression with optional `elsif` chains and `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    /// The condition.
    pub condition: Box<Expression>,
    /// The body when the condition is truthy.
    pub body: Vec<Expression>,
    /// `elsif` branches in order.
    pub elsifs: Vec<ElsifBranch>,
    /// The `else` body, if present.
    pub else_body: Option<Vec<Expression>>,
    /// Source location.
    pub span: Span,
}

/// One `elsif` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct ElsifBranch {
    /// The branch condition.
    pub condition: Expression,
    /// The branch body.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// An `unless` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlessExpression {
    /// The condition.
    pub condition: Box<Expression>,
    /// The body when the condition is falsy.
    pub body: Vec<Expression>,
    /// The `else` body, if present.
    pub else_body: Option<Vec<Expression>>,
    /// Source location.
    pub span: Span,
}

/// A `case` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpression {
    /// The expression being matched.
    pub expression: Box<Expression>,
    /// The propositions in order.
    pub propositions: Vec<CaseProposition>,
    /// Source location.
    pub span: Span,
}

/// One `case` proposition: `option, option: { body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseProposition {
    /// The options matched against the case expression.
    pub options: Vec<Expression>,
    /// The proposition body.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// One selector case: `option => result`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorCase {
    /// The option matched against the selector target.
    pub option: Expression,
    /// The result expression.
    pub result: Expression,
    /// Source location.
    pub span: Span,
}

/// The declaration status of a resource expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// A normal (realized) resource.
    Realized,
    /// A virtual resource: `@type { … }`.
    Virtual,
    /// An exported resource: `@@type { … }`.
    Exported,
}

/// A resource declaration expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceExpression {
    /// The resource type: a name, the `class` keyword (as a name), or a
    /// type reference.
    pub type_expr: Box<Expression>,
    /// The resource bodies, separated by `;` in source.
    pub bodies: Vec<ResourceBody>,
    /// The declaration status.
    pub status: ResourceStatus,
    /// Source location.
    pub span: Span,
}

/// One body of a resource declaration: `title: attr => value, …`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBody {
    /// The title expression.
    pub title: Expression,
    /// The attribute operations.
    pub operations: Vec<AttributeOperation>,
    /// Source location.
    pub span: Span,
}

/// An attribute operation: `name => value` or `name +> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeOperation {
    /// The attribute name.
    pub name: EcoString,
    /// The attribute name's location.
    pub name_span: Span,
    /// The operator.
    pub op: AttributeOperator,
    /// The value expression.
    pub value: Expression,
    /// Source location of the whole operation.
    pub span: Span,
}

/// An attribute operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    /// `=>`
    Assign,
    /// `+>`
    Append,
}

impl std::fmt::Display for AttributeOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assign => write!(f, "=>"),
            Self::Append => write!(f, "+>"),
        }
    }
}

/// Resource defaults: `File { mode => '0644' }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefaultsExpression {
    /// The type name the defaults apply to.
    pub type_name: EcoString,
    /// The type name's location.
    pub type_span: Span,
    /// The attribute operations.
    pub operations: Vec<AttributeOperation>,
    /// Source location.
    pub span: Span,
}

/// A resource override: `File['/x'] { mode => '0644' }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceOverrideExpression {
    /// The reference expression (a type access or variable access).
    pub reference: Box<Expression>,
    /// The attribute operations.
    pub operations: Vec<AttributeOperation>,
    /// Source location.
    pub span: Span,
}

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDefinitionExpression {
    /// The class name.
    pub name: EcoString,
    /// The class name's location.
    pub name_span: Span,
    /// The class parameters.
    pub parameters: Vec<Parameter>,
    /// The inherited parent class, if any.
    pub parent: Option<(EcoString, Span)>,
    /// The class body.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// A defined type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedTypeExpression {
    /// The defined type's name.
    pub name: EcoString,
    /// The name's location.
    pub name_span: Span,
    /// The parameters.
    pub parameters: Vec<Parameter>,
    /// The body.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// A node definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDefinitionExpression {
    /// The hostname patterns.
    pub hostnames: Vec<Hostname>,
    /// The body.
    pub body: Vec<Expression>,
    /// Source location.
    pub span: Span,
}

/// A hostname pattern in a node definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Hostname {
    /// The pattern kind.
    pub kind: HostnameKind,
    /// Source location.
    pub span: Span,
}

/// The kind of hostname pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum HostnameKind {
    /// A literal (possibly dotted) name: `web01.example.com`.
    Name(EcoString),
    /// A quoted string name.
    String(EcoString),
    /// A regex pattern.
    Regex(EcoString),
    /// The `default` node.
    Default,
}

/// A collector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionExpression {
    /// The resource type being collected.
    pub type_name: EcoString,
    /// The type name's location.
    pub type_span: Span,
    /// Whether this is an exported collector (`<<| |>>`).
    pub exported: bool,
    /// The attribute query, if any.
    pub query: Option<QueryExpression>,
    /// Source location.
    pub span: Span,
}

/// An attribute query inside a collector.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    /// An attribute test: `attr == value` or `attr != value`.
    Test {
        /// The attribute name (`title` matches the resource title).
        attribute: EcoString,
        /// The test operator.
        op: QueryOperator,
        /// The value expression.
        value: Box<Expression>,
        /// Source location.
        span: Span,
    },
    /// Two queries joined by `and` / `or`.
    Binary {
        /// The join operator.
        op: QueryJoin,
        /// The left query.
        left: Box<QueryExpression>,
        /// The right query.
        right: Box<QueryExpression>,
        /// Source location.
        span: Span,
    },
}

impl QueryExpression {
    /// Returns the source span of this query.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Test { span, .. } | Self::Binary { span, .. } => *span,
        }
    }
}

/// A query test operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
}

/// A query join operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryJoin {
    /// `and`
    And,
    /// `or`
    Or,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1)
    }

    #[test]
    fn productive_expressions() {
        assert!(Expression::FunctionCall {
            name: "notice".into(),
            name_span: span(),
            arguments: vec![],
            lambda: None,
            is_statement: true,
            span: span(),
        }
        .is_productive());

        assert!(Expression::Binary {
            op: BinaryOperator::Assign,
            left: Box::new(Expression::Variable("x".into(), span())),
            right: Box::new(Expression::Integer(1, span())),
            span: span(),
        }
        .is_productive());

        assert!(!Expression::Binary {
            op: BinaryOperator::Plus,
            left: Box::new(Expression::Integer(1, span())),
            right: Box::new(Expression::Integer(1, span())),
            span: span(),
        }
        .is_productive());

        assert!(!Expression::Integer(42, span()).is_productive());
    }

    #[test]
    fn string_literal_helpers() {
        let plain = StringLiteral::plain("hello", span());
        assert_eq!(plain.as_literal().map(EcoString::as_str), Some("hello"));

        let interpolated = StringLiteral {
            segments: vec![
                StringSegment::Literal("a".into()),
                StringSegment::Variable("x".into(), span()),
            ],
            span: span(),
        };
        assert!(interpolated.as_literal().is_none());
    }

    #[test]
    fn operator_display() {
        assert_eq!(BinaryOperator::Before.to_string(), "->");
        assert_eq!(BinaryOperator::Subscribe.to_string(), "<~");
        assert_eq!(UnaryOperator::Splat.to_string(), "*");
        assert_eq!(AttributeOperator::Append.to_string(), "+>");
    }
}
