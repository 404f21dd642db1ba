// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing: resource declarations, resource defaults and
//! overrides, `class`/`define`/`node` definitions, and parenthesis-free
//! statement calls.
//!
//! These constructs are statement-only; [`Parser::parse_statement`] tries
//! them before falling back to expression parsing, and a trailing `{` after
//! a name, type, or reference expression turns the statement into a
//! resource declaration, defaults, or override respectively.

use std::rc::Rc;

use crate::ast::{
    AttributeOperation, AttributeOperator, ClassDefinitionExpression, DefinedTypeExpression,
    Expression, Hostname, HostnameKind, NodeDefinitionExpression, Parameter, ResourceBody,
    ResourceExpression, ResourceStatus,
};
use crate::source_analysis::{Span, TokenKind};

use super::Parser;

impl Parser {
    /// Parses one statement.
    pub(super) fn parse_statement(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::KeywordClass => match self.peek_at(1) {
                // `class { 'name': … }` declares the class resource
                Some(TokenKind::LeftBrace) => {
                    let span = self.current_span();
                    self.advance();
                    let type_expr = Expression::Name("class".into(), span);
                    self.parse_resource_bodies(type_expr, ResourceStatus::Realized)
                }
                _ => self.parse_class_definition(),
            },
            TokenKind::KeywordDefine => self.parse_defined_type(),
            TokenKind::KeywordNode => self.parse_node_definition(),
            TokenKind::At | TokenKind::AtAt => self.parse_virtual_resource(),
            TokenKind::StatementCall(_) if !matches!(self.peek_at(1), Some(TokenKind::LeftParen)) =>
            {
                self.parse_statement_call()
            }
            _ => {
                let expr = self.parse_expression();
                if self.check(&TokenKind::LeftBrace) {
                    self.parse_braced_statement(expr)
                } else {
                    expr
                }
            }
        }
    }

    /// Dispatches `expr { … }` in statement position: a resource
    /// declaration, resource defaults, or a resource override.
    fn parse_braced_statement(&mut self, expr: Expression) -> Expression {
        match &expr {
            Expression::Name(..) => self.parse_resource_bodies(expr, ResourceStatus::Realized),
            Expression::TypeName(name, span) => {
                let (name, type_span) = (name.clone(), *span);
                let (operations, end) = self.parse_attribute_block();
                Expression::ResourceDefaults(crate::ast::ResourceDefaultsExpression {
                    type_name: name,
                    type_span,
                    operations,
                    span: type_span.merge(end),
                })
            }
            Expression::Access { .. } | Expression::Variable(..) => {
                let start = expr.span();
                let (operations, end) = self.parse_attribute_block();
                Expression::ResourceOverride(crate::ast::ResourceOverrideExpression {
                    reference: Box::new(expr),
                    operations,
                    span: start.merge(end),
                })
            }
            _ => {
                self.expected("a statement");
                Expression::Error(self.current_span())
            }
        }
    }

    /// Parses a virtual (`@`) or exported (`@@`) resource declaration.
    fn parse_virtual_resource(&mut self) -> Expression {
        let status = if matches!(self.current_kind(), TokenKind::AtAt) {
            ResourceStatus::Exported
        } else {
            ResourceStatus::Virtual
        };
        self.advance();

        let span = self.current_span();
        let type_expr = match self.current_kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                Expression::Name(name, span)
            }
            TokenKind::KeywordClass => {
                self.advance();
                Expression::Name("class".into(), span)
            }
            TokenKind::TypeName(name) => {
                self.advance();
                Expression::TypeName(name, span)
            }
            _ => {
                self.expected("a resource type");
                return Expression::Error(span);
            }
        };
        self.parse_resource_bodies(type_expr, status)
    }

    /// Parses resource bodies: `{ title: attr => value, …; title: … }`.
    /// The type expression is already parsed; the current token is `{`.
    fn parse_resource_bodies(&mut self, type_expr: Expression, status: ResourceStatus) -> Expression {
        let start = type_expr.span();
        self.expect(&TokenKind::LeftBrace);

        let mut bodies = Vec::new();
        loop {
            if self.is_at_end() || self.check(&TokenKind::RightBrace) {
                break;
            }
            let title = self.parse_expression();
            let body_start = title.span();
            self.expect(&TokenKind::Colon);
            let operations = self.parse_attribute_operations();
            let body_end = operations
                .last()
                .map_or_else(|| self.previous_span(), |op| op.span);
            bodies.push(ResourceBody {
                title,
                operations,
                span: body_start.merge(body_end),
            });
            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
        }

        let end = self.current_span();
        self.expect(&TokenKind::RightBrace);

        if bodies.is_empty() {
            self.diagnostics.push(super::Diagnostic::error(
                "expected at least one resource body",
                start.merge(end),
            ));
        }

        Expression::Resource(ResourceExpression {
            type_expr: Box::new(type_expr),
            bodies,
            status,
            span: start.merge(end),
        })
    }

    /// Parses a braced attribute operation block: `{ attr => value, … }`.
    /// Returns the operations and the closing brace's span.
    fn parse_attribute_block(&mut self) -> (Vec<AttributeOperation>, Span) {
        self.expect(&TokenKind::LeftBrace);
        let operations = self.parse_attribute_operations();
        let end = self.current_span();
        self.expect(&TokenKind::RightBrace);
        (operations, end)
    }

    /// Parses attribute operations until a `;` or `}` (not consumed).
    fn parse_attribute_operations(&mut self) -> Vec<AttributeOperation> {
        let mut operations = Vec::new();
        while !self.is_at_end()
            && !self.check(&TokenKind::RightBrace)
            && !self.check(&TokenKind::Semicolon)
        {
            let name_span = self.current_span();
            let Some(name) = self.attribute_name() else {
                self.expected("an attribute name");
                break;
            };

            let op = match self.current_kind() {
                TokenKind::FatArrow => {
                    self.advance();
                    AttributeOperator::Assign
                }
                TokenKind::PlusArrow => {
                    self.advance();
                    AttributeOperator::Append
                }
                _ => {
                    self.expected("`=>` or `+>`");
                    break;
                }
            };

            let value = self.parse_expression();
            let span = name_span.merge(value.span());
            operations.push(AttributeOperation {
                name,
                name_span,
                op,
                value,
                span,
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        operations
    }

    /// Consumes an attribute name: a name, statement call, bare word, or
    /// any keyword (attribute position un-reserves keywords).
    fn attribute_name(&mut self) -> Option<ecow::EcoString> {
        let name = match self.current_kind() {
            TokenKind::Name(name)
            | TokenKind::StatementCall(name)
            | TokenKind::BareWord(name) => name.clone(),
            kind => kind.keyword_text().map(ecow::EcoString::from)?,
        };
        self.advance();
        Some(name)
    }

    /// Parses a parenthesis-free statement call: `include apache, nginx`.
    fn parse_statement_call(&mut self) -> Expression {
        let name_span = self.current_span();
        let TokenKind::StatementCall(name) = self.current_kind().clone() else {
            unreachable!("caller checked for a statement call token");
        };
        self.advance();

        let mut arguments = vec![self.parse_expression()];
        while self.match_token(&TokenKind::Comma) {
            arguments.push(self.parse_expression());
        }
        let lambda = self.parse_optional_lambda();

        let end = lambda.as_ref().map_or_else(
            || arguments.last().map_or(name_span, Expression::span),
            |l| l.span,
        );
        Expression::FunctionCall {
            name,
            name_span,
            arguments,
            lambda,
            is_statement: true,
            span: name_span.merge(end),
        }
    }

    /// Parses a class definition (the `class` keyword is current).
    fn parse_class_definition(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // class

        let name_span = self.current_span();
        let name = match self.current_kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                name
            }
            _ => {
                self.expected("a class name");
                return Expression::Error(name_span);
            }
        };

        let parameters = self.parse_optional_parameters();

        let parent = if self.match_token(&TokenKind::KeywordInherits) {
            let parent_span = self.current_span();
            match self.current_kind().clone() {
                TokenKind::Name(parent) => {
                    self.advance();
                    Some((parent, parent_span))
                }
                _ => {
                    self.expected("a parent class name");
                    None
                }
            }
        } else {
            None
        };

        let (body, end) = self.parse_block();

        Expression::ClassDefinition(Rc::new(ClassDefinitionExpression {
            name,
            name_span,
            parameters,
            parent,
            body,
            span: start.merge(end),
        }))
    }

    /// Parses a defined type definition (the `define` keyword is current).
    fn parse_defined_type(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // define

        let name_span = self.current_span();
        let name = match self.current_kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                name
            }
            _ => {
                self.expected("a defined type name");
                return Expression::Error(name_span);
            }
        };

        let parameters = self.parse_optional_parameters();
        let (body, end) = self.parse_block();

        Expression::DefinedType(Rc::new(DefinedTypeExpression {
            name,
            name_span,
            parameters,
            body,
            span: start.merge(end),
        }))
    }

    /// Parses an optional parenthesised parameter list.
    fn parse_optional_parameters(&mut self) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if self.match_token(&TokenKind::LeftParen) {
            while !self.is_at_end() && !self.check(&TokenKind::RightParen) {
                match self.parse_parameter() {
                    Some(parameter) => parameters.push(parameter),
                    None => break,
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen);
        }
        parameters
    }

    /// Parses a node definition (the `node` keyword is current).
    fn parse_node_definition(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // node

        let mut hostnames = Vec::new();
        loop {
            let span = self.current_span();
            let kind = match self.current_kind().clone() {
                TokenKind::SingleQuotedString(text) => {
                    self.advance();
                    HostnameKind::String(text)
                }
                TokenKind::DoubleQuotedString(raw) => {
                    self.advance();
                    let literal = super::strings::double_quoted(self, &raw, span);
                    match literal.as_literal() {
                        Some(text) => HostnameKind::String(text.clone()),
                        None => {
                            self.diagnostics.push(super::Diagnostic::error(
                                "node names cannot be interpolated",
                                span,
                            ));
                            HostnameKind::String("".into())
                        }
                    }
                }
                TokenKind::Regex(pattern) => {
                    self.advance();
                    HostnameKind::Regex(pattern)
                }
                TokenKind::KeywordDefault => {
                    self.advance();
                    HostnameKind::Default
                }
                TokenKind::Name(_) | TokenKind::BareWord(_) | TokenKind::Number(_) => {
                    HostnameKind::Name(self.parse_dotted_name())
                }
                _ => {
                    self.expected("a node name");
                    return Expression::Error(span);
                }
            };
            let end = self.previous_span();
            hostnames.push(Hostname {
                kind,
                span: span.merge(end),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            // A trailing comma before the block is allowed
            if self.check(&TokenKind::LeftBrace) {
                break;
            }
        }

        let (body, end) = self.parse_block();

        Expression::NodeDefinition(Rc::new(NodeDefinitionExpression {
            hostnames,
            body,
            span: start.merge(end),
        }))
    }

    /// Parses a dotted node name: `web01.example.com`.
    fn parse_dotted_name(&mut self) -> ecow::EcoString {
        let mut name = String::new();
        loop {
            match self.current_kind().clone() {
                TokenKind::Name(part) | TokenKind::BareWord(part) | TokenKind::Number(part) => {
                    self.advance();
                    name.push_str(&part);
                }
                _ => {
                    self.expected("a node name segment");
                    break;
                }
            }
            if self.check(&TokenKind::Dot) {
                self.advance();
                name.push('.');
            } else {
                break;
            }
        }
        name.into()
    }
}
