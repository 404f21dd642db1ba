// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing: Pratt binary climbing, unary and postfix operators,
//! control flow, function calls, and literals.

use crate::ast::{
    CaseExpression, CaseProposition, CollectionExpression, ElsifBranch, Expression, IfExpression,
    Lambda, Parameter, QueryExpression, QueryJoin, QueryOperator, SelectorCase, StringLiteral,
    UnaryOperator, UnlessExpression,
};
use crate::source_analysis::{Span, TokenKind};

use super::{Parser, binary_binding_power, strings};

impl Parser {
    /// Parses an expression.
    pub(super) fn parse_expression(&mut self) -> Expression {
        self.parse_binary(0)
    }

    /// Parses a binary expression with Pratt binding powers.
    fn parse_binary(&mut self, min_power: u8) -> Expression {
        let mut left = self.parse_unary();

        while let Some((op, power)) = binary_binding_power(self.current_kind()) {
            if power.left < min_power {
                break;
            }
            self.advance();
            let right = self.parse_binary(power.right);
            let span = left.span().merge(right.span());
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        left
    }

    /// Parses a unary expression: `-x`, `!x`, `*x`, or a postfix expression.
    fn parse_unary(&mut self) -> Expression {
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnaryOperator::Negate),
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Star => Some(UnaryOperator::Splat),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary();
            let span = start.merge(operand.span());
            return Expression::Unary {
                op,
                operand: Box::new(operand),
                span,
            };
        }

        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    /// Parses postfix operations: `[…]` access, `.name(…)` method calls,
    /// and `? { … }` selectors.
    pub(super) fn parse_postfix(&mut self, mut expr: Expression) -> Expression {
        loop {
            match self.current_kind() {
                TokenKind::LeftBracket => {
                    self.advance();
                    let arguments = self.parse_expression_list(&TokenKind::RightBracket);
                    let end = self.current_span();
                    self.expect(&TokenKind::RightBracket);
                    let span = expr.span().merge(end);
                    expr = Expression::Access {
                        target: Box::new(expr),
                        arguments,
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let (name, name_span) = match self.current_kind().clone() {
                        TokenKind::Name(name) | TokenKind::StatementCall(name) => {
                            let span = self.current_span();
                            self.advance();
                            (name, span)
                        }
                        _ => {
                            self.expected("a method name");
                            return Expression::Error(self.current_span());
                        }
                    };
                    let mut arguments = Vec::new();
                    if self.match_token(&TokenKind::LeftParen) {
                        arguments = self.parse_expression_list(&TokenKind::RightParen);
                        self.expect(&TokenKind::RightParen);
                    }
                    let lambda = self.parse_optional_lambda();
                    let end = lambda
                        .as_ref()
                        .map_or_else(|| self.previous_span(), |l| l.span);
                    let span = expr.span().merge(end);
                    expr = Expression::MethodCall {
                        target: Box::new(expr),
                        name,
                        name_span,
                        arguments,
                        lambda,
                        span,
                    };
                }
                TokenKind::Question => {
                    self.advance();
                    expr = self.parse_selector(expr);
                }
                _ => break,
            }
        }
        expr
    }

    /// Parses the case list of a selector: `expr ? { option => result, … }`.
    fn parse_selector(&mut self, target: Expression) -> Expression {
        self.expect(&TokenKind::LeftBrace);
        let mut cases = Vec::new();
        while !self.is_at_end() && !self.check(&TokenKind::RightBrace) {
            let option = self.parse_expression();
            self.expect(&TokenKind::FatArrow);
            let result = self.parse_expression();
            let span = option.span().merge(result.span());
            cases.push(SelectorCase {
                option,
                result,
                span,
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.current_span();
        self.expect(&TokenKind::RightBrace);
        let span = target.span().merge(end);
        Expression::Selector {
            target: Box::new(target),
            cases,
            span,
        }
    }

    /// Parses a primary expression.
    #[allow(clippy::too_many_lines)]
    fn parse_primary(&mut self) -> Expression {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::KeywordUndef => {
                self.advance();
                Expression::Undef(span)
            }
            TokenKind::KeywordDefault => {
                self.advance();
                Expression::Default(span)
            }
            TokenKind::KeywordTrue => {
                self.advance();
                Expression::Boolean(true, span)
            }
            TokenKind::KeywordFalse => {
                self.advance();
                Expression::Boolean(false, span)
            }
            TokenKind::Number(text) => {
                self.advance();
                self.parse_number(&text, span)
            }
            TokenKind::SingleQuotedString(text) => {
                self.advance();
                Expression::String(StringLiteral::plain(text, span))
            }
            TokenKind::DoubleQuotedString(raw) => {
                self.advance();
                Expression::String(strings::double_quoted(self, &raw, span))
            }
            TokenKind::Heredoc(heredoc) => {
                self.advance();
                Expression::String(strings::heredoc(self, &heredoc, span))
            }
            TokenKind::Regex(pattern) => {
                self.advance();
                Expression::Regex(pattern, span)
            }
            TokenKind::Variable(name) => {
                self.advance();
                Expression::Variable(name, span)
            }
            TokenKind::Name(name) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    self.parse_function_call(name, span)
                } else {
                    Expression::Name(name, span)
                }
            }
            TokenKind::StatementCall(name) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    self.parse_function_call(name, span)
                } else {
                    Expression::Name(name, span)
                }
            }
            TokenKind::BareWord(word) => {
                self.advance();
                Expression::BareWord(word, span)
            }
            TokenKind::TypeName(name) => {
                self.advance();
                if matches!(
                    self.current_kind(),
                    TokenKind::LeftCollect | TokenKind::LeftDoubleCollect
                ) {
                    self.parse_collection(name, span)
                } else {
                    Expression::TypeName(name, span)
                }
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements = self.parse_expression_list(&TokenKind::RightBracket);
                let end = self.current_span();
                self.expect(&TokenKind::RightBracket);
                Expression::Array(elements, span.merge(end))
            }
            TokenKind::LeftBrace => {
                self.advance();
                let mut pairs = Vec::new();
                while !self.is_at_end() && !self.check(&TokenKind::RightBrace) {
                    let key = self.parse_expression();
                    self.expect(&TokenKind::FatArrow);
                    let value = self.parse_expression();
                    pairs.push((key, value));
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                let end = self.current_span();
                self.expect(&TokenKind::RightBrace);
                Expression::Hash(pairs, span.merge(end))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(&TokenKind::RightParen);
                expr
            }
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordUnless => self.parse_unless(),
            TokenKind::KeywordCase => self.parse_case(),
            _ => {
                self.expected("an expression");
                self.advance();
                Expression::Error(span)
            }
        }
    }

    /// Returns the span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        if self.current == 0 {
            self.current_span()
        } else {
            self.tokens[self.current - 1].span()
        }
    }

    /// Parses a numeric literal's text into an integer or float expression.
    fn parse_number(&mut self, text: &str, span: Span) -> Expression {
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return match i64::from_str_radix(hex, 16) {
                Ok(value) => Expression::Integer(value, span),
                Err(_) => self.number_error(text, span),
            };
        }
        if text.contains(['.', 'e', 'E']) {
            return match text.parse::<f64>() {
                Ok(value) => Expression::Float(value, span),
                Err(_) => self.number_error(text, span),
            };
        }
        if text.len() > 1 && text.starts_with('0') {
            return match i64::from_str_radix(&text[1..], 8) {
                Ok(value) => Expression::Integer(value, span),
                Err(_) => self.number_error(text, span),
            };
        }
        match text.parse::<i64>() {
            Ok(value) => Expression::Integer(value, span),
            Err(_) => self.number_error(text, span),
        }
    }

    fn number_error(&mut self, text: &str, span: Span) -> Expression {
        self.diagnostics.push(super::Diagnostic::error(
            ecow::eco_format!("malformed number '{text}'"),
            span,
        ));
        Expression::Error(span)
    }

    /// Parses a comma-separated expression list terminated by `closer`
    /// (which is not consumed). Allows a trailing comma.
    pub(super) fn parse_expression_list(&mut self, closer: &TokenKind) -> Vec<Expression> {
        let mut expressions = Vec::new();
        while !self.is_at_end() && !self.check(closer) {
            expressions.push(self.parse_expression());
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        expressions
    }

    /// Parses a parenthesised function call (the name is already consumed).
    pub(super) fn parse_function_call(&mut self, name: ecow::EcoString, span: Span) -> Expression {
        self.expect(&TokenKind::LeftParen);
        let arguments = self.parse_expression_list(&TokenKind::RightParen);
        self.expect(&TokenKind::RightParen);
        let lambda = self.parse_optional_lambda();
        let end = lambda
            .as_ref()
            .map_or_else(|| self.previous_span(), |l| l.span);
        Expression::FunctionCall {
            name,
            name_span: span,
            arguments,
            lambda,
            is_statement: false,
            span: span.merge(end),
        }
    }

    /// Parses a lambda if one begins at the current token: `|params| { … }`.
    pub(super) fn parse_optional_lambda(&mut self) -> Option<Lambda> {
        if !self.check(&TokenKind::Pipe) {
            return None;
        }
        let start = self.current_span();
        self.advance();
        let mut parameters = Vec::new();
        while !self.is_at_end() && !self.check(&TokenKind::Pipe) {
            parameters.push(self.parse_parameter()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Pipe);
        let (body, end) = self.parse_block();
        Some(Lambda {
            parameters,
            body,
            span: start.merge(end),
        })
    }

    /// Parses one typed parameter: `Type $name = default` or `*$rest`.
    pub(super) fn parse_parameter(&mut self) -> Option<Parameter> {
        let start = self.current_span();

        let type_expr = if matches!(self.current_kind(), TokenKind::TypeName(_)) {
            let span = self.current_span();
            let TokenKind::TypeName(name) = self.current_kind().clone() else {
                unreachable!()
            };
            self.advance();
            Some(self.parse_postfix(Expression::TypeName(name, span)))
        } else {
            None
        };

        let captures = self.match_token(&TokenKind::Star);

        let TokenKind::Variable(name) = self.current_kind().clone() else {
            self.expected("a parameter variable");
            return None;
        };
        self.advance();

        let default = if self.match_token(&TokenKind::Equals) {
            Some(self.parse_expression())
        } else {
            None
        };

        let end = default
            .as_ref()
            .map_or_else(|| self.previous_span(), Expression::span);
        Some(Parameter {
            type_expr,
            captures,
            name,
            default,
            span: start.merge(end),
        })
    }

    /// Parses a braced statement block, returning the body and the span of
    /// the closing brace.
    pub(super) fn parse_block(&mut self) -> (Vec<Expression>, Span) {
        self.expect(&TokenKind::LeftBrace);
        let mut body = Vec::new();
        while !self.is_at_end() && !self.check(&TokenKind::RightBrace) {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let statement = self.parse_statement();
            let is_error = statement.is_error();
            body.push(statement);
            if is_error {
                break;
            }
        }
        let end = self.current_span();
        self.expect(&TokenKind::RightBrace);
        (body, end)
    }

    /// Parses an `if` expression (the `if` keyword is current).
    fn parse_if(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // if
        let condition = self.parse_expression();
        let (body, mut end) = self.parse_block();

        let mut elsifs = Vec::new();
        while self.check(&TokenKind::KeywordElsif) {
            let elsif_start = self.current_span();
            self.advance();
            let elsif_condition = self.parse_expression();
            let (elsif_body, elsif_end) = self.parse_block();
            end = elsif_end;
            elsifs.push(ElsifBranch {
                condition: elsif_condition,
                body: elsif_body,
                span: elsif_start.merge(elsif_end),
            });
        }

        let else_body = if self.match_token(&TokenKind::KeywordElse) {
            let (body, else_end) = self.parse_block();
            end = else_end;
            Some(body)
        } else {
            None
        };

        Expression::If(IfExpression {
            condition: Box::new(condition),
            body,
            elsifs,
            else_body,
            span: start.merge(end),
        })
    }

    /// Parses an `unless` expression (the `unless` keyword is current).
    fn parse_unless(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // unless
        let condition = self.parse_expression();
        let (body, mut end) = self.parse_block();

        let else_body = if self.match_token(&TokenKind::KeywordElse) {
            let (body, else_end) = self.parse_block();
            end = else_end;
            Some(body)
        } else {
            None
        };

        Expression::Unless(UnlessExpression {
            condition: Box::new(condition),
            body,
            else_body,
            span: start.merge(end),
        })
    }

    /// Parses a `case` expression (the `case` keyword is current).
    fn parse_case(&mut self) -> Expression {
        let start = self.current_span();
        self.advance(); // case
        let expression = self.parse_expression();
        self.expect(&TokenKind::LeftBrace);

        let mut propositions = Vec::new();
        while !self.is_at_end() && !self.check(&TokenKind::RightBrace) {
            let proposition_start = self.current_span();
            let mut options = Vec::new();
            loop {
                options.push(self.parse_expression());
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Colon);
            let (body, body_end) = self.parse_block();
            propositions.push(CaseProposition {
                options,
                body,
                span: proposition_start.merge(body_end),
            });
        }

        let end = self.current_span();
        self.expect(&TokenKind::RightBrace);

        Expression::Case(CaseExpression {
            expression: Box::new(expression),
            propositions,
            span: start.merge(end),
        })
    }

    /// Parses a collector (the type name is already consumed; the current
    /// token is `<|` or `<<|`).
    fn parse_collection(&mut self, type_name: ecow::EcoString, type_span: Span) -> Expression {
        let exported = matches!(self.current_kind(), TokenKind::LeftDoubleCollect);
        self.advance();
        let closer = if exported {
            TokenKind::RightDoubleCollect
        } else {
            TokenKind::RightCollect
        };

        let query = if self.check(&closer) {
            None
        } else {
            Some(self.parse_query_or())
        };
        let end = self.current_span();
        self.expect(&closer);

        Expression::Collection(CollectionExpression {
            type_name,
            type_span,
            exported,
            query,
            span: type_span.merge(end),
        })
    }

    /// Parses an `or`-joined attribute query.
    fn parse_query_or(&mut self) -> QueryExpression {
        let mut left = self.parse_query_and();
        while self.match_token(&TokenKind::KeywordOr) {
            let right = self.parse_query_and();
            let span = left.span().merge(right.span());
            left = QueryExpression::Binary {
                op: QueryJoin::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    /// Parses an `and`-joined attribute query.
    fn parse_query_and(&mut self) -> QueryExpression {
        let mut left = self.parse_query_test();
        while self.match_token(&TokenKind::KeywordAnd) {
            let right = self.parse_query_test();
            let span = left.span().merge(right.span());
            left = QueryExpression::Binary {
                op: QueryJoin::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        left
    }

    /// Parses one attribute test: `attribute == value` or `attribute != value`.
    fn parse_query_test(&mut self) -> QueryExpression {
        let start = self.current_span();
        let attribute = match self.current_kind().clone() {
            TokenKind::Name(name) | TokenKind::StatementCall(name) => {
                self.advance();
                name
            }
            _ => {
                self.expected("an attribute name");
                return QueryExpression::Test {
                    attribute: "".into(),
                    op: QueryOperator::Equals,
                    value: Box::new(Expression::Error(start)),
                    span: start,
                };
            }
        };

        let op = match self.current_kind() {
            TokenKind::EqualsEquals => {
                self.advance();
                QueryOperator::Equals
            }
            TokenKind::NotEquals => {
                self.advance();
                QueryOperator::NotEquals
            }
            _ => {
                self.expected("`==` or `!=`");
                QueryOperator::Equals
            }
        };

        let value = self.parse_query_value();
        let span = start.merge(value.span());
        QueryExpression::Test {
            attribute,
            op,
            value: Box::new(value),
            span,
        }
    }

    /// Parses a query value: a variable, string, boolean, number, or name.
    fn parse_query_value(&mut self) -> Expression {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Variable(name) => {
                self.advance();
                Expression::Variable(name, span)
            }
            TokenKind::SingleQuotedString(text) => {
                self.advance();
                Expression::String(StringLiteral::plain(text, span))
            }
            TokenKind::DoubleQuotedString(raw) => {
                self.advance();
                Expression::String(strings::double_quoted(self, &raw, span))
            }
            TokenKind::KeywordTrue => {
                self.advance();
                Expression::Boolean(true, span)
            }
            TokenKind::KeywordFalse => {
                self.advance();
                Expression::Boolean(false, span)
            }
            TokenKind::Number(text) => {
                self.advance();
                self.parse_number(&text, span)
            }
            TokenKind::Name(name) | TokenKind::BareWord(name) => {
                self.advance();
                Expression::Name(name, span)
            }
            _ => {
                self.expected("a query value");
                self.advance();
                Expression::Error(span)
            }
        }
    }
}
