// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendering an AST back to canonical source text.
//!
//! The renderer is a right-inverse of the parser up to whitespace and
//! comment equivalence: `parse(render(parse(text)))` produces the same tree
//! shape (and therefore the same rendering) as `parse(text)`. Operator
//! precedence is re-established with explicit parentheses where a child
//! binds looser than its parent, so no grouping information is lost even
//! though the AST has no parenthesis nodes.

use std::fmt::Write as _;

use crate::ast::{
    AttributeOperation, BinaryOperator, CaseExpression, CollectionExpression, Expression,
    HostnameKind, IfExpression, Lambda, Manifest, Parameter, QueryExpression, QueryJoin,
    QueryOperator, ResourceStatus, StringLiteral, StringSegment, UnlessExpression,
};

/// Renders a manifest to canonical source text.
#[must_use]
pub fn render(manifest: &Manifest) -> String {
    let mut renderer = Renderer::new();
    for statement in &manifest.body {
        renderer.statement(statement);
    }
    renderer.out
}

/// Renders a single expression to canonical source text.
#[must_use]
pub fn render_expression(expression: &Expression) -> String {
    let mut renderer = Renderer::new();
    renderer.expression(expression, 0);
    renderer.out
}

/// Binding strength used to decide where parentheses are required; mirrors
/// the parser's climb table.
fn precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Before
        | BinaryOperator::Notify
        | BinaryOperator::Require
        | BinaryOperator::Subscribe => 2,
        BinaryOperator::Assign => 4,
        BinaryOperator::Or => 6,
        BinaryOperator::And => 8,
        BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessEquals => 10,
        BinaryOperator::Equals | BinaryOperator::NotEquals => 12,
        BinaryOperator::LeftShift | BinaryOperator::RightShift => 14,
        BinaryOperator::Plus | BinaryOperator::Minus => 16,
        BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 18,
        BinaryOperator::Match | BinaryOperator::NotMatch => 20,
        BinaryOperator::In => 22,
    }
}

/// Precedence of unary operators (tighter than any binary operator).
const UNARY_PRECEDENCE: u8 = 24;

struct Renderer {
    out: String,
    indent: usize,
}

impl Renderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn statement(&mut self, expression: &Expression) {
        self.write_indent();
        self.expression(expression, 0);
        self.out.push('\n');
    }

    fn block(&mut self, body: &[Expression]) {
        self.out.push_str("{\n");
        self.indent += 1;
        for statement in body {
            self.statement(statement);
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    #[allow(clippy::too_many_lines)]
    fn expression(&mut self, expression: &Expression, min_precedence: u8) {
        match expression {
            Expression::Undef(_) => self.out.push_str("undef"),
            Expression::Default(_) => self.out.push_str("default"),
            Expression::Boolean(value, _) => {
                let _ = write!(self.out, "{value}");
            }
            Expression::Integer(value, _) => {
                let _ = write!(self.out, "{value}");
            }
            Expression::Float(value, _) => {
                if value.fract() == 0.0 && value.is_finite() {
                    let _ = write!(self.out, "{value:.1}");
                } else {
                    let _ = write!(self.out, "{value}");
                }
            }
            Expression::String(literal) => self.string_literal(literal),
            Expression::Regex(pattern, _) => {
                let _ = write!(self.out, "/{}/", pattern.replace("/", "\\/"));
            }
            Expression::Variable(name, _) => {
                let _ = write!(self.out, "${name}");
            }
            Expression::Name(name, _)
            | Expression::BareWord(name, _)
            | Expression::TypeName(name, _) => self.out.push_str(name),
            Expression::Array(elements, _) => {
                self.out.push('[');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expression(element, 0);
                }
                self.out.push(']');
            }
            Expression::Hash(pairs, _) => {
                self.out.push('{');
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.out.push(' ');
                    self.expression(key, 0);
                    self.out.push_str(" => ");
                    self.expression(value, 0);
                }
                self.out.push_str(" }");
            }
            Expression::Unary { op, operand, .. } => {
                let _ = write!(self.out, "{op}");
                self.expression(operand, UNARY_PRECEDENCE);
            }
            Expression::Binary {
                op, left, right, ..
            } => {
                let my_precedence = precedence(*op);
                let parens = my_precedence < min_precedence;
                if parens {
                    self.out.push('(');
                }
                // Left-associative operators need parens around an
                // equal-precedence right child; assignment is the reverse.
                let (left_min, right_min) = if matches!(op, BinaryOperator::Assign) {
                    (my_precedence + 1, my_precedence)
                } else {
                    (my_precedence, my_precedence + 1)
                };
                self.expression(left, left_min);
                let _ = write!(self.out, " {op} ");
                self.expression(right, right_min);
                if parens {
                    self.out.push(')');
                }
            }
            Expression::Access {
                target, arguments, ..
            } => {
                self.expression(target, UNARY_PRECEDENCE);
                self.out.push('[');
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expression(argument, 0);
                }
                self.out.push(']');
            }
            Expression::MethodCall {
                target,
                name,
                arguments,
                lambda,
                ..
            } => {
                self.expression(target, UNARY_PRECEDENCE);
                let _ = write!(self.out, ".{name}");
                if !arguments.is_empty() {
                    self.out.push('(');
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.expression(argument, 0);
                    }
                    self.out.push(')');
                }
                if let Some(lambda) = lambda {
                    self.out.push(' ');
                    self.lambda(lambda);
                }
            }
            Expression::Selector { target, cases, .. } => {
                self.expression(target, UNARY_PRECEDENCE);
                self.out.push_str(" ? {\n");
                self.indent += 1;
                for case in cases {
                    self.write_indent();
                    self.expression(&case.option, 0);
                    self.out.push_str(" => ");
                    self.expression(&case.result, 0);
                    self.out.push_str(",\n");
                }
                self.indent -= 1;
                self.write_indent();
                self.out.push('}');
            }
            Expression::If(expression) => self.if_expression(expression),
            Expression::Unless(expression) => self.unless_expression(expression),
            Expression::Case(expression) => self.case_expression(expression),
            Expression::FunctionCall {
                name,
                arguments,
                lambda,
                is_statement,
                ..
            } => {
                self.out.push_str(name);
                if *is_statement {
                    for (i, argument) in arguments.iter().enumerate() {
                        self.out.push_str(if i == 0 { " " } else { ", " });
                        self.expression(argument, 0);
                    }
                } else {
                    self.out.push('(');
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.expression(argument, 0);
                    }
                    self.out.push(')');
                }
                if let Some(lambda) = lambda {
                    self.out.push(' ');
                    self.lambda(lambda);
                }
            }
            Expression::Resource(resource) => {
                match resource.status {
                    ResourceStatus::Realized => {}
                    ResourceStatus::Virtual => self.out.push('@'),
                    ResourceStatus::Exported => self.out.push_str("@@"),
                }
                self.expression(&resource.type_expr, 0);
                self.out.push_str(" {\n");
                self.indent += 1;
                for (i, body) in resource.bodies.iter().enumerate() {
                    if i > 0 {
                        self.out.push('\n');
                    }
                    self.write_indent();
                    self.expression(&body.title, 0);
                    self.out.push(':');
                    self.attribute_operations(&body.operations);
                    if i + 1 < resource.bodies.len() {
                        self.write_indent();
                        self.out.push_str(";\n");
                    }
                }
                self.indent -= 1;
                self.write_indent();
                self.out.push('}');
            }
            Expression::ResourceDefaults(defaults) => {
                self.out.push_str(&defaults.type_name);
                self.out.push_str(" {");
                self.attribute_operations(&defaults.operations);
                self.write_indent();
                self.out.push('}');
            }
            Expression::ResourceOverride(over) => {
                self.expression(&over.reference, 0);
                self.out.push_str(" {");
                self.attribute_operations(&over.operations);
                self.write_indent();
                self.out.push('}');
            }
            Expression::ClassDefinition(class) => {
                let _ = write!(self.out, "class {}", class.name);
                self.parameters(&class.parameters);
                if let Some((parent, _)) = &class.parent {
                    let _ = write!(self.out, " inherits {parent}");
                }
                self.out.push(' ');
                self.block(&class.body);
            }
            Expression::DefinedType(defined) => {
                let _ = write!(self.out, "define {}", defined.name);
                self.parameters(&defined.parameters);
                self.out.push(' ');
                self.block(&defined.body);
            }
            Expression::NodeDefinition(node) => {
                self.out.push_str("node ");
                for (i, hostname) in node.hostnames.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match &hostname.kind {
                        HostnameKind::Name(name) => self.out.push_str(name),
                        HostnameKind::String(text) => {
                            let _ = write!(self.out, "'{}'", escape_single_quoted(text));
                        }
                        HostnameKind::Regex(pattern) => {
                            let _ = write!(self.out, "/{}/", pattern.replace("/", "\\/"));
                        }
                        HostnameKind::Default => self.out.push_str("default"),
                    }
                }
                self.out.push(' ');
                self.block(&node.body);
            }
            Expression::Collection(collection) => self.collection(collection),
            Expression::Error(_) => self.out.push_str("<error>"),
        }
    }

    fn string_literal(&mut self, literal: &StringLiteral) {
        if let Some(text) = literal.as_literal() {
            let _ = write!(self.out, "'{}'", escape_single_quoted(text));
            return;
        }
        self.out.push('"');
        for segment in &literal.segments {
            match segment {
                StringSegment::Literal(text) => {
                    self.out.push_str(&escape_double_quoted(text));
                }
                StringSegment::Variable(name, _) => {
                    let _ = write!(self.out, "${{{name}}}");
                }
                StringSegment::Expression(expression) => {
                    self.out.push_str("${");
                    self.expression(expression, 0);
                    self.out.push('}');
                }
            }
        }
        self.out.push('"');
    }

    fn attribute_operations(&mut self, operations: &[AttributeOperation]) {
        self.out.push('\n');
        self.indent += 1;
        for operation in operations {
            self.write_indent();
            let _ = write!(self.out, "{} {} ", operation.name, operation.op);
            self.expression(&operation.value, 0);
            self.out.push_str(",\n");
        }
        self.indent -= 1;
    }

    fn parameters(&mut self, parameters: &[Parameter]) {
        if parameters.is_empty() {
            return;
        }
        self.out.push('(');
        for (i, parameter) in parameters.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if let Some(type_expr) = &parameter.type_expr {
                self.expression(type_expr, 0);
                self.out.push(' ');
            }
            if parameter.captures {
                self.out.push('*');
            }
            let _ = write!(self.out, "${}", parameter.name);
            if let Some(default) = &parameter.default {
                self.out.push_str(" = ");
                self.expression(default, 0);
            }
        }
        self.out.push(')');
    }

    fn lambda(&mut self, lambda: &Lambda) {
        self.out.push('|');
        for (i, parameter) in lambda.parameters.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if let Some(type_expr) = &parameter.type_expr {
                self.expression(type_expr, 0);
                self.out.push(' ');
            }
            if parameter.captures {
                self.out.push('*');
            }
            let _ = write!(self.out, "${}", parameter.name);
            if let Some(default) = &parameter.default {
                self.out.push_str(" = ");
                self.expression(default, 0);
            }
        }
        self.out.push_str("| ");
        self.block(&lambda.body);
    }

    fn if_expression(&mut self, expression: &IfExpression) {
        self.out.push_str("if ");
        self.expression(&expression.condition, 0);
        self.out.push(' ');
        self.block(&expression.body);
        for elsif in &expression.elsifs {
            self.out.push_str(" elsif ");
            self.expression(&elsif.condition, 0);
            self.out.push(' ');
            self.block(&elsif.body);
        }
        if let Some(else_body) = &expression.else_body {
            self.out.push_str(" else ");
            self.block(else_body);
        }
    }

    fn unless_expression(&mut self, expression: &UnlessExpression) {
        self.out.push_str("unless ");
        self.expression(&expression.condition, 0);
        self.out.push(' ');
        self.block(&expression.body);
        if let Some(else_body) = &expression.else_body {
            self.out.push_str(" else ");
            self.block(else_body);
        }
    }

    fn case_expression(&mut self, expression: &CaseExpression) {
        self.out.push_str("case ");
        self.expression(&expression.expression, 0);
        self.out.push_str(" {\n");
        self.indent += 1;
        for proposition in &expression.propositions {
            self.write_indent();
            for (i, option) in proposition.options.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.expression(option, 0);
            }
            self.out.push_str(": ");
            self.block(&proposition.body);
            self.out.push('\n');
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn collection(&mut self, collection: &CollectionExpression) {
        self.out.push_str(&collection.type_name);
        self.out
            .push_str(if collection.exported { " <<|" } else { " <|" });
        if let Some(query) = &collection.query {
            self.out.push(' ');
            self.query(query);
        }
        self.out
            .push_str(if collection.exported { " |>>" } else { " |>" });
    }

    fn query(&mut self, query: &QueryExpression) {
        match query {
            QueryExpression::Test {
                attribute,
                op,
                value,
                ..
            } => {
                self.out.push_str(attribute);
                self.out.push_str(match op {
                    QueryOperator::Equals => " == ",
                    QueryOperator::NotEquals => " != ",
                });
                self.expression(value, 0);
            }
            QueryExpression::Binary {
                op, left, right, ..
            } => {
                self.query(left);
                self.out.push_str(match op {
                    QueryJoin::And => " and ",
                    QueryJoin::Or => " or ",
                });
                self.query(right);
            }
        }
    }
}

fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse_source;

    /// P1: rendering reaches a fixpoint after one round trip.
    #[track_caller]
    fn assert_round_trip(source: &str) {
        let (manifest, diagnostics) = parse_source(source);
        assert!(
            diagnostics.is_empty(),
            "diagnostics for {source:?}: {diagnostics:?}"
        );
        let rendered = render(&manifest);
        let (reparsed, rediagnostics) = parse_source(&rendered);
        assert!(
            rediagnostics.is_empty(),
            "re-parse diagnostics for {rendered:?}: {rediagnostics:?}"
        );
        let rerendered = render(&reparsed);
        assert_eq!(rendered, rerendered, "render not a fixpoint for {source:?}");
    }

    #[test]
    fn round_trips_expressions() {
        assert_round_trip("$x = 1 + 2 * 3");
        assert_round_trip("$x = (1 + 2) * 3");
        assert_round_trip("$x = -1");
        assert_round_trip("$x = !true");
        assert_round_trip("$x = 1.5");
        assert_round_trip("$x = 1.0");
        assert_round_trip("$x = [1, 2, [3]]");
        assert_round_trip("$x = { 'a' => 1 }");
        assert_round_trip("$x = $y ? { 'a' => 1, default => 2 }");
        assert_round_trip("$x = 'it\\'s'");
        assert_round_trip("$x = \"a $y b\"");
        assert_round_trip("$x = /^a.b$/");
    }

    #[test]
    fn round_trips_statements() {
        assert_round_trip("file { '/tmp/x': ensure => present, mode => '0644' }");
        assert_round_trip("@user { 'bob': }");
        assert_round_trip("@@host { 'web': ip => '10.0.0.1' }");
        assert_round_trip("File { mode => '0644' }");
        assert_round_trip("File['/tmp/x'] { mode => '0644' }");
        assert_round_trip("class a inherits b { notice('hi') }");
        assert_round_trip("class a($x = 1, String $y = 'z') { }");
        assert_round_trip("define t($msg) { notice($msg) }");
        assert_round_trip("node 'web', /^db/, default { }");
        assert_round_trip("include apache");
        assert_round_trip("User <| title == 'bob' and group != 'wheel' |>");
        assert_round_trip("Sshkey <<| |>>");
        assert_round_trip("File['/a'] -> File['/b'] ~> Service['x']");
        assert_round_trip("if $x { notice('a') } elsif $y { notice('b') } else { notice('c') }");
        assert_round_trip("unless $x { notice('a') }");
        assert_round_trip("case $os { 'linux', 'bsd': { notice('u') } default: { } }");
        assert_round_trip("[1, 2, 3].filter |$v| { $v > 1 }");
        assert_round_trip("$parts = 'a,b,,c'.split(',')");
    }

    #[test]
    fn parenthesizes_looser_children() {
        let (manifest, _) = parse_source("$x = (1 + 2) * 3");
        let rendered = render(&manifest);
        assert!(rendered.contains("(1 + 2) * 3"), "rendered: {rendered}");
    }

    #[test]
    fn renders_float_distinctly_from_integer() {
        let (manifest, _) = parse_source("$x = 1.0");
        assert!(render(&manifest).contains("1.0"));
    }
}
