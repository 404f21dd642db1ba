// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! String segmentation: escape processing and interpolation.
//!
//! Double-quoted strings and unquoted-tag heredocs interpolate `$name` and
//! `${expr}` segments. `${…}` re-enters the full parser on the embedded
//! text (token spans are shifted so diagnostics point into the original
//! string), and a bare name or name-with-access inside `${…}` is treated as
//! a variable reference (`${os}` reads `$os`, `${facts['os']}` indexes
//! `$facts`).

use ecow::EcoString;

use crate::ast::{Expression, StringLiteral, StringSegment};
use crate::source_analysis::token::HeredocText;
use crate::source_analysis::{Span, Token, lex_with_eof};

use super::{Diagnostic, Parser};

/// Escapes recognised in double-quoted strings.
const DOUBLE_QUOTED_ESCAPES: &[char] = &['n', 'r', 't', 's', '$', '"', '\'', '\\', 'u', '\n'];

/// Escapes recognised in interpolated heredocs.
const HEREDOC_ESCAPES: &[char] = &['n', 'r', 't', 's', '$', 'u', '\n'];

/// Processes a double-quoted string's raw text into segments.
pub(super) fn double_quoted(parser: &mut Parser, raw: &str, span: Span) -> StringLiteral {
    let base = span.start() + 1; // past the opening quote
    let segments = scan(parser, raw, base, DOUBLE_QUOTED_ESCAPES, true);
    StringLiteral { segments, span }
}

/// Processes a heredoc body into segments: margin stripping, optional
/// trailing-break removal, then escape/interpolation scanning when the tag
/// was unquoted.
pub(super) fn heredoc(parser: &mut Parser, heredoc: &HeredocText, span: Span) -> StringLiteral {
    let mut body = strip_margin(&heredoc.body, heredoc.margin);
    if heredoc.remove_break {
        if body.ends_with('\n') {
            body.pop();
        }
        if body.ends_with('\r') {
            body.pop();
        }
    }

    if heredoc.interpolated {
        let segments = scan(parser, &body, span.start(), HEREDOC_ESCAPES, true);
        StringLiteral { segments, span }
    } else {
        StringLiteral::plain(body, span)
    }
}

/// Strips up to `margin` columns of leading whitespace from every line.
/// A tab counts as eight columns.
fn strip_margin(body: &str, margin: u32) -> String {
    if margin == 0 {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    for (i, line) in body.split_inclusive('\n').enumerate() {
        let _ = i;
        let mut remaining = i64::from(margin);
        let mut chars = line.chars().peekable();
        while remaining > 0 {
            match chars.peek() {
                Some(' ') => {
                    remaining -= 1;
                    chars.next();
                }
                Some('\t') => {
                    remaining -= 8;
                    chars.next();
                }
                _ => break,
            }
        }
        out.extend(chars);
    }
    out
}

/// Scans text into literal/variable/expression segments, applying escapes.
fn scan(
    parser: &mut Parser,
    text: &str,
    base: u32,
    escapes: &[char],
    interpolate: bool,
) -> Vec<StringSegment> {
    let mut segments = Vec::new();
    let mut literal = EcoString::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    let flush = |literal: &mut EcoString, segments: &mut Vec<StringSegment>| {
        if !literal.is_empty() {
            segments.push(StringSegment::Literal(std::mem::take(literal)));
        }
    };

    while i < bytes.len() {
        let c = text[i..].chars().next().expect("in-bounds index");

        if c == '\\' {
            let Some(next) = text[i + 1..].chars().next() else {
                literal.push('\\');
                i += 1;
                continue;
            };
            if escapes.contains(&next) {
                match next {
                    'n' => literal.push('\n'),
                    'r' => literal.push('\r'),
                    't' => literal.push('\t'),
                    's' => literal.push(' '),
                    'u' => {
                        let consumed =
                            unicode_escape(parser, &text[i + 2..], base + to_u32(i), &mut literal);
                        i += 2 + consumed;
                        continue;
                    }
                    '\n' => {} // escaped line break is removed
                    other => literal.push(other),
                }
                i += 1 + next.len_utf8();
                continue;
            }
            // Unknown escape: keep the text and warn
            parser.diagnostics.push(Diagnostic::warning(
                ecow::eco_format!("invalid escape sequence '\\{next}'"),
                offset_span(base, i, 1 + next.len_utf8()),
            ));
            literal.push('\\');
            literal.push(next);
            i += 1 + next.len_utf8();
            continue;
        }

        if interpolate && c == '$' {
            if let Some(next) = text[i + 1..].chars().next() {
                if next == '{' {
                    match find_closing_brace(text, i + 1) {
                        Some(close) => {
                            flush(&mut literal, &mut segments);
                            let inner = &text[i + 2..close];
                            if let Some(segment) =
                                parse_embedded(parser, inner, base + to_u32(i + 2))
                            {
                                segments.push(segment);
                            }
                            i = close + 1;
                            continue;
                        }
                        None => {
                            parser.diagnostics.push(Diagnostic::error(
                                "a closing '}' was not found for interpolation",
                                offset_span(base, i, 2),
                            ));
                            literal.push(c);
                            i += 1;
                            continue;
                        }
                    }
                }
                if next.is_ascii_digit() || next.is_ascii_lowercase() || next == '_' || next == ':'
                {
                    let (name, len) = scan_variable_name(&text[i + 1..]);
                    if !name.is_empty() {
                        flush(&mut literal, &mut segments);
                        segments.push(StringSegment::Variable(
                            name,
                            offset_span(base, i, 1 + len),
                        ));
                        i += 1 + len;
                        continue;
                    }
                }
            }
        }

        literal.push(c);
        i += c.len_utf8();
    }

    flush(&mut literal, &mut segments);
    if segments.is_empty() {
        segments.push(StringSegment::Literal(EcoString::new()));
    }
    segments
}

#[allow(clippy::cast_possible_truncation)]
const fn to_u32(i: usize) -> u32 {
    i as u32
}

fn offset_span(base: u32, offset: usize, len: usize) -> Span {
    Span::new(base + to_u32(offset), base + to_u32(offset + len))
}

/// Scans a `$name` variable reference: match-variable digits, or a
/// `::`-qualified lowercase name. Returns the name and its byte length.
fn scan_variable_name(text: &str) -> (EcoString, usize) {
    let bytes = text.as_bytes();
    let mut len = 0;

    if bytes.first().is_some_and(u8::is_ascii_digit) {
        while bytes.get(len).is_some_and(u8::is_ascii_digit) {
            len += 1;
        }
        return (EcoString::from(&text[..len]), len);
    }

    if text.starts_with("::") {
        len = 2;
    }
    if !bytes
        .get(len)
        .is_some_and(|b| b.is_ascii_lowercase() || *b == b'_')
    {
        return (EcoString::new(), 0);
    }
    loop {
        while bytes
            .get(len)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            len += 1;
        }
        if text[len..].starts_with("::")
            && bytes
                .get(len + 2)
                .is_some_and(|b| b.is_ascii_lowercase() || *b == b'_')
        {
            len += 2;
        } else {
            break;
        }
    }
    (EcoString::from(&text[..len]), len)
}

/// Finds the `}` matching the `{` at `open`, skipping quoted strings.
fn find_closing_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = text[open..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            '\'' | '"' => {
                // Skip the quoted string
                let quote = c;
                loop {
                    match chars.next() {
                        None => return None,
                        Some((_, '\\')) => {
                            chars.next();
                        }
                        Some((_, q)) if q == quote => break,
                        Some(_) => {}
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `${…}` content with the full parser, then rewrites a leading bare
/// name (or name with access/method postfixes) into a variable reference.
fn parse_embedded(parser: &mut Parser, text: &str, base: u32) -> Option<StringSegment> {
    if text.trim().is_empty() {
        return None;
    }

    let tokens: Vec<Token> = lex_with_eof(text)
        .into_iter()
        .map(|token| shift_token(&token, base))
        .collect();
    let (manifest, diagnostics) = super::parse(tokens);
    parser.diagnostics.extend(diagnostics);

    let mut body = manifest.body;
    let expression = match body.len() {
        0 => return None,
        1 => body.pop().expect("length checked"),
        _ => {
            parser.diagnostics.push(Diagnostic::error(
                "expected a single expression in interpolation",
                Span::new(base, base + to_u32(text.len())),
            ));
            body.pop().expect("length checked")
        }
    };

    Some(StringSegment::Expression(Box::new(variablize(expression))))
}

/// Shifts a token's span by `base` bytes.
fn shift_token(token: &Token, base: u32) -> Token {
    let span = token.span();
    Token::with_trivia(
        token.kind().clone(),
        Span::new(span.start() + base, span.end() + base),
        token.leading_trivia().to_vec(),
        token.trailing_trivia().to_vec(),
    )
}

/// Rewrites `${name}`, `${name[…]}`, and `${name.method(…)}` so the leading
/// name resolves as a variable, matching how `${0}` resolves the match
/// variable.
fn variablize(expression: Expression) -> Expression {
    match expression {
        Expression::Name(name, span) | Expression::BareWord(name, span) => {
            Expression::Variable(name, span)
        }
        Expression::Integer(value, span) => {
            Expression::Variable(ecow::eco_format!("{value}"), span)
        }
        Expression::Access {
            target,
            arguments,
            span,
        } => Expression::Access {
            target: Box::new(variablize(*target)),
            arguments,
            span,
        },
        Expression::MethodCall {
            target,
            name,
            name_span,
            arguments,
            lambda,
            span,
        } => Expression::MethodCall {
            target: Box::new(variablize(*target)),
            name,
            name_span,
            arguments,
            lambda,
            span,
        },
        other => other,
    }
}

/// Handles `\uXXXX` and `\u{…}` escapes; returns consumed byte count after
/// the `\u` prefix.
fn unicode_escape(
    parser: &mut Parser,
    text: &str,
    span_base: u32,
    literal: &mut EcoString,
) -> usize {
    let bytes = text.as_bytes();

    let (digits, consumed) = if bytes.first() == Some(&b'{') {
        let Some(close) = text.find('}') else {
            parser.diagnostics.push(Diagnostic::warning(
                "a closing '}' was not found for unicode escape sequence",
                Span::new(span_base, span_base + 2),
            ));
            literal.push_str("\\u");
            return 0;
        };
        (&text[1..close], close + 1)
    } else {
        let len = bytes
            .iter()
            .take(4)
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        (&text[..len], len)
    };

    let valid_length = (1..=6).contains(&digits.len());
    let code_point = u32::from_str_radix(digits, 16).ok();
    match code_point.and_then(char::from_u32) {
        Some(c) if valid_length && digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
            literal.push(c);
        }
        _ => {
            parser.diagnostics.push(Diagnostic::warning(
                "invalid unicode escape sequence",
                Span::new(span_base, span_base + 2),
            ));
            literal.push_str("\\u");
            return 0;
        }
    }
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parser::parse_source;

    fn literal_of(source: &str) -> EcoString {
        let (manifest, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        match &manifest.body[0] {
            Expression::String(s) => s.as_literal().expect("literal string").clone(),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(literal_of(r#""A""#), "A");
        assert_eq!(literal_of(r#""\u{1F600}""#), "\u{1F600}");
    }

    #[test]
    fn invalid_escape_warns_but_keeps_text() {
        let (manifest, diagnostics) = parse_source(r#""a\qb""#);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.severity == super::super::Severity::Warning)
        );
        match &manifest.body[0] {
            Expression::String(s) => {
                assert_eq!(s.as_literal().map(EcoString::as_str), Some("a\\qb"));
            }
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn dollar_without_name_is_literal() {
        assert_eq!(literal_of(r#""cost: $ 5""#), "cost: $ 5");
    }

    #[test]
    fn escaped_dollar_is_literal() {
        assert_eq!(literal_of(r#""\$x""#), "$x");
    }

    #[test]
    fn match_variable_interpolation() {
        let (manifest, diagnostics) = parse_source(r#""${0}""#);
        assert!(diagnostics.is_empty());
        let Expression::String(s) = &manifest.body[0] else {
            panic!("expected string");
        };
        assert!(matches!(
            &s.segments[0],
            StringSegment::Expression(e) if matches!(&**e, Expression::Variable(n, _) if n == "0")
        ));
    }

    #[test]
    fn embedded_access_becomes_variable_access() {
        let (manifest, diagnostics) = parse_source(r#""${facts['os']}""#);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        let Expression::String(s) = &manifest.body[0] else {
            panic!("expected string");
        };
        let StringSegment::Expression(expr) = &s.segments[0] else {
            panic!("expected expression segment");
        };
        let Expression::Access { target, .. } = &**expr else {
            panic!("expected access");
        };
        assert!(matches!(&**target, Expression::Variable(n, _) if n == "facts"));
    }

    #[test]
    fn nested_braces_and_quotes_in_interpolation() {
        let (manifest, diagnostics) = parse_source(r#""${ {'a' => 1}['a'] }""#);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        let Expression::String(s) = &manifest.body[0] else {
            panic!("expected string");
        };
        assert!(matches!(&s.segments[0], StringSegment::Expression(_)));
    }

    #[test]
    fn heredoc_margin_stripping() {
        let source = "$x = @(END)\n    line one\n      line two\n    | END\n";
        let (manifest, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::String(s) = &**right else {
            panic!("expected string");
        };
        assert_eq!(
            s.as_literal().map(EcoString::as_str),
            Some("line one\n  line two\n")
        );
    }

    #[test]
    fn heredoc_interpolates_unquoted_tags_only() {
        let source = "$x = @(END)\nvalue: ${1 + 1}\n| END\n$y = @(\"QUOTED\")\nvalue: ${1 + 1}\n| QUOTED\n";
        let (manifest, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");

        let Expression::Binary { right, .. } = &manifest.body[0] else {
            panic!("expected assignment");
        };
        let Expression::String(interpolated) = &**right else {
            panic!("expected string");
        };
        assert!(interpolated.as_literal().is_none());

        let Expression::Binary { right, .. } = &manifest.body[1] else {
            panic!("expected assignment");
        };
        let Expression::String(quoted) = &**right else {
            panic!("expected string");
        };
        assert!(quoted.as_literal().is_some());
    }
}
