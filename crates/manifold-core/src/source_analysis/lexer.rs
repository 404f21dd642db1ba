// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Manifold source code.
//!
//! This module converts manifest text into a stream of [`Token`]s. The lexer
//! is hand-written for maximum control over error recovery and the stateful
//! corners of the language (regex-vs-division, heredocs).
//!
//! # Design Principles
//!
//! - **Error recovery**: never panic on malformed input; emit [`TokenKind::Error`]
//! - **Trivia preservation**: whitespace and comments attach to tokens
//! - **Precise spans**: every token carries its exact source location
//!
//! # Stateful corners
//!
//! - A `/` begins a regex literal only where a value may appear (tracked via
//!   the previous significant token); elsewhere it is division.
//! - `@(TAG)` opens a heredoc whose body begins on the *next* line and runs
//!   to a `| TAG` / `|- TAG` / `TAG` terminator line. Multiple heredocs may
//!   open on one line; their bodies are consumed in order when the line ends.

use ecow::EcoString;

use super::token::HeredocText;
use super::{Span, Token, TokenKind, Trivia, is_statement_call};

/// Lexes source text into tokens, excluding the trailing EOF token.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lexes source text into tokens, including a trailing EOF token.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

/// A lexer that tokenizes Manifold source code.
///
/// Implements [`Iterator`], yielding tokens until end of input (the EOF
/// token itself is not yielded; use [`lex_with_eof`] for that).
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Current byte position in source.
    position: usize,
    /// Pending trivia to attach to the next token.
    pending_trivia: Vec<Trivia>,
    /// Whether a value expression may begin at the current position.
    value_expected: bool,
    /// Where the next heredoc body on the current line begins, if a heredoc
    /// has already been opened on this line.
    heredoc_scan: Option<usize>,
    /// Position to jump to when the current line ends (past consumed
    /// heredoc bodies).
    heredoc_resume: Option<usize>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            pending_trivia: Vec::new(),
            value_expected: true,
            heredoc_scan: None,
            heredoc_resume: None,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    /// Peeks `n+1` characters ahead without consuming.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.source[self.position..].chars().nth(n)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[allow(clippy::cast_possible_truncation)]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    /// Skips whitespace and comments, collecting them as trivia.
    ///
    /// Consuming a newline also jumps past any heredoc bodies opened on the
    /// line that just ended.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some('\n') => {
                    self.advance();
                    // Jump past heredoc bodies opened on the line that just
                    // ended; the skipped region reads as plain whitespace.
                    if let Some(resume) = self.heredoc_resume.take() {
                        self.position = resume;
                        self.heredoc_scan = None;
                    }
                    self.pending_trivia.push(Trivia::Whitespace("\n".into()));
                }
                Some(' ' | '\t' | '\r') => {
                    let start = self.current_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t' | '\r'));
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('#') => self.lex_line_comment(),
                Some('/') if self.peek_char_n(1) == Some('*') => self.lex_block_comment(),
                _ => break,
            }
        }
    }

    /// Lexes a line comment: `# ...`
    fn lex_line_comment(&mut self) {
        let start = self.current_position();
        self.advance(); // #
        self.advance_while(|c| c != '\n');
        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::LineComment(EcoString::from(text)));
    }

    /// Lexes a block comment: `/* ... */`
    fn lex_block_comment(&mut self) {
        let start = self.current_position();
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => break, // unterminated, recover gracefully
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        let text = self.text_for(self.span_from(start));
        self.pending_trivia
            .push(Trivia::BlockComment(EcoString::from(text)));
    }

    /// Lexes the next token.
    fn lex_token(&mut self) -> Token {
        self.skip_trivia();
        let leading_trivia = std::mem::take(&mut self.pending_trivia);

        let start = self.current_position();
        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c, start),
        };
        let span = self.span_from(start);

        if !kind.is_eof() {
            self.value_expected = kind.expects_value_after();
        }

        // Collect trailing trivia (same-line whitespace and comments).
        loop {
            match self.peek_char() {
                Some(' ' | '\t') => {
                    let ws_start = self.current_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t'));
                    let text = self.text_for(self.span_from(ws_start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('#') => {
                    self.lex_line_comment();
                    break;
                }
                _ => break,
            }
        }
        let trailing_trivia = std::mem::take(&mut self.pending_trivia);

        Token::with_trivia(kind, span, leading_trivia, trailing_trivia)
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char, start: u32) -> TokenKind {
        match c {
            'a'..='z' | '_' => self.lex_name_or_keyword(),
            'A'..='Z' => self.lex_type_name(),
            '0'..='9' => self.lex_number(),
            '$' => self.lex_variable(),
            '\'' => self.lex_single_quoted_string(),
            '"' => self.lex_double_quoted_string(),

            '{' => {
                self.advance();
                TokenKind::LeftBrace
            }
            '}' => {
                self.advance();
                TokenKind::RightBrace
            }
            '[' => {
                self.advance();
                TokenKind::LeftBracket
            }
            ']' => {
                self.advance();
                TokenKind::RightBracket
            }
            '(' => {
                self.advance();
                TokenKind::LeftParen
            }
            ')' => {
                self.advance();
                TokenKind::RightParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            '.' => {
                self.advance();
                TokenKind::Dot
            }
            '?' => {
                self.advance();
                TokenKind::Question
            }

            ':' => {
                // `::name` / `::Type` global references; otherwise `:`
                if self.peek_char_n(1) == Some(':') {
                    match self.peek_char_n(2) {
                        Some('a'..='z' | '_') => return self.lex_name_or_keyword(),
                        Some('A'..='Z') => return self.lex_type_name(),
                        _ => {}
                    }
                }
                self.advance();
                TokenKind::Colon
            }

            '@' => {
                self.advance();
                match self.peek_char() {
                    Some('@') => {
                        self.advance();
                        TokenKind::AtAt
                    }
                    Some('(') => self.lex_heredoc_tag(start),
                    _ => TokenKind::At,
                }
            }

            '=' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        TokenKind::EqualsEquals
                    }
                    Some('~') => {
                        self.advance();
                        TokenKind::MatchOp
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::FatArrow
                    }
                    _ => TokenKind::Equals,
                }
            }

            '!' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        TokenKind::NotEquals
                    }
                    Some('~') => {
                        self.advance();
                        TokenKind::NotMatchOp
                    }
                    _ => TokenKind::Bang,
                }
            }

            '<' => {
                self.advance();
                match (self.peek_char(), self.peek_char_n(1)) {
                    (Some('<'), Some('|')) => {
                        self.advance();
                        self.advance();
                        TokenKind::LeftDoubleCollect
                    }
                    (Some('<'), _) => {
                        self.advance();
                        TokenKind::LeftShift
                    }
                    (Some('='), _) => {
                        self.advance();
                        TokenKind::LessEquals
                    }
                    (Some('-'), _) => {
                        self.advance();
                        TokenKind::LeftArrow
                    }
                    (Some('~'), _) => {
                        self.advance();
                        TokenKind::LeftTildeArrow
                    }
                    (Some('|'), _) => {
                        self.advance();
                        TokenKind::LeftCollect
                    }
                    _ => TokenKind::Less,
                }
            }

            '>' => {
                self.advance();
                match self.peek_char() {
                    Some('>') => {
                        self.advance();
                        TokenKind::RightShift
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::GreaterEquals
                    }
                    _ => TokenKind::Greater,
                }
            }

            '|' => {
                self.advance();
                match (self.peek_char(), self.peek_char_n(1)) {
                    (Some('>'), Some('>')) => {
                        self.advance();
                        self.advance();
                        TokenKind::RightDoubleCollect
                    }
                    (Some('>'), _) => {
                        self.advance();
                        TokenKind::RightCollect
                    }
                    _ => TokenKind::Pipe,
                }
            }

            '+' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::PlusArrow
                } else {
                    TokenKind::Plus
                }
            }

            '-' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::RightArrow
                } else {
                    TokenKind::Minus
                }
            }

            '~' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::RightTildeArrow
                } else {
                    TokenKind::Error("~".into())
                }
            }

            '*' => {
                self.advance();
                TokenKind::Star
            }
            '%' => {
                self.advance();
                TokenKind::Percent
            }

            '/' => {
                if self.value_expected {
                    self.lex_regex()
                } else {
                    self.advance();
                    TokenKind::Slash
                }
            }

            _ => {
                self.advance();
                let text = self.text_for(self.span_from(start));
                TokenKind::Error(EcoString::from(text))
            }
        }
    }

    /// Lexes a name, keyword, statement call, or bare word.
    ///
    /// Names are `::`-joined lowercase-first segments (`foo`, `foo::bar`,
    /// `::foo`). A word containing hyphens is a bare word.
    fn lex_name_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();

        // Optional leading `::`
        if self.peek_char() == Some(':') {
            self.advance();
            self.advance();
        }

        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        // Consume qualified segments: `::segment`
        while self.peek_char() == Some(':')
            && self.peek_char_n(1) == Some(':')
            && self
                .peek_char_n(2)
                .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        {
            self.advance();
            self.advance();
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        }

        let text = self.text_for(self.span_from(start));

        if text.contains('-') {
            return TokenKind::BareWord(EcoString::from(text));
        }
        if let Some(keyword) = TokenKind::keyword(text) {
            return keyword;
        }
        if is_statement_call(text) {
            return TokenKind::StatementCall(EcoString::from(text));
        }
        TokenKind::Name(EcoString::from(text))
    }

    /// Lexes a capitalised type name: `File`, `Foo::Bar`, `::Foo`.
    fn lex_type_name(&mut self) -> TokenKind {
        let start = self.current_position();

        if self.peek_char() == Some(':') {
            self.advance();
            self.advance();
        }

        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        while self.peek_char() == Some(':')
            && self.peek_char_n(1) == Some(':')
            && self.peek_char_n(2).is_some_and(|c| c.is_ascii_alphabetic())
        {
            self.advance();
            self.advance();
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }

        let text = self.text_for(self.span_from(start));
        TokenKind::TypeName(EcoString::from(text))
    }

    /// Lexes a numeric literal: decimal, hex (`0x…`), octal (`0…`), or
    /// float with optional exponent. Malformed literals become error tokens.
    fn lex_number(&mut self) -> TokenKind {
        let start = self.current_position();

        if self.peek_char() == Some('0')
            && matches!(self.peek_char_n(1), Some('x' | 'X'))
            && self.peek_char_n(2).is_some_and(|c| c.is_ascii_alphanumeric())
        {
            self.advance(); // 0
            self.advance(); // x
            self.advance_while(|c| c.is_ascii_alphanumeric());
            let text = self.text_for(self.span_from(start));
            if text[2..].bytes().all(|b| b.is_ascii_hexdigit()) {
                return TokenKind::Number(EcoString::from(text));
            }
            return self.malformed_number(start);
        }

        self.advance_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E'))
            && (self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_char_n(1), Some('+' | '-'))
                    && self.peek_char_n(2).is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            self.advance(); // e
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
        }

        // A trailing identifier character makes the literal malformed: 123abc
        if self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            return self.malformed_number(start);
        }

        let text = self.text_for(self.span_from(start));
        if !is_float && text.len() > 1 && text.starts_with('0') {
            // Octal: every digit must be 0-7
            if !text[1..].bytes().all(|b| (b'0'..=b'7').contains(&b)) {
                return self.malformed_number(start);
            }
        }
        TokenKind::Number(EcoString::from(text))
    }

    fn malformed_number(&self, start: u32) -> TokenKind {
        let text = self.text_for(self.span_from(start));
        TokenKind::Error(ecow::eco_format!("malformed number '{text}'"))
    }

    /// Lexes a variable reference: `$name`, `$foo::bar`, `$::x`, `$0`.
    fn lex_variable(&mut self) -> TokenKind {
        self.advance(); // $
        let start = self.current_position();

        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_while(|c| c.is_ascii_digit());
            let text = self.text_for(self.span_from(start));
            return TokenKind::Variable(EcoString::from(text));
        }

        if self.peek_char() == Some(':') && self.peek_char_n(1) == Some(':') {
            self.advance();
            self.advance();
        }

        if !self
            .peek_char()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        {
            return TokenKind::Error("$".into());
        }

        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        while self.peek_char() == Some(':')
            && self.peek_char_n(1) == Some(':')
            && self
                .peek_char_n(2)
                .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        {
            self.advance();
            self.advance();
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }

        let text = self.text_for(self.span_from(start));
        TokenKind::Variable(EcoString::from(text))
    }

    /// Lexes a single-quoted string, applying the `\\` and `\'` escapes.
    fn lex_single_quoted_string(&mut self) -> TokenKind {
        self.advance(); // '
        let mut value = EcoString::new();
        loop {
            match self.peek_char() {
                None => return TokenKind::Error("unterminated string".into()),
                Some('\'') => {
                    self.advance();
                    return TokenKind::SingleQuotedString(value);
                }
                Some('\\') if matches!(self.peek_char_n(1), Some('\\' | '\'')) => {
                    self.advance();
                    let c = self.advance().unwrap_or('\\');
                    value.push(c);
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    /// Lexes a double-quoted string, capturing the raw text between the
    /// quotes. Escape and interpolation processing happens in the parser.
    fn lex_double_quoted_string(&mut self) -> TokenKind {
        self.advance(); // "
        let start = self.current_position();
        loop {
            match self.peek_char() {
                None => return TokenKind::Error("unterminated string".into()),
                Some('"') => {
                    let text = self.text_for(self.span_from(start));
                    self.advance();
                    return TokenKind::DoubleQuotedString(EcoString::from(text));
                }
                Some('\\') if self.peek_char_n(1).is_some() => {
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Lexes a regex literal: `/pattern/` with `\/` escaping a slash.
    /// Only called where a value is expected.
    fn lex_regex(&mut self) -> TokenKind {
        self.advance(); // /
        let mut pattern = EcoString::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => return TokenKind::Error("unterminated regex".into()),
                Some('/') => {
                    self.advance();
                    return TokenKind::Regex(pattern);
                }
                Some('\\') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    pattern.push('/');
                }
                Some(c) => {
                    self.advance();
                    pattern.push(c);
                }
            }
        }
    }

    /// Lexes a heredoc tag `@(TAG)` / `@("TAG")` / `@(TAG:syntax)` and
    /// extracts the body from the lines following the current one.
    ///
    /// The leading `@` has been consumed; the current char is `(`.
    fn lex_heredoc_tag(&mut self, start: u32) -> TokenKind {
        self.advance(); // (

        let quoted = self.peek_char() == Some('"');
        if quoted {
            self.advance();
        }

        let tag_start = self.current_position();
        self.advance_while(|c| !matches!(c, '"' | ':' | ')' | '\n'));
        let tag = EcoString::from(self.text_for(self.span_from(tag_start)).trim());

        if quoted {
            if self.peek_char() != Some('"') {
                return self.heredoc_error(start, "unterminated heredoc tag");
            }
            self.advance();
        }

        let mut syntax = None;
        if self.peek_char() == Some(':') {
            self.advance();
            let syntax_start = self.current_position();
            self.advance_while(|c| !matches!(c, ')' | '\n'));
            let text = self.text_for(self.span_from(syntax_start)).trim();
            if !text.is_empty() {
                syntax = Some(EcoString::from(text));
            }
        }

        if self.peek_char() != Some(')') {
            return self.heredoc_error(start, "malformed heredoc tag");
        }
        self.advance(); // )

        if tag.is_empty() {
            return self.heredoc_error(start, "heredoc tag cannot be empty");
        }

        // The body begins after the current line, or after the previous
        // heredoc opened on this line.
        let body_start = match self.heredoc_scan {
            Some(pos) => pos,
            None => match self.source[self.position..].find('\n') {
                Some(offset) => self.position + offset + 1,
                None => return self.heredoc_error(start, "unterminated heredoc"),
            },
        };

        let Some(extracted) = extract_heredoc_body(self.source, body_start, &tag) else {
            return self.heredoc_error(start, "unterminated heredoc");
        };

        self.heredoc_scan = Some(extracted.resume);
        self.heredoc_resume = Some(extracted.resume);

        TokenKind::Heredoc(HeredocText {
            body: extracted.body,
            interpolated: !quoted,
            margin: extracted.margin,
            remove_break: extracted.remove_break,
            syntax,
        })
    }

    fn heredoc_error(&mut self, start: u32, message: &str) -> TokenKind {
        // Recover to the end of the line
        self.advance_while(|c| c != '\n');
        let text = self.text_for(self.span_from(start));
        TokenKind::Error(ecow::eco_format!("{message} '{text}'"))
    }
}

struct ExtractedHeredoc {
    body: EcoString,
    margin: u32,
    remove_break: bool,
    /// Byte offset just past the terminator line (including its newline).
    resume: usize,
}

/// Scans lines from `body_start` looking for a heredoc terminator for `tag`:
/// `| TAG`, `|- TAG`, `| - TAG`, or a bare `TAG` line.
#[allow(clippy::cast_possible_truncation)]
fn extract_heredoc_body(source: &str, body_start: usize, tag: &str) -> Option<ExtractedHeredoc> {
    let mut line_start = body_start;
    while line_start <= source.len() {
        let line_end = source[line_start..]
            .find('\n')
            .map_or(source.len(), |off| line_start + off);
        let line = &source[line_start..line_end];

        if let Some((margin, remove_break)) = parse_terminator(line, tag) {
            let body = &source[body_start..line_start];
            let resume = if line_end < source.len() {
                line_end + 1
            } else {
                line_end
            };
            return Some(ExtractedHeredoc {
                body: EcoString::from(body),
                margin,
                remove_break,
                resume,
            });
        }

        if line_end >= source.len() {
            break;
        }
        line_start = line_end + 1;
    }
    None
}

/// Parses a candidate terminator line. Returns `(margin, remove_break)` on a
/// match: the margin is the indentation of the `|` marker (0 when no marker
/// is present, which disables stripping).
#[allow(clippy::cast_possible_truncation)]
fn parse_terminator(line: &str, tag: &str) -> Option<(u32, bool)> {
    let trimmed_start = line.len() - line.trim_start().len();
    let mut rest = line.trim_start();
    let mut margin = 0;
    let mut remove_break = false;

    if let Some(stripped) = rest.strip_prefix('|') {
        margin = trimmed_start as u32;
        rest = stripped.trim_start();
        if let Some(stripped) = rest.strip_prefix('-') {
            remove_break = true;
            rest = stripped.trim_start();
        }
    } else if let Some(stripped) = rest.strip_prefix('-') {
        remove_break = true;
        rest = stripped.trim_start();
    }

    if rest.trim_end() == tag {
        Some((margin, remove_break))
    } else {
        None
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(Token::into_kind).collect()
    }

    #[test]
    fn lexes_keywords_names_and_barewords() {
        assert_eq!(
            kinds("class foo inherits bar"),
            vec![
                TokenKind::KeywordClass,
                TokenKind::Name("foo".into()),
                TokenKind::KeywordInherits,
                TokenKind::Name("bar".into()),
            ]
        );
        assert_eq!(kinds("x86-64"), vec![TokenKind::BareWord("x86-64".into())]);
        assert_eq!(
            kinds("foo::bar::baz"),
            vec![TokenKind::Name("foo::bar::baz".into())]
        );
        assert_eq!(kinds("::foo"), vec![TokenKind::Name("::foo".into())]);
    }

    #[test]
    fn lexes_statement_calls() {
        assert_eq!(
            kinds("include apache"),
            vec![
                TokenKind::StatementCall("include".into()),
                TokenKind::Name("apache".into()),
            ]
        );
    }

    #[test]
    fn lexes_type_names() {
        assert_eq!(kinds("File"), vec![TokenKind::TypeName("File".into())]);
        assert_eq!(
            kinds("Foo::Bar"),
            vec![TokenKind::TypeName("Foo::Bar".into())]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number("42".into())]);
        assert_eq!(kinds("0x1F"), vec![TokenKind::Number("0x1F".into())]);
        assert_eq!(kinds("0755"), vec![TokenKind::Number("0755".into())]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Number("3.14".into())]);
        assert_eq!(kinds("1e10"), vec![TokenKind::Number("1e10".into())]);
        assert_eq!(kinds("2.5e-3"), vec![TokenKind::Number("2.5e-3".into())]);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(matches!(&kinds("0xZZ")[0], TokenKind::Error(m) if m.contains("malformed")));
        assert!(matches!(&kinds("123abc")[0], TokenKind::Error(m) if m.contains("malformed")));
        assert!(matches!(&kinds("089")[0], TokenKind::Error(m) if m.contains("malformed")));
    }

    #[test]
    fn lexes_variables() {
        assert_eq!(kinds("$x"), vec![TokenKind::Variable("x".into())]);
        assert_eq!(
            kinds("$foo::bar"),
            vec![TokenKind::Variable("foo::bar".into())]
        );
        assert_eq!(kinds("$::x"), vec![TokenKind::Variable("::x".into())]);
        assert_eq!(kinds("$0"), vec![TokenKind::Variable("0".into())]);
    }

    #[test]
    fn lexes_single_quoted_strings() {
        assert_eq!(
            kinds("'hello'"),
            vec![TokenKind::SingleQuotedString("hello".into())]
        );
        assert_eq!(
            kinds(r"'it\'s \\ here'"),
            vec![TokenKind::SingleQuotedString(r"it's \ here".into())]
        );
        assert!(kinds("'oops").first().unwrap().is_error());
    }

    #[test]
    fn lexes_double_quoted_strings_raw() {
        assert_eq!(
            kinds(r#""a $x b""#),
            vec![TokenKind::DoubleQuotedString("a $x b".into())]
        );
        // Escaped quote does not end the string
        assert_eq!(
            kinds(r#""a \" b""#),
            vec![TokenKind::DoubleQuotedString(r#"a \" b"#.into())]
        );
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("<<| <| << <= <- <~ <"),
            vec![
                TokenKind::LeftDoubleCollect,
                TokenKind::LeftCollect,
                TokenKind::LeftShift,
                TokenKind::LessEquals,
                TokenKind::LeftArrow,
                TokenKind::LeftTildeArrow,
                TokenKind::Less,
            ]
        );
        assert_eq!(
            kinds("|>> |> |"),
            vec![
                TokenKind::RightDoubleCollect,
                TokenKind::RightCollect,
                TokenKind::Pipe,
            ]
        );
        assert_eq!(
            kinds("== =~ => ="),
            vec![
                TokenKind::EqualsEquals,
                TokenKind::MatchOp,
                TokenKind::FatArrow,
                TokenKind::Equals,
            ]
        );
        assert_eq!(kinds("+> +"), vec![TokenKind::PlusArrow, TokenKind::Plus]);
        assert_eq!(
            kinds("-> - ~>"),
            vec![
                TokenKind::RightArrow,
                TokenKind::Minus,
                TokenKind::RightTildeArrow,
            ]
        );
        assert_eq!(kinds("@@ @"), vec![TokenKind::AtAt, TokenKind::At]);
    }

    #[test]
    fn regex_only_in_value_position() {
        // Value position: regex
        assert_eq!(
            kinds("$x = /ab+c/"),
            vec![
                TokenKind::Variable("x".into()),
                TokenKind::Equals,
                TokenKind::Regex("ab+c".into()),
            ]
        );
        // After a value: division
        assert_eq!(
            kinds("1 / 2"),
            vec![
                TokenKind::Number("1".into()),
                TokenKind::Slash,
                TokenKind::Number("2".into()),
            ]
        );
        // Escaped slash inside a regex
        assert_eq!(kinds(r"= /a\/b/")[1], TokenKind::Regex("a/b".into()));
    }

    #[test]
    fn comments_are_trivia() {
        let tokens = lex("# a comment\nfoo /* block */ bar");
        assert_eq!(tokens.len(), 2);
        assert!(
            tokens[0]
                .leading_trivia()
                .iter()
                .any(|t| matches!(t, Trivia::LineComment(c) if c.contains("a comment")))
        );
        assert!(
            tokens[1]
                .leading_trivia()
                .iter()
                .any(|t| matches!(t, Trivia::BlockComment(c) if c.contains("block")))
        );
    }

    #[test]
    fn lexes_heredoc() {
        let source = "$x = @(END)\nline one\nline two\n  | END\n$y = 2\n";
        let tokens = lex(source);
        let heredoc = tokens
            .iter()
            .find_map(|t| match t.kind() {
                TokenKind::Heredoc(h) => Some(h.clone()),
                _ => None,
            })
            .expect("heredoc token");
        assert_eq!(heredoc.body, "line one\nline two\n");
        assert!(heredoc.interpolated);
        assert!(!heredoc.remove_break);
        assert_eq!(heredoc.margin, 2);

        // Lexing continues after the terminator line
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t.kind(), TokenKind::Variable(v) if v == "y"))
        );
    }

    #[test]
    fn heredoc_quoted_tag_disables_interpolation() {
        let source = "$x = @(\"END\")\nbody\nEND\n";
        let tokens = lex(source);
        let heredoc = tokens
            .iter()
            .find_map(|t| match t.kind() {
                TokenKind::Heredoc(h) => Some(h.clone()),
                _ => None,
            })
            .expect("heredoc token");
        assert!(!heredoc.interpolated);
        assert_eq!(heredoc.margin, 0);
    }

    #[test]
    fn heredoc_remove_break_and_syntax() {
        let source = "$x = @(END:json)\n{\"a\": 1}\n|- END\n";
        let tokens = lex(source);
        let heredoc = tokens
            .iter()
            .find_map(|t| match t.kind() {
                TokenKind::Heredoc(h) => Some(h.clone()),
                _ => None,
            })
            .expect("heredoc token");
        assert!(heredoc.remove_break);
        assert_eq!(heredoc.syntax.as_deref(), Some("json"));
    }

    #[test]
    fn two_heredocs_on_one_line() {
        let source = "foo(@(ONE), @(TWO))\nfirst\n| ONE\nsecond\n| TWO\n$z = 1\n";
        let tokens = lex(source);
        let bodies: Vec<EcoString> = tokens
            .iter()
            .filter_map(|t| match t.kind() {
                TokenKind::Heredoc(h) => Some(h.body.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(bodies, vec!["first\n", "second\n"]);
        assert!(
            tokens
                .iter()
                .any(|t| matches!(t.kind(), TokenKind::Variable(v) if v == "z"))
        );
    }

    #[test]
    fn unterminated_heredoc_is_error() {
        let source = "$x = @(END)\nno terminator";
        let tokens = lex(source);
        assert!(tokens.iter().any(|t| t.kind().is_error()));
    }

    #[test]
    fn unknown_character_is_error_token() {
        let tokens = lex("foo ` bar");
        assert_eq!(tokens.len(), 3);
        assert!(tokens[1].kind().is_error());
    }

    #[test]
    fn spans_are_exact() {
        let tokens = lex("foo = 42");
        assert_eq!(tokens[0].span(), Span::new(0, 3));
        assert_eq!(tokens[1].span(), Span::new(4, 5));
        assert_eq!(tokens[2].span(), Span::new(6, 8));
    }
}
