// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Source file representation.
//!
//! A [`SourceFile`] owns the text of one manifest and its path, and maps
//! byte offsets to 1-based line/column positions and to the text of the
//! offending line for caret diagnostics.

use camino::{Utf8Path, Utf8PathBuf};

use super::Span;

/// A line/column position within a source file (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// The 1-based line number.
    pub line: u32,
    /// The 1-based column number (in bytes from the line start).
    pub column: u32,
}

/// A manifest source file: path, text, and a line-start index.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Utf8PathBuf,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Creates a source file from a path and its text.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// Returns the manifest path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the full source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text covered by a span.
    #[must_use]
    pub fn text_for(&self, span: Span) -> &str {
        self.text.get(span.as_range()).unwrap_or("")
    }

    /// Maps a byte offset to its 1-based line and column.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn location(&self, offset: u32) -> Location {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Location {
            line: line_index as u32 + 1,
            column: offset - self.line_starts[line_index] + 1,
        }
    }

    /// Returns the text of a 1-based line, without its trailing line break.
    #[must_use]
    pub fn line_text(&self, line: u32) -> &str {
        let index = line.saturating_sub(1) as usize;
        let Some(&start) = self.line_starts.get(index) else {
            return "";
        };
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.text.len(), |&next| next as usize);
        self.text[start as usize..end].trim_end_matches(['\n', '\r'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_maps_lines_and_columns() {
        let file = SourceFile::new("site.mf", "abc\ndef\n");
        assert_eq!(file.location(0), Location { line: 1, column: 1 });
        assert_eq!(file.location(2), Location { line: 1, column: 3 });
        assert_eq!(file.location(4), Location { line: 2, column: 1 });
        assert_eq!(file.location(6), Location { line: 2, column: 3 });
    }

    #[test]
    fn line_text_strips_line_break() {
        let file = SourceFile::new("site.mf", "first\nsecond\r\nthird");
        assert_eq!(file.line_text(1), "first");
        assert_eq!(file.line_text(2), "second");
        assert_eq!(file.line_text(3), "third");
        assert_eq!(file.line_text(4), "");
    }

    #[test]
    fn text_for_span() {
        let file = SourceFile::new("site.mf", "notice('hi')");
        assert_eq!(file.text_for(Span::new(7, 9)), "hi");
    }
}
