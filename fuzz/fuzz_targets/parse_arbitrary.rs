// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for lexer/parser crash safety.
//!
//! Feeds arbitrary byte sequences through lex → parse and asserts that the
//! pipeline never panics: every input must produce a manifest plus
//! diagnostics. The stateful lexer corners (heredoc body extraction, regex
//! disambiguation, string interpolation re-entry) are the interesting
//! surface here.
//!
//! Invalid UTF-8 bytes are converted via lossy conversion (U+FFFD
//! replacement) so unusual character sequences still reach the lexer.

#![no_main]

use libfuzzer_sys::fuzz_target;
use manifold_core::source_analysis::{lex_with_eof, parse};

fuzz_target!(|data: &[u8]| {
    let source = String::from_utf8_lossy(data);

    let tokens = lex_with_eof(&source);

    // Success = no panic; diagnostics are expected for arbitrary input.
    let (_manifest, _diagnostics) = parse(tokens);
});
