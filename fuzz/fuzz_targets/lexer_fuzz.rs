//! Fuzz test for the JSON request lexer
//!
//! This fuzz target feeds arbitrary bytes to the lexer to find:
//! - Panics or crashes
//! - Infinite loops
//! - Errors without a usable location
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use cardinal_core::{Token, TokenStream};
use cardinal_dsl::JsonLexer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut lexer = JsonLexer::new(input);

        // Every character is consumed at most once, so the stream must end
        // (or fail) within len + 1 tokens.
        for _ in 0..=input.len() + 1 {
            match lexer.next_token() {
                Ok(Token::EndOfStream) => return,
                Ok(_) => {
                    let span = lexer.span();
                    assert!(span.start <= span.end, "Span start should be <= end");
                    assert!(span.end <= input.len(), "Span should stay inside the input");
                }
                Err(err) => {
                    assert!(err.line >= 1, "Error line should be >= 1");
                    assert!(err.column >= 1, "Error column should be >= 1");
                    return;
                }
            }
        }
        panic!("lexer did not terminate");
    }
});
