//! Request tokenizer
//!
//! Whitespace-split semantics: runs of delimiters count as one, and no empty
//! tokens are produced. No quoting, no escaping.

use crate::error::{DirKvError, Result};

/// Most tokens a request may carry: command, key, value
pub const MAX_TOKENS: usize = 3;

/// Split `line` into at most `max_tokens` non-empty tokens
///
/// Fails with `TooManyTokens` as soon as a token past the limit is seen.
pub fn tokenize(line: &[u8], max_tokens: usize) -> Result<Vec<&[u8]>> {
    let mut tokens = Vec::with_capacity(max_tokens);

    for token in split_tokens(line) {
        if tokens.len() == max_tokens {
            return Err(DirKvError::TooManyTokens { max: max_tokens });
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Lazily yield the non-empty tokens of `line`
pub fn split_tokens(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
}
