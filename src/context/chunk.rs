//! Splits oversized diffs into bounded pieces.

use crate::context::ContextError;

/// Splits `text` into contiguous pieces of at most `max_chars` characters.
///
/// Lengths are counted in Unicode scalar values, so a piece never ends in the
/// middle of a code point. Every piece except the last holds exactly
/// `max_chars` characters and concatenating the pieces reproduces `text`.
/// Empty input yields no pieces.
pub fn chunk_text(text: &str, max_chars: usize) -> Result<Vec<String>, ContextError> {
    if max_chars == 0 {
        return Err(ContextError::invalid("chunk size must be greater than zero"));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, ch) in text.char_indices() {
        count += 1;
        if count == max_chars {
            let end = idx + ch.len_utf8();
            chunks.push(text[start..end].to_string());
            start = end;
            count = 0;
        }
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    Ok(chunks)
}
