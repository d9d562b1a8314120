//! Raw whitespace-delimited token counting.
//!
//! This is the count reported as `total_words`. It deliberately does no
//! normalization: `"Hello,"` and `"hello"` are two distinct tokens here, and
//! punctuation attached to a word stays part of it.
//!
//! # Whitespace Definition
//!
//! A separator is any Unicode `White_Space` character, which includes:
//! - ASCII space (U+0020)
//! - ASCII tab (U+0009)
//! - ASCII newline (U+000A)
//! - ASCII carriage return (U+000D)
//! - And many other Unicode whitespace characters
//!
//! plus the information separators U+001C to U+001F, which are Unicode
//! paragraph and segment separators. Counts agree with Python's
//! `str.split()` on every input.
//!
//! # Examples
//!
//! ```rust
//! use canonical::count_whitespace_tokens;
//!
//! assert_eq!(count_whitespace_tokens("  hello   world  "), 2);
//! assert_eq!(count_whitespace_tokens("it's -- fine"), 3);
//! ```

/// Counts maximal runs of non-whitespace characters.
///
/// Leading, trailing, and repeated whitespace never produce empty tokens, so
/// an empty or whitespace-only input counts as zero.
///
/// # Examples
///
/// ```rust
/// use canonical::count_whitespace_tokens;
///
/// assert_eq!(count_whitespace_tokens(""), 0);
/// assert_eq!(count_whitespace_tokens("\n\t "), 0);
/// assert_eq!(count_whitespace_tokens("the cat sat on the mat the cat ran"), 9);
/// ```
pub fn count_whitespace_tokens(text: &str) -> usize {
    text.split(is_separator)
        .filter(|token| !token.is_empty())
        .count()
}

/// Unicode whitespace or one of the information separators U+001C..=U+001F.
#[inline]
pub fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&ch)
}
