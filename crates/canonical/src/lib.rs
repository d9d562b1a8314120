//! Wordstat text layer.
//!
//! Two independent measures over the same text blob:
//!
//! - **Raw word count**: number of whitespace-delimited substrings. No
//!   case folding, no punctuation handling. See [`count_whitespace_tokens`].
//! - **Word frequencies**: lower-cased text split into maximal runs of
//!   alphanumeric/underscore characters, counted, and ranked. See
//!   [`top_words`].
//!
//! The two are intentionally not unified. `"Hello, hello"` is two raw words
//! and one distinct normalized word with count two.
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no OS/locale dependence. The same text always
//! yields the same count and the same ranking, which is what makes the
//! analysis steps safe to retry.

mod frequency;
mod token;
mod whitespace;

pub use crate::frequency::{
    is_valid_ranking, rank_tokens, top_words, WordFrequency, TOP_WORDS_LIMIT,
};
pub use crate::token::{is_word_char, normalize_text, word_tokens};
pub use crate::whitespace::{count_whitespace_tokens, is_separator};
