/// Returns true for characters that may appear inside a word token:
/// Unicode alphanumerics and the underscore.
#[inline]
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Lower-cases text for frequency counting.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

/// Iterates over maximal runs of word characters in already-normalized text.
///
/// Any character that is not alphanumeric or `_` is a boundary, so
/// punctuation never ends up inside a token.
pub fn word_tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|ch: char| !is_word_char(ch))
        .filter(|run| !run.is_empty())
}
