//! Word-frequency ranking.
//!
//! Ranking is by count descending. Ties keep the order in which the tied
//! words first appeared in the normalized text, so the output is a pure
//! function of the input.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::token::{normalize_text, word_tokens};

/// Number of entries returned by [`top_words`] in the standard pipeline.
pub const TOP_WORDS_LIMIT: usize = 10;

/// One ranked word and its number of occurrences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WordFrequency {
    pub word: String,
    pub count: u64,
}

impl WordFrequency {
    pub fn new(word: impl Into<String>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

/// Ranks already-normalized tokens and keeps the `limit` most frequent.
pub fn rank_tokens<'a, I>(tokens: I, limit: usize) -> Vec<WordFrequency>
where
    I: IntoIterator<Item = &'a str>,
{
    // word -> (count, first position)
    let mut counts: FxHashMap<&'a str, (u64, usize)> = FxHashMap::default();
    for (position, token) in tokens.into_iter().enumerate() {
        counts
            .entry(token)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }

    let mut ranked: Vec<(&str, u64, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(word, count, _)| WordFrequency::new(word, count))
        .collect()
}

/// Lower-cases `text`, extracts word tokens, and returns the `limit` most
/// frequent ones, most frequent first.
///
/// Fewer than `limit` distinct words yields all of them.
///
/// ```rust
/// use canonical::{top_words, WordFrequency};
///
/// let top = top_words("The cat sat on the mat the cat ran", 10);
/// assert_eq!(top[0], WordFrequency::new("the", 3));
/// assert_eq!(top[1], WordFrequency::new("cat", 2));
/// assert_eq!(top.len(), 6);
/// ```
pub fn top_words(text: &str, limit: usize) -> Vec<WordFrequency> {
    let normalized = normalize_text(text);
    rank_tokens(word_tokens(&normalized), limit)
}

/// Returns true when `entries` is a valid ranking: at most `limit` entries,
/// every count at least one, and counts never increasing.
pub fn is_valid_ranking(entries: &[WordFrequency], limit: usize) -> bool {
    entries.len() <= limit
        && entries.iter().all(|e| e.count >= 1 && !e.word.is_empty())
        && entries.windows(2).all(|pair| pair[0].count >= pair[1].count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_follow_first_appearance() {
        let top = top_words("b a c a b d", 10);
        let words: Vec<&str> = top.iter().map(|w| w.word.as_str()).collect();
        // b and a tie at 2, b seen first; c and d tie at 1, c seen first
        assert_eq!(words, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn truncates_to_limit() {
        let text = (0..25).map(|i| format!("w{i} ")).collect::<String>();
        let top = top_words(&text, TOP_WORDS_LIMIT);
        assert_eq!(top.len(), TOP_WORDS_LIMIT);
        assert_eq!(top[0].word, "w0");
        assert_eq!(top[9].word, "w9");
    }

    #[test]
    fn case_and_punctuation_are_normalized() {
        let top = top_words("Dog. dog, DOG! cat", 10);
        assert_eq!(
            top,
            vec![WordFrequency::new("dog", 3), WordFrequency::new("cat", 1)]
        );
    }

    #[test]
    fn empty_text_has_no_words() {
        assert!(top_words("", 10).is_empty());
        assert!(top_words("?! ...", 10).is_empty());
    }

    #[test]
    fn counts_sum_to_token_occurrences_for_small_vocabulary() {
        let text = "x y z x y x";
        let top = top_words(text, 10);
        let total: u64 = top.iter().map(|w| w.count).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn ranking_validation() {
        let good = vec![WordFrequency::new("a", 3), WordFrequency::new("b", 3)];
        assert!(is_valid_ranking(&good, 10));

        let unsorted = vec![WordFrequency::new("a", 1), WordFrequency::new("b", 2)];
        assert!(!is_valid_ranking(&unsorted, 10));

        let zero = vec![WordFrequency::new("a", 0)];
        assert!(!is_valid_ranking(&zero, 10));

        let too_long: Vec<_> = (0..11).map(|i| WordFrequency::new(format!("w{i}"), 1)).collect();
        assert!(!is_valid_ranking(&too_long, 10));
    }

    #[test]
    fn serializes_as_word_and_count() {
        let json = serde_json::to_string(&WordFrequency::new("the", 3)).unwrap();
        assert_eq!(json, r#"{"word":"the","count":3}"#);
    }
}
