use canonical::{count_whitespace_tokens, top_words, TOP_WORDS_LIMIT};

fn main() {
    let input = "The cat sat on the mat. The cat ran!";

    println!("total words: {}", count_whitespace_tokens(input));
    for entry in top_words(input, TOP_WORDS_LIMIT) {
        println!("{:>8} {}", entry.word, entry.count);
    }
}
