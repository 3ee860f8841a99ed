pub mod text {
    use once_cell::sync::Lazy;
    use rust_stemmers::{Algorithm, Stemmer};
    use std::collections::HashSet;
    use unicode_segmentation::UnicodeSegmentation;

    /// Words shorter than this never count as keywords
    pub const MIN_KEYWORD_LENGTH: usize = 4;

    static STOP_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .collect()
    });

    static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

    /// Lowercased unicode words of `text`
    pub fn word_set(text: &str) -> HashSet<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }

    /// Stemmed, stop-word-free keywords of `text`
    pub fn extract_keywords(text: &str) -> HashSet<String> {
        text.unicode_words()
            .map(|word| word.to_lowercase())
            .filter(|word| {
                word.chars().count() >= MIN_KEYWORD_LENGTH
                    && !STOP_WORDS.contains(word)
                    && word.chars().any(|c| c.is_alphabetic())
            })
            .map(|word| STEMMER.stem(&word).to_string())
            .collect()
    }

    /// Normalise caller-provided keywords the same way extracted ones are
    pub fn normalize_keywords<'a>(keywords: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
        keywords
            .into_iter()
            .map(|k| STEMMER.stem(&k.trim().to_lowercase()).to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// The first `count` whitespace-separated words, joined by single spaces
    pub fn first_words(text: &str, count: usize) -> String {
        text.split_whitespace()
            .take(count)
            .collect::<Vec<_>>()
            .join(" ")
    }

}
