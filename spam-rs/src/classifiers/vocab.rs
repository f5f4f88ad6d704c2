//! Token index vocabulary for the sequence models

use std::collections::HashMap;

use super::tokenizer::Tokenizer;

/// Index reserved for padding
pub const PAD_INDEX: u32 = 0;
/// Index for tokens outside the vocabulary
pub const OOV_INDEX: u32 = 1;

const FIRST_WORD_INDEX: u32 = 2;

/// Where padding goes when a sequence is shorter than the model input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    Pre,
    Post,
}

/// Maps the most frequent training tokens to dense indices
#[derive(Debug)]
pub struct Vocabulary {
    tokenizer: Tokenizer,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build a vocabulary of at most `max_words` indices, special ones included
    pub fn build<'a, I>(texts: I, max_words: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokenizer = Tokenizer::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for token in tokenizer.tokenize(text) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        // Most frequent first, ties broken alphabetically so builds are reproducible
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let capacity = max_words.saturating_sub(FIRST_WORD_INDEX as usize);
        let index = ranked
            .into_iter()
            .take(capacity)
            .enumerate()
            .map(|(i, (token, _))| (token, i as u32 + FIRST_WORD_INDEX))
            .collect();

        Self { tokenizer, index }
    }

    /// Number of indices, including padding and out-of-vocabulary
    pub fn len(&self) -> usize {
        self.index.len() + FIRST_WORD_INDEX as usize
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Index of a single (already stemmed) token
    pub fn get(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(OOV_INDEX)
    }

    /// Convert text to exactly `max_len` indices, truncating or padding
    pub fn encode(&self, text: &str, max_len: usize, padding: Padding) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .tokenizer
            .tokenize(text)
            .iter()
            .map(|token| self.get(token))
            .collect();
        ids.truncate(max_len);

        let fill = max_len - ids.len();
        match padding {
            Padding::Post => ids.extend(std::iter::repeat(PAD_INDEX).take(fill)),
            Padding::Pre => {
                let mut padded = vec![PAD_INDEX; fill];
                padded.extend(ids);
                ids = padded;
            }
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::build(
            ["free money free prize", "meeting tomorrow", "free meeting"],
            100,
        )
    }

    #[test]
    fn test_most_frequent_token_gets_first_index() {
        let vocab = vocab();
        assert_eq!(vocab.get("free"), FIRST_WORD_INDEX);
        assert_eq!(vocab.get("meet"), FIRST_WORD_INDEX + 1);
        assert_eq!(vocab.get("unknown"), OOV_INDEX);
        assert_eq!(vocab.len(), 7);
    }

    #[test]
    fn test_max_words_limits_vocabulary() {
        let vocab = Vocabulary::build(["alpha beta gamma delta"], 4);
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_encode_post_padding() {
        let vocab = vocab();
        let ids = vocab.encode("free lunch", 4, Padding::Post);
        assert_eq!(ids, vec![FIRST_WORD_INDEX, OOV_INDEX, PAD_INDEX, PAD_INDEX]);
    }

    #[test]
    fn test_encode_pre_padding() {
        let vocab = vocab();
        let ids = vocab.encode("free lunch", 4, Padding::Pre);
        assert_eq!(ids, vec![PAD_INDEX, PAD_INDEX, FIRST_WORD_INDEX, OOV_INDEX]);
    }

    #[test]
    fn test_encode_truncates() {
        let vocab = vocab();
        let ids = vocab.encode("free free free free free", 3, Padding::Post);
        assert_eq!(ids.len(), 3);
    }
}
