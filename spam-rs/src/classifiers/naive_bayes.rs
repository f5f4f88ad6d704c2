//! Multinomial Naive Bayes classifier
//!
//! Word-frequency model with Laplace smoothing. Tokens never seen during
//! training carry no evidence and are skipped.

use std::collections::{HashMap, HashSet};

use super::tokenizer::Tokenizer;
use super::Label;
use crate::error::{Result, SpamError};

/// Bayesian spam classifier
#[derive(Debug, Default)]
pub struct NaiveBayes {
    tokenizer: Tokenizer,
    spam_tokens: HashMap<String, u32>,
    ham_tokens: HashMap<String, u32>,
    spam_count: u32,
    ham_count: u32,
    spam_total: u64,
    ham_total: u64,
}

impl NaiveBayes {
    /// Create an untrained classifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Train on labelled texts; both classes must be represented
    pub fn fit<'a, I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Label)>,
    {
        let mut model = Self::new();
        for (text, label) in samples {
            model.learn(text, label);
        }

        if model.spam_count == 0 || model.ham_count == 0 {
            return Err(SpamError::Training(
                "naive_bayes needs at least one spam and one ham example".to_string(),
            ));
        }

        Ok(model)
    }

    /// Learn from a single message
    pub fn learn(&mut self, text: &str, label: Label) {
        let tokens = self.tokenizer.tokenize(text);

        let (counts, docs, total) = match label {
            Label::Spam => (&mut self.spam_tokens, &mut self.spam_count, &mut self.spam_total),
            Label::Ham => (&mut self.ham_tokens, &mut self.ham_count, &mut self.ham_total),
        };

        *docs += 1;
        *total += tokens.len() as u64;
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    /// Posterior probability that the text is spam
    pub fn spam_probability(&self, text: &str) -> Result<f64> {
        if self.spam_count == 0 || self.ham_count == 0 {
            return Err(SpamError::NotTrained(
                "naive_bayes has not seen both spam and ham".to_string(),
            ));
        }

        let documents = (self.spam_count + self.ham_count) as f64;
        let vocabulary = self.vocabulary_size() as f64;
        let spam_denominator = self.spam_total as f64 + vocabulary;
        let ham_denominator = self.ham_total as f64 + vocabulary;

        let mut log_spam = (self.spam_count as f64 / documents).ln();
        let mut log_ham = (self.ham_count as f64 / documents).ln();

        for token in self.tokenizer.tokenize(text) {
            let spam_hits = self.spam_tokens.get(&token).copied().unwrap_or(0);
            let ham_hits = self.ham_tokens.get(&token).copied().unwrap_or(0);
            if spam_hits == 0 && ham_hits == 0 {
                continue;
            }

            log_spam += ((spam_hits as f64 + 1.0) / spam_denominator).ln();
            log_ham += ((ham_hits as f64 + 1.0) / ham_denominator).ln();
        }

        Ok(1.0 / (1.0 + (log_ham - log_spam).exp()))
    }

    /// Number of distinct tokens across both classes
    pub fn vocabulary_size(&self) -> usize {
        let spam: HashSet<&String> = self.spam_tokens.keys().collect();
        spam.len() + self.ham_tokens.keys().filter(|t| !spam.contains(t)).count()
    }

    /// Distinct tokens seen in spam
    pub fn spam_token_count(&self) -> usize {
        self.spam_tokens.len()
    }

    /// Distinct tokens seen in ham
    pub fn ham_token_count(&self) -> usize {
        self.ham_tokens.len()
    }

    /// Messages learned as (spam, ham)
    pub fn training_counts(&self) -> (u32, u32) {
        (self.spam_count, self.ham_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> NaiveBayes {
        NaiveBayes::fit([
            ("Hey there! Wanna grab a coffee tomorrow?", Label::Ham),
            ("Free lottery tickets now!!! Click here", Label::Spam),
            ("Could we schedule a meeting for next week?", Label::Ham),
            ("Congratulations, you've won a $1000 gift card!", Label::Spam),
            ("Reminder: Project deadline is Friday.", Label::Ham),
        ])
        .unwrap()
    }

    #[test]
    fn test_training_counts() {
        let model = trained();
        assert_eq!(model.training_counts(), (2, 3));
        assert!(model.spam_token_count() > 0);
        assert!(model.ham_token_count() > 0);
        assert!(model.vocabulary_size() >= model.spam_token_count());
    }

    #[test]
    fn test_spam_scores_higher_than_ham() {
        let model = trained();
        let spam = model.spam_probability("Free lottery gift card, click now").unwrap();
        let ham = model.spam_probability("Can we schedule the project meeting?").unwrap();

        assert!(spam > 0.5, "spam probability {}", spam);
        assert!(ham < 0.5, "ham probability {}", ham);
    }

    #[test]
    fn test_unknown_words_fall_back_to_prior() {
        let model = trained();
        let p = model.spam_probability("zzzz qqqq").unwrap();
        assert!((p - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_fit_requires_both_classes() {
        let result = NaiveBayes::fit([("free money", Label::Spam)]);
        assert!(matches!(result, Err(SpamError::Training(_))));
    }

    #[test]
    fn test_untrained_model_errors() {
        let model = NaiveBayes::new();
        assert!(matches!(model.spam_probability("hello"), Err(SpamError::NotTrained(_))));
    }
}
