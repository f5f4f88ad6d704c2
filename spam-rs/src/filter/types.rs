use serde::Serialize;

use crate::classifiers::{Algorithm, Label};

/// Why a message got its label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entry", rename_all = "snake_case")]
pub enum VerdictReason {
    /// Scored by the configured classifier
    Model,
    /// Sender matched a whitelist entry
    Whitelisted(String),
    /// Sender matched a blacklist entry
    Blacklisted(String),
}

/// Result of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub label: Label,
    /// Probability that the message is spam, 0 to 1
    pub spam_probability: f64,
    /// Probability of the chosen label
    pub confidence: f64,
    pub algorithm: Algorithm,
    pub reason: VerdictReason,
}

impl Verdict {
    /// Verdict from a model score
    pub fn scored(algorithm: Algorithm, spam_probability: f64, threshold: f64) -> Self {
        let label = if spam_probability >= threshold {
            Label::Spam
        } else {
            Label::Ham
        };
        let confidence = match label {
            Label::Spam => spam_probability,
            Label::Ham => 1.0 - spam_probability,
        };

        Self {
            label,
            spam_probability,
            confidence,
            algorithm,
            reason: VerdictReason::Model,
        }
    }

    pub fn blacklisted(algorithm: Algorithm, entry: &str) -> Self {
        Self {
            label: Label::Spam,
            spam_probability: 1.0,
            confidence: 1.0,
            algorithm,
            reason: VerdictReason::Blacklisted(entry.to_string()),
        }
    }

    pub fn whitelisted(algorithm: Algorithm, entry: &str) -> Self {
        Self {
            label: Label::Ham,
            spam_probability: 0.0,
            confidence: 1.0,
            algorithm,
            reason: VerdictReason::Whitelisted(entry.to_string()),
        }
    }

    pub fn is_spam(&self) -> bool {
        self.label == Label::Spam
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_at_threshold_is_spam() {
        let verdict = Verdict::scored(Algorithm::Svm, 0.7, 0.7);
        assert!(verdict.is_spam());
        assert_eq!(verdict.confidence, 0.7);
        assert_eq!(verdict.reason, VerdictReason::Model);
    }

    #[test]
    fn test_scored_below_threshold_is_ham() {
        let verdict = Verdict::scored(Algorithm::NaiveBayes, 0.25, 0.7);
        assert_eq!(verdict.label, Label::Ham);
        assert!((verdict.confidence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_verdict_serializes() {
        let verdict = Verdict::blacklisted(Algorithm::NaiveBayes, "@spam.biz");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["label"], "spam");
        assert_eq!(json["algorithm"], "naive_bayes");
        assert_eq!(json["reason"]["kind"], "blacklisted");
        assert_eq!(json["reason"]["entry"], "@spam.biz");
    }
}
