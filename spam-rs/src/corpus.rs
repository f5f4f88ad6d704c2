//! Labelled training corpus

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifiers::Label;
use crate::error::Result;

/// One labelled email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEmail {
    pub text: String,
    pub label: Label,
}

impl LabeledEmail {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Training data for the classifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingSet {
    samples: Vec<LabeledEmail>,
}

impl TrainingSet {
    pub fn new(samples: Vec<LabeledEmail>) -> Self {
        Self { samples }
    }

    /// Load a JSON array of `{"text": ..., "label": "spam" | "ham"}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Small built-in corpus for demos and smoke tests
    pub fn sample() -> Self {
        let spam = [
            "Free lottery tickets now!!! Click here",
            "Congratulations, you've won a $1000 gift card!",
            "Win a free vacation now, claim your prize today",
            "Limited time offer: cheap meds, act now",
            "You have been selected for a cash reward, click the link",
            "Earn money fast working from home, guaranteed income",
        ];
        let ham = [
            "Hey there! Wanna grab a coffee tomorrow?",
            "Could we schedule a meeting for next week?",
            "Reminder: Project deadline is Friday.",
            "Please review the attached document before our call",
            "Lunch with the team is moved to Thursday",
            "Here are the notes from today's design review",
        ];

        let samples = spam
            .iter()
            .map(|text| LabeledEmail::new(*text, Label::Spam))
            .chain(ham.iter().map(|text| LabeledEmail::new(*text, Label::Ham)))
            .collect();

        Self { samples }
    }

    pub fn samples(&self) -> &[LabeledEmail] {
        &self.samples
    }

    /// `(text, label)` pairs as the classifiers consume them
    pub fn pairs(&self) -> impl Iterator<Item = (&str, Label)> {
        self.samples.iter().map(|s| (s.text.as_str(), s.label))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn spam_count(&self) -> usize {
        self.samples.iter().filter(|s| s.label == Label::Spam).count()
    }

    pub fn ham_count(&self) -> usize {
        self.samples.iter().filter(|s| s.label == Label::Ham).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_corpus_is_balanced() {
        let set = TrainingSet::sample();
        assert_eq!(set.len(), 12);
        assert_eq!(set.spam_count(), 6);
        assert_eq!(set.ham_count(), 6);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"text": "Free money", "label": "spam"},
                {"text": "Team sync", "label": "ham"},
                {"text": "Status update", "label": "not_spam"}
            ]"#,
        )
        .unwrap();

        let set = TrainingSet::from_file(file.path()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.spam_count(), 1);
        assert_eq!(set.ham_count(), 2);
        assert_eq!(set.pairs().next(), Some(("Free money", Label::Spam)));
    }

    #[test]
    fn test_from_file_rejects_unknown_label() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"text": "hi", "label": "maybe"}]"#).unwrap();
        assert!(TrainingSet::from_file(file.path()).is_err());
    }
}
