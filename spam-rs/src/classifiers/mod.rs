//! Classifier adapters
//!
//! Four spam classifiers behind one enum, [`Model`]:
//! - [`naive_bayes`]: multinomial Naive Bayes with Laplace smoothing
//! - [`svm`]: linear SVM with Platt-scaled confidence
//! - [`rnn`]: embedding + recurrent network (candle)
//! - [`cnn`]: embedding + 1D convolution (candle)

pub mod cnn;
pub mod naive_bayes;
pub mod neural;
pub mod rnn;
pub mod svm;
pub mod tokenizer;
pub mod vocab;

pub use cnn::{CnnClassifier, CnnConfig};
pub use naive_bayes::NaiveBayes;
pub use neural::FitParams;
pub use rnn::{RnnClassifier, RnnConfig};
pub use svm::{LinearSvm, SvmConfig};
pub use tokenizer::Tokenizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SpamError};

/// Binary classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    #[serde(alias = "not_spam")]
    Ham,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Spam => write!(f, "spam"),
            Label::Ham => write!(f, "ham"),
        }
    }
}

/// Supported classification algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    NaiveBayes,
    Svm,
    Rnn,
    Cnn,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [Algorithm::NaiveBayes, Algorithm::Svm, Algorithm::Rnn, Algorithm::Cnn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::NaiveBayes => "naive_bayes",
            Algorithm::Svm => "svm",
            Algorithm::Rnn => "rnn",
            Algorithm::Cnn => "cnn",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SpamError;

    /// Case-insensitive; `_`, `-` and spaces are ignored (`NaiveBayes`, `naive-bayes`)
    fn from_str(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "naivebayes" | "bayes" | "nb" => Ok(Algorithm::NaiveBayes),
            "svm" => Ok(Algorithm::Svm),
            "rnn" => Ok(Algorithm::Rnn),
            "cnn" => Ok(Algorithm::Cnn),
            _ => Err(SpamError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

/// Hyperparameters for every algorithm
#[derive(Debug, Clone, Default)]
pub struct TrainingOptions {
    pub svm: SvmConfig,
    pub rnn: RnnConfig,
    pub cnn: CnnConfig,
}

/// A trained classifier of any supported kind
#[derive(Debug)]
pub enum Model {
    NaiveBayes(NaiveBayes),
    Svm(LinearSvm),
    Rnn(RnnClassifier),
    Cnn(CnnClassifier),
}

impl Model {
    /// Train a model of the given kind on labelled texts
    pub fn train<'a, I>(algorithm: Algorithm, samples: I, options: &TrainingOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Label)>,
    {
        Ok(match algorithm {
            Algorithm::NaiveBayes => Model::NaiveBayes(NaiveBayes::fit(samples)?),
            Algorithm::Svm => Model::Svm(LinearSvm::fit(samples, &options.svm)?),
            Algorithm::Rnn => Model::Rnn(RnnClassifier::fit(samples, &options.rnn)?),
            Algorithm::Cnn => Model::Cnn(CnnClassifier::fit(samples, &options.cnn)?),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Model::NaiveBayes(_) => Algorithm::NaiveBayes,
            Model::Svm(_) => Algorithm::Svm,
            Model::Rnn(_) => Algorithm::Rnn,
            Model::Cnn(_) => Algorithm::Cnn,
        }
    }

    /// Probability in [0, 1] that the text is spam
    pub fn spam_probability(&self, text: &str) -> Result<f64> {
        match self {
            Model::NaiveBayes(model) => model.spam_probability(text),
            Model::Svm(model) => model.spam_probability(text),
            Model::Rnn(model) => model.spam_probability(text),
            Model::Cnn(model) => model.spam_probability(text),
        }
    }
}

impl From<NaiveBayes> for Model {
    fn from(model: NaiveBayes) -> Self {
        Model::NaiveBayes(model)
    }
}

impl From<LinearSvm> for Model {
    fn from(model: LinearSvm) -> Self {
        Model::Svm(model)
    }
}

impl From<RnnClassifier> for Model {
    fn from(model: RnnClassifier) -> Self {
        Model::Rnn(model)
    }
}

impl From<CnnClassifier> for Model {
    fn from(model: CnnClassifier) -> Self {
        Model::Cnn(model)
    }
}
