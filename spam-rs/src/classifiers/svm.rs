//! Linear support vector machine
//!
//! Bag-of-words count vectors (L2 normalised) trained with the Pegasos
//! sub-gradient method. Margins are turned into probabilities with a
//! Platt sigmoid fitted on the training set.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

use super::tokenizer::Tokenizer;
use super::Label;
use crate::error::{Result, SpamError};

/// SVM training parameters
#[derive(Debug, Clone)]
pub struct SvmConfig {
    /// Regularization strength
    pub lambda: f64,
    /// Passes over the training set
    pub epochs: usize,
    /// Seed for sample shuffling
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            epochs: 50,
            seed: 42,
        }
    }
}

type SparseVector = Vec<(usize, f64)>;

/// Linear SVM spam classifier
#[derive(Debug)]
pub struct LinearSvm {
    tokenizer: Tokenizer,
    features: HashMap<String, usize>,
    weights: Vec<f64>,
    bias: f64,
    platt_a: f64,
    platt_b: f64,
}

impl LinearSvm {
    /// Train on labelled texts; both classes must be represented
    pub fn fit<'a, I>(samples: I, config: &SvmConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Label)>,
    {
        let tokenizer = Tokenizer::new();
        let mut features: HashMap<String, usize> = HashMap::new();
        let mut raw: Vec<(Vec<String>, f64)> = Vec::new();

        for (text, label) in samples {
            let tokens = tokenizer.tokenize(text);
            for token in &tokens {
                let next = features.len();
                features.entry(token.clone()).or_insert(next);
            }
            let y = match label {
                Label::Spam => 1.0,
                Label::Ham => -1.0,
            };
            raw.push((tokens, y));
        }

        let positives = raw.iter().filter(|(_, y)| *y > 0.0).count();
        if positives == 0 || positives == raw.len() {
            return Err(SpamError::Training(
                "svm needs at least one spam and one ham example".to_string(),
            ));
        }

        let mut model = Self {
            tokenizer,
            weights: vec![0.0; features.len()],
            features,
            bias: 0.0,
            platt_a: 1.0,
            platt_b: 0.0,
        };

        let samples: Vec<(SparseVector, f64)> = raw
            .iter()
            .map(|(tokens, y)| (model.vectorize_tokens(tokens), *y))
            .collect();

        model.train_pegasos(&samples, config);

        let margins: Vec<(f64, f64)> = samples
            .iter()
            .map(|(x, y)| (model.margin(x), *y))
            .collect();
        model.fit_platt(&margins);

        Ok(model)
    }

    /// Pegasos with the bias folded in as an always-on feature
    fn train_pegasos(&mut self, samples: &[(SparseVector, f64)], config: &SvmConfig) {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut step = 1.0f64;

        for _ in 0..config.epochs {
            order.shuffle(&mut rng);

            for &i in &order {
                let (x, y) = &samples[i];
                let eta = 1.0 / (config.lambda * step);
                let margin = y * self.margin(x);

                let decay = 1.0 - eta * config.lambda;
                self.weights.iter_mut().for_each(|w| *w *= decay);
                self.bias *= decay;

                if margin < 1.0 {
                    for &(j, value) in x {
                        self.weights[j] += eta * y * value;
                    }
                    self.bias += eta * y;
                }

                // Project onto the ball of radius 1/sqrt(lambda)
                let norm = (self.weights.iter().map(|w| w * w).sum::<f64>() + self.bias * self.bias).sqrt();
                let radius = 1.0 / config.lambda.sqrt();
                if norm > radius {
                    let scale = radius / norm;
                    self.weights.iter_mut().for_each(|w| *w *= scale);
                    self.bias *= scale;
                }

                step += 1.0;
            }
        }
    }

    /// Fit `p = sigmoid(a * margin + b)` by gradient descent on log loss
    fn fit_platt(&mut self, margins: &[(f64, f64)]) {
        let positives = margins.iter().filter(|(_, y)| *y > 0.0).count() as f64;
        let negatives = margins.len() as f64 - positives;
        // Platt's smoothed targets keep the sigmoid from saturating
        let high = (positives + 1.0) / (positives + 2.0);
        let low = 1.0 / (negatives + 2.0);

        let n = margins.len() as f64;
        let (mut a, mut b) = (1.0, 0.0);
        for _ in 0..500 {
            let (mut grad_a, mut grad_b) = (0.0, 0.0);
            for &(f, y) in margins {
                let target = if y > 0.0 { high } else { low };
                let err = sigmoid(a * f + b) - target;
                grad_a += err * f;
                grad_b += err;
            }
            a -= 0.5 * grad_a / n;
            b -= 0.5 * grad_b / n;
        }

        self.platt_a = a;
        self.platt_b = b;
    }

    fn vectorize_tokens(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&j) = self.features.get(token) {
                *counts.entry(j).or_insert(0.0) += 1.0;
            }
        }

        let norm = counts.values().map(|c| c * c).sum::<f64>().sqrt();
        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(j, c)| (j, if norm > 0.0 { c / norm } else { c }))
            .collect();
        vector.sort_by_key(|(j, _)| *j);
        vector
    }

    fn margin(&self, x: &SparseVector) -> f64 {
        x.iter().map(|&(j, v)| self.weights[j] * v).sum::<f64>() + self.bias
    }

    /// Signed distance from the separating hyperplane; positive means spam
    pub fn decision_function(&self, text: &str) -> f64 {
        let tokens = self.tokenizer.tokenize(text);
        self.margin(&self.vectorize_tokens(&tokens))
    }

    /// Calibrated probability that the text is spam
    pub fn spam_probability(&self, text: &str) -> Result<f64> {
        let f = self.decision_function(text);
        Ok(sigmoid(self.platt_a * f + self.platt_b))
    }

    /// Predicted label together with the probability of that label
    pub fn predict_with_confidence(&self, text: &str) -> Result<(Label, f64)> {
        let p = self.spam_probability(text)?;
        Ok(if p > 0.5 { (Label::Spam, p) } else { (Label::Ham, 1.0 - p) })
    }

    /// Number of distinct features
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
