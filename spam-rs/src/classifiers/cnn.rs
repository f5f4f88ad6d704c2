//! Convolutional neural network classifier
//!
//! Embedding -> Conv1d + ReLU -> MaxPool -> flatten -> Dense + ReLU -> logit.

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Conv1d, Conv1dConfig, Embedding, Linear, VarBuilder, VarMap};
use tracing::info;

use super::neural::{self, FitParams};
use super::vocab::{Padding, Vocabulary};
use super::Label;
use crate::error::{Result, SpamError};

/// CNN hyperparameters
#[derive(Debug, Clone)]
pub struct CnnConfig {
    /// Vocabulary size, special indices included
    pub max_words: usize,
    /// Tokens per sequence
    pub max_len: usize,
    pub embedding_dim: usize,
    pub filters: usize,
    pub kernel_size: usize,
    pub pool_size: usize,
    pub dense_units: usize,
    pub fit: FitParams,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            max_words: 5000,
            max_len: 200,
            embedding_dim: 50,
            filters: 64,
            kernel_size: 3,
            pool_size: 2,
            dense_units: 50,
            fit: FitParams {
                epochs: 10,
                batch_size: 32,
                learning_rate: 1e-3,
                seed: 42,
            },
        }
    }
}

impl CnnConfig {
    /// Length of the sequence after convolution and pooling
    fn pooled_len(&self) -> Result<usize> {
        let conv_len = (self.max_len + 1)
            .checked_sub(self.kernel_size)
            .filter(|len| *len >= self.pool_size && self.pool_size > 0)
            .ok_or_else(|| {
                SpamError::Training(format!(
                    "cnn max_len {} too short for kernel {} and pool {}",
                    self.max_len, self.kernel_size, self.pool_size
                ))
            })?;
        Ok(conv_len / self.pool_size)
    }
}

struct CnnNet {
    embedding: Embedding,
    conv: Conv1d,
    dense: Linear,
    output: Linear,
    pool_size: usize,
}

impl CnnNet {
    fn new(vocab_size: usize, config: &CnnConfig, vb: VarBuilder) -> Result<Self> {
        let flat = config.filters * config.pooled_len()?;
        Ok(Self {
            embedding: candle_nn::embedding(vocab_size, config.embedding_dim, vb.pp("embedding"))?,
            conv: candle_nn::conv1d(
                config.embedding_dim,
                config.filters,
                config.kernel_size,
                Conv1dConfig::default(),
                vb.pp("conv"),
            )?,
            dense: candle_nn::linear(flat, config.dense_units, vb.pp("dense"))?,
            output: candle_nn::linear(config.dense_units, 1, vb.pp("output"))?,
            pool_size: config.pool_size,
        })
    }
}

impl Module for CnnNet {
    fn forward(&self, ids: &Tensor) -> candle_core::Result<Tensor> {
        // (batch, seq, emb) -> (batch, emb, seq) for the convolution
        let x = self.embedding.forward(ids)?.transpose(1, 2)?.contiguous()?;
        let x = self.conv.forward(&x)?.relu()?;
        let x = x
            .unsqueeze(2)?
            .max_pool2d((1, self.pool_size))?
            .flatten_from(1)?;
        let x = self.dense.forward(&x)?.relu()?;
        self.output.forward(&x)?.squeeze(1)
    }
}

/// CNN spam detector
pub struct CnnClassifier {
    vocab: Vocabulary,
    net: CnnNet,
    max_len: usize,
    device: Device,
}

impl CnnClassifier {
    /// Build the vocabulary and train the network
    pub fn fit<'a, I>(samples: I, config: &CnnConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Label)>,
    {
        let device = Device::Cpu;
        let (texts, targets) = neural::split_samples(samples, &device)?;

        let vocab = Vocabulary::build(texts.iter().copied(), config.max_words);
        let ids = neural::encode_batch(&vocab, &texts, config.max_len, Padding::Post, &device)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = CnnNet::new(vocab.len(), config, vb)?;

        let loss = neural::fit(&net, &varmap, &ids, &targets, &config.fit)?;
        info!(
            "Trained cnn on {} samples ({} tokens in vocabulary), final loss {:.4}",
            texts.len(),
            vocab.len(),
            loss
        );

        Ok(Self {
            vocab,
            net,
            max_len: config.max_len,
            device,
        })
    }

    /// Probability that the text is spam
    pub fn spam_probability(&self, text: &str) -> Result<f64> {
        neural::predict(&self.net, &self.vocab, text, self.max_len, Padding::Post, &self.device)
    }
}

impl std::fmt::Debug for CnnClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CnnClassifier")
            .field("vocabulary", &self.vocab.len())
            .field("max_len", &self.max_len)
            .field("pool_size", &self.net.pool_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CnnConfig {
        CnnConfig {
            max_words: 100,
            max_len: 8,
            embedding_dim: 8,
            filters: 8,
            kernel_size: 3,
            pool_size: 2,
            dense_units: 8,
            fit: FitParams {
                epochs: 150,
                batch_size: 8,
                learning_rate: 1e-2,
                seed: 7,
            },
        }
    }

    fn samples() -> Vec<(&'static str, Label)> {
        vec![
            ("free lottery prize winner", Label::Spam),
            ("claim your free cash prize", Label::Spam),
            ("winner winner free money", Label::Spam),
            ("team meeting moved to friday", Label::Ham),
            ("project review notes attached", Label::Ham),
            ("lunch with the team tomorrow", Label::Ham),
        ]
    }

    #[test]
    fn test_pooled_len() {
        assert_eq!(small_config().pooled_len().unwrap(), 3);
        assert_eq!(CnnConfig::default().pooled_len().unwrap(), 99);

        let config = CnnConfig {
            max_len: 2,
            ..small_config()
        };
        assert!(config.pooled_len().is_err());
    }

    #[test]
    fn test_cnn_fits_training_data() {
        let model = CnnClassifier::fit(samples(), &small_config()).unwrap();

        for (text, label) in samples() {
            let p = model.spam_probability(text).unwrap();
            assert!((0.0..=1.0).contains(&p));
            match label {
                Label::Spam => assert!(p > 0.5, "{} scored {}", text, p),
                Label::Ham => assert!(p < 0.5, "{} scored {}", text, p),
            }
        }
    }

    #[test]
    fn test_cnn_rejects_short_sequences() {
        let config = CnnConfig {
            max_len: 2,
            ..small_config()
        };
        let result = CnnClassifier::fit(samples(), &config);
        assert!(matches!(result, Err(SpamError::Training(_))));
    }
}
