//! Recurrent neural network classifier
//!
//! Token embeddings feed a single Elman (tanh) recurrent layer whose final
//! hidden state goes through a dense sigmoid head.

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder, VarMap};
use tracing::info;

use super::neural::{self, FitParams};
use super::vocab::{Padding, Vocabulary};
use super::Label;
use crate::error::Result;

/// RNN hyperparameters
#[derive(Debug, Clone)]
pub struct RnnConfig {
    /// Vocabulary size, special indices included
    pub max_words: usize,
    /// Tokens per sequence
    pub max_len: usize,
    pub embedding_dim: usize,
    pub hidden_units: usize,
    pub fit: FitParams,
}

impl Default for RnnConfig {
    fn default() -> Self {
        Self {
            max_words: 5000,
            max_len: 200,
            embedding_dim: 50,
            hidden_units: 64,
            fit: FitParams {
                epochs: 5,
                batch_size: 32,
                learning_rate: 1e-2,
                seed: 42,
            },
        }
    }
}

struct RnnNet {
    embedding: Embedding,
    input: Linear,
    recurrent: Linear,
    output: Linear,
    hidden_units: usize,
}

impl RnnNet {
    fn new(vocab_size: usize, config: &RnnConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            embedding: candle_nn::embedding(vocab_size, config.embedding_dim, vb.pp("embedding"))?,
            input: candle_nn::linear(config.embedding_dim, config.hidden_units, vb.pp("input"))?,
            recurrent: candle_nn::linear_no_bias(config.hidden_units, config.hidden_units, vb.pp("recurrent"))?,
            output: candle_nn::linear(config.hidden_units, 1, vb.pp("output"))?,
            hidden_units: config.hidden_units,
        })
    }
}

impl Module for RnnNet {
    /// `(batch, seq)` token ids to `(batch,)` logits
    fn forward(&self, ids: &Tensor) -> candle_core::Result<Tensor> {
        let embedded = self.embedding.forward(ids)?;
        let (batch, seq_len, _) = embedded.dims3()?;

        let mut hidden = Tensor::zeros((batch, self.hidden_units), DType::F32, embedded.device())?;
        for t in 0..seq_len {
            let step = embedded.narrow(1, t, 1)?.squeeze(1)?;
            hidden = (self.input.forward(&step)? + self.recurrent.forward(&hidden)?)?.tanh()?;
        }

        self.output.forward(&hidden)?.squeeze(1)
    }
}

/// RNN spam detector
pub struct RnnClassifier {
    vocab: Vocabulary,
    net: RnnNet,
    max_len: usize,
    device: Device,
}

impl RnnClassifier {
    /// Build the vocabulary and train the network
    pub fn fit<'a, I>(samples: I, config: &RnnConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Label)>,
    {
        let device = Device::Cpu;
        let (texts, targets) = neural::split_samples(samples, &device)?;

        let vocab = Vocabulary::build(texts.iter().copied(), config.max_words);
        let ids = neural::encode_batch(&vocab, &texts, config.max_len, Padding::Pre, &device)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = RnnNet::new(vocab.len(), config, vb)?;

        let loss = neural::fit(&net, &varmap, &ids, &targets, &config.fit)?;
        info!(
            "Trained rnn on {} samples ({} tokens in vocabulary), final loss {:.4}",
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
        neural::predict(&self.net, &self.vocab, text, self.max_len, Padding::Pre, &self.device)
    }

    /// Vocabulary size used by the embedding layer
    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }
}

impl std::fmt::Debug for RnnClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RnnClassifier")
            .field("vocabulary", &self.vocab.len())
            .field("max_len", &self.max_len)
            .field("hidden_units", &self.net.hidden_units)
            .finish()
    }
}
