//! Shared training and inference plumbing for the candle sequence models

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::vocab::{Padding, Vocabulary};
use super::Label;
use crate::error::{Result, SpamError};

/// Optimisation settings for a sequence model
#[derive(Debug, Clone)]
pub struct FitParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

/// Encode texts into a `(batch, max_len)` tensor of token indices
pub(crate) fn encode_batch(
    vocab: &Vocabulary,
    texts: &[&str],
    max_len: usize,
    padding: Padding,
    device: &Device,
) -> Result<Tensor> {
    let ids: Vec<u32> = texts
        .iter()
        .flat_map(|text| vocab.encode(text, max_len, padding))
        .collect();
    Ok(Tensor::from_vec(ids, (texts.len(), max_len), device)?)
}

/// Split labelled samples into texts and a float target tensor
pub(crate) fn split_samples<'a, I>(samples: I, device: &Device) -> Result<(Vec<&'a str>, Tensor)>
where
    I: IntoIterator<Item = (&'a str, Label)>,
{
    let (texts, targets): (Vec<&str>, Vec<f32>) = samples
        .into_iter()
        .map(|(text, label)| (text, if label == Label::Spam { 1.0 } else { 0.0 }))
        .unzip();

    let spam = targets.iter().filter(|t| **t > 0.5).count();
    if spam == 0 || spam == targets.len() {
        return Err(SpamError::Training(
            "sequence models need at least one spam and one ham example".to_string(),
        ));
    }

    let n = targets.len();
    Ok((texts, Tensor::from_vec(targets, n, device)?))
}

/// Binary cross entropy on raw logits, averaged over the batch
///
/// Uses `max(z, 0) - z * y + ln(1 + e^-|z|)` to stay finite for large logits.
pub(crate) fn bce_with_logits(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let positive = logits.relu()?;
    let product = (logits * targets)?;
    let soft = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    ((positive - product)? + soft)?.mean_all()
}

pub(crate) fn sigmoid(z: f32) -> f64 {
    1.0 / (1.0 + (-(z as f64)).exp())
}

/// Run mini-batch AdamW over all variables in `varmap`; returns the last epoch loss
pub(crate) fn fit<M: Module>(
    model: &M,
    varmap: &VarMap,
    ids: &Tensor,
    targets: &Tensor,
    params: &FitParams,
) -> Result<f32> {
    let device = ids.device();
    let n = ids.dim(0)?;
    let batch_size = params.batch_size.max(1);

    let mut optimizer = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: params.learning_rate,
            ..Default::default()
        },
    )?;

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut order: Vec<u32> = (0..n as u32).collect();
    let mut epoch_loss = 0f32;

    for epoch in 0..params.epochs {
        order.shuffle(&mut rng);
        let permutation = Tensor::from_vec(order.clone(), n, device)?;
        let ids = ids.index_select(&permutation, 0)?;
        let targets = targets.index_select(&permutation, 0)?;

        let mut total = 0f32;
        let mut batches = 0;
        for start in (0..n).step_by(batch_size) {
            let len = batch_size.min(n - start);
            let logits = model.forward(&ids.narrow(0, start, len)?)?;
            let loss = bce_with_logits(&logits, &targets.narrow(0, start, len)?)?;
            optimizer.backward_step(&loss)?;

            total += loss.to_dtype(DType::F32)?.to_scalar::<f32>()?;
            batches += 1;
        }

        epoch_loss = total / batches as f32;
        debug!("epoch {}/{} loss {:.4}", epoch + 1, params.epochs, epoch_loss);
    }

    Ok(epoch_loss)
}

/// Spam probability for a single encoded text
pub(crate) fn predict<M: Module>(
    model: &M,
    vocab: &Vocabulary,
    text: &str,
    max_len: usize,
    padding: Padding,
    device: &Device,
) -> Result<f64> {
    let ids = encode_batch(vocab, &[text], max_len, padding, device)?;
    let logits = model.forward(&ids)?.to_vec1::<f32>()?;
    let logit = logits
        .first()
        .copied()
        .ok_or_else(|| SpamError::Training("model produced no output".to_string()))?;
    Ok(sigmoid(logit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bce_matches_closed_form() {
        let device = Device::Cpu;
        let logits = Tensor::new(&[0.0f32, 2.0, -3.0], &device).unwrap();
        let targets = Tensor::new(&[1.0f32, 1.0, 0.0], &device).unwrap();

        let loss = bce_with_logits(&logits, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();

        let expected = ((2f32).ln() + (1.0 + (-2f32).exp()).ln() + (1.0 + (-3f32).exp()).ln()) / 3.0;
        assert!((loss - expected).abs() < 1e-5, "{} vs {}", loss, expected);
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_split_samples_requires_both_classes() {
        let result = split_samples([("free", Label::Spam)], &Device::Cpu);
        assert!(matches!(result, Err(SpamError::Training(_))));
    }

    #[test]
    fn test_encode_batch_shape() {
        let vocab = Vocabulary::build(["free money", "team meeting"], 100);
        let ids = encode_batch(&vocab, &["free money", "meeting"], 6, Padding::Post, &Device::Cpu).unwrap();
        assert_eq!(ids.dims(), &[2, 6]);
    }
}
