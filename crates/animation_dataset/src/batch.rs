//! Batch iteration for training and evaluation.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::AnimationDataset;
use crate::types::{DatasetError, DatasetResult, TrajectorySample};

pub struct TrajectoryBatch<B: Backend> {
    /// Shape `[batch, frames]`.
    pub times: Tensor<B, 2>,
    /// Shape `[batch, frames, human_channels]`; the model's condition.
    pub human_input: Tensor<B, 3>,
    /// Shape `[batch, frames, animation_channels]`; the model's target.
    pub animation: Tensor<B, 3>,
}

impl<B: Backend> TrajectoryBatch<B> {
    pub fn len(&self) -> usize {
        self.times.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stack samples of identical shape into batch tensors.
pub fn collate<B: Backend>(
    samples: &[TrajectorySample],
    device: &B::Device,
) -> DatasetResult<TrajectoryBatch<B>> {
    let first = samples
        .first()
        .ok_or_else(|| DatasetError::ShapeMismatch("cannot collate empty batch".into()))?;
    let frames = first.frames();
    let hc = first.human_channels;
    let ac = first.animation_channels;
    let batch = samples.len();

    let mut times = Vec::with_capacity(batch * frames);
    let mut human = Vec::with_capacity(batch * frames * hc);
    let mut animation = Vec::with_capacity(batch * frames * ac);
    for (i, s) in samples.iter().enumerate() {
        if s.frames() != frames || s.human_channels != hc || s.animation_channels != ac {
            return Err(DatasetError::ShapeMismatch(format!(
                "sample {i} is {}x{}/{}, expected {frames}x{hc}/{ac}",
                s.frames(),
                s.human_channels,
                s.animation_channels
            )));
        }
        if s.human_input.len() != frames * hc || s.animation.len() != frames * ac {
            return Err(DatasetError::ShapeMismatch(format!(
                "sample {i} buffers do not match its frame count"
            )));
        }
        times.extend_from_slice(&s.times);
        human.extend_from_slice(&s.human_input);
        animation.extend_from_slice(&s.animation);
    }

    Ok(TrajectoryBatch {
        times: Tensor::<B, 2>::from_data(TensorData::new(times, [batch, frames]), device),
        human_input: Tensor::<B, 3>::from_data(
            TensorData::new(human, [batch, frames, hc]),
            device,
        ),
        animation: Tensor::<B, 3>::from_data(
            TensorData::new(animation, [batch, frames, ac]),
            device,
        ),
    })
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// Reshuffle indices at the start of every epoch.
    pub shuffle: bool,
    /// Base seed; epoch `e` shuffles with `seed + e`.
    pub seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            shuffle: false,
            seed: None,
        }
    }
}

/// One pass over a subset of dataset indices. The last batch may be short.
pub struct BatchIter {
    indices: Vec<usize>,
    cursor: usize,
    batch_size: usize,
}

impl BatchIter {
    pub fn for_epoch(indices: &[usize], cfg: &BatchConfig, epoch: usize) -> Self {
        let mut indices = indices.to_vec();
        if cfg.shuffle {
            let mut rng = match cfg.seed {
                Some(seed) => rand::rngs::StdRng::seed_from_u64(seed.wrapping_add(epoch as u64)),
                None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
            };
            indices.shuffle(&mut rng);
        }
        Self {
            indices,
            cursor: 0,
            batch_size: cfg.batch_size.max(1),
        }
    }

    /// Number of samples this iterator will yield in total.
    pub fn total(&self) -> usize {
        self.indices.len()
    }

    pub fn batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    pub fn next_samples(
        &mut self,
        dataset: &AnimationDataset,
    ) -> DatasetResult<Option<Vec<TrajectorySample>>> {
        if self.cursor >= self.indices.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.batch_size).min(self.indices.len());
        let slice = &self.indices[self.cursor..end];
        self.cursor = end;
        let samples = slice
            .iter()
            .map(|idx| dataset.try_get(*idx))
            .collect::<DatasetResult<Vec<_>>>()?;
        Ok(Some(samples))
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        dataset: &AnimationDataset,
        device: &B::Device,
    ) -> DatasetResult<Option<TrajectoryBatch<B>>> {
        match self.next_samples(dataset)? {
            Some(samples) => collate(&samples, device).map(Some),
            None => Ok(None),
        }
    }
}
