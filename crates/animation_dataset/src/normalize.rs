//! Dataset-wide per-channel min/max scaling into [0, 1].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::{DatasetError, DatasetResult, TrajectorySample};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub human_min: Vec<f32>,
    pub human_max: Vec<f32>,
    pub animation_min: Vec<f32>,
    pub animation_max: Vec<f32>,
}

/// Running element-wise min/max, fed one sample at a time.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    stats: Option<NormalizationStats>,
}

fn column_extrema(values: &[f32], channels: usize) -> (Vec<f32>, Vec<f32>) {
    if channels == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut lo = vec![f32::INFINITY; channels];
    let mut hi = vec![f32::NEG_INFINITY; channels];
    for row in values.chunks(channels) {
        for (c, v) in row.iter().enumerate() {
            lo[c] = lo[c].min(*v);
            hi[c] = hi[c].max(*v);
        }
    }
    (lo, hi)
}

fn merge(acc: &mut [f32], other: &[f32], pick: fn(f32, f32) -> f32) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a = pick(*a, *b);
    }
}

impl StatsAccumulator {
    pub fn update(&mut self, sample: &TrajectorySample) -> DatasetResult<()> {
        let (h_lo, h_hi) = column_extrema(&sample.human_input, sample.human_channels);
        let (a_lo, a_hi) = column_extrema(&sample.animation, sample.animation_channels);
        match &mut self.stats {
            None => {
                self.stats = Some(NormalizationStats {
                    human_min: h_lo,
                    human_max: h_hi,
                    animation_min: a_lo,
                    animation_max: a_hi,
                });
            }
            Some(stats) => {
                if stats.human_min.len() != h_lo.len() {
                    return Err(DatasetError::ChannelMismatch {
                        group: "human_input",
                        expected: stats.human_min.len(),
                        found: h_lo.len(),
                    });
                }
                if stats.animation_min.len() != a_lo.len() {
                    return Err(DatasetError::ChannelMismatch {
                        group: "animation",
                        expected: stats.animation_min.len(),
                        found: a_lo.len(),
                    });
                }
                merge(&mut stats.human_min, &h_lo, f32::min);
                merge(&mut stats.human_max, &h_hi, f32::max);
                merge(&mut stats.animation_min, &a_lo, f32::min);
                merge(&mut stats.animation_max, &a_hi, f32::max);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> DatasetResult<NormalizationStats> {
        self.stats.ok_or(DatasetError::EmptyDataset)
    }
}

/// `(v - min) / (max - min)` per channel; a flat channel maps to 0.
fn scale(values: &[f32], min: &[f32], max: &[f32]) -> Vec<f32> {
    if min.is_empty() || min.len() != max.len() {
        return values.to_vec();
    }
    let channels = min.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let c = i % channels;
            let range = max[c] - min[c];
            if range == 0.0 {
                0.0
            } else {
                (v - min[c]) / range
            }
        })
        .collect()
}

fn unscale(values: &[f32], min: &[f32], max: &[f32]) -> Vec<f32> {
    if min.is_empty() || min.len() != max.len() {
        return values.to_vec();
    }
    let channels = min.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let c = i % channels;
            min[c] + v * (max[c] - min[c])
        })
        .collect()
}

impl NormalizationStats {
    pub fn from_samples<'a>(
        samples: impl IntoIterator<Item = &'a TrajectorySample>,
    ) -> DatasetResult<Self> {
        let mut acc = StatsAccumulator::default();
        for sample in samples {
            acc.update(sample)?;
        }
        acc.finish()
    }

    pub fn human_channels(&self) -> usize {
        self.human_min.len()
    }

    pub fn animation_channels(&self) -> usize {
        self.animation_min.len()
    }

    pub fn normalize_human(&self, values: &[f32]) -> Vec<f32> {
        scale(values, &self.human_min, &self.human_max)
    }

    pub fn normalize_animation(&self, values: &[f32]) -> Vec<f32> {
        scale(values, &self.animation_min, &self.animation_max)
    }

    pub fn denormalize_human(&self, values: &[f32]) -> Vec<f32> {
        unscale(values, &self.human_min, &self.human_max)
    }

    pub fn denormalize_animation(&self, values: &[f32]) -> Vec<f32> {
        unscale(values, &self.animation_min, &self.animation_max)
    }

    /// Normalize both channel groups; `times` is passed through untouched.
    pub fn apply(&self, sample: TrajectorySample) -> DatasetResult<TrajectorySample> {
        if sample.human_channels != self.human_channels() {
            return Err(DatasetError::ChannelMismatch {
                group: "human_input",
                expected: self.human_channels(),
                found: sample.human_channels,
            });
        }
        if sample.animation_channels != self.animation_channels() {
            return Err(DatasetError::ChannelMismatch {
                group: "animation",
                expected: self.animation_channels(),
                found: sample.animation_channels,
            });
        }
        Ok(TrajectorySample {
            human_input: self.normalize_human(&sample.human_input),
            animation: self.normalize_animation(&sample.animation),
            ..sample
        })
    }

    pub fn save_json(&self, path: &Path) -> DatasetResult<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_json(path: &Path) -> DatasetResult<Self> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(human: Vec<f32>, animation: Vec<f32>) -> TrajectorySample {
        TrajectorySample {
            times: vec![0.0; human.len() / 2],
            human_input: human,
            human_channels: 2,
            animation,
            animation_channels: 2,
        }
    }

    #[test]
    fn extrema_span_every_sample() {
        let a = sample(vec![0.0, 10.0, 4.0, 12.0], vec![1.0, 1.0, 2.0, 2.0]);
        let b = sample(vec![-2.0, 11.0, 1.0, 20.0], vec![0.5, 3.0, 1.5, 1.0]);
        let stats = NormalizationStats::from_samples([&a, &b]).unwrap();
        assert_eq!(stats.human_min, vec![-2.0, 10.0]);
        assert_eq!(stats.human_max, vec![4.0, 20.0]);
        assert_eq!(stats.animation_min, vec![0.5, 1.0]);
        assert_eq!(stats.animation_max, vec![2.0, 3.0]);
    }

    #[test]
    fn flat_channel_maps_to_zero() {
        let a = sample(vec![3.0, 0.0, 3.0, 5.0], vec![0.0, 0.0, 1.0, 1.0]);
        let stats = NormalizationStats::from_samples([&a]).unwrap();
        let out = stats.normalize_human(&a.human_input);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn denormalize_inverts_normalize() {
        let a = sample(vec![-1.0, 2.0, 3.0, 6.0], vec![10.0, -5.0, 30.0, 5.0]);
        let stats = NormalizationStats::from_samples([&a]).unwrap();
        let back = stats.denormalize_animation(&stats.normalize_animation(&a.animation));
        for (x, y) in back.iter().zip(&a.animation) {
            assert_relative_eq!(*x, *y, epsilon = 1e-5);
        }
        let back = stats.denormalize_human(&stats.normalize_human(&a.human_input));
        assert_eq!(back.len(), a.human_input.len());
        for (x, y) in back.iter().zip(&a.human_input) {
            assert_relative_eq!(*x, *y, epsilon = 1e-5);
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        let none: [&TrajectorySample; 0] = [];
        assert!(matches!(
            NormalizationStats::from_samples(none),
            Err(DatasetError::EmptyDataset)
        ));
    }

    #[test]
    fn channel_count_must_agree() {
        let a = sample(vec![0.0, 0.0], vec![0.0, 0.0]);
        let mut b = a.clone();
        b.human_channels = 1;
        let err = NormalizationStats::from_samples([&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ChannelMismatch {
                group: "human_input",
                ..
            }
        ));
    }
}
