//! Trajectory dataset loading, normalization, splitting, and Burn-compatible batching.
//!
//! This crate provides:
//! - Manifest and per-snippet CSV loading
//! - Dataset-wide per-channel min/max statistics
//! - `AnimationDataset`, which normalizes lazily on every `get`
//! - Seeded train/test splits and batch iteration into Burn tensors

pub mod batch;
pub mod dataset;
pub mod normalize;
pub mod sample;
pub mod splits;
pub mod types;

pub use batch::{collate, BatchConfig, BatchIter, TrajectoryBatch};
pub use dataset::AnimationDataset;
pub use normalize::{NormalizationStats, StatsAccumulator};
pub use sample::{load_manifest, load_sample};
pub use splits::random_split;
pub use types::*;
