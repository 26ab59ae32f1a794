//! Manifest-backed dataset with lazy, per-item normalization.

use burn::data::dataset::Dataset;
use data_contracts::SnippetRecord;
use std::path::{Path, PathBuf};

use crate::normalize::{NormalizationStats, StatsAccumulator};
use crate::sample::{load_manifest, load_sample};
use crate::types::{DatasetError, DatasetResult, TrajectorySample};

/// Snippet files listed by a manifest, normalized with dataset-wide min/max.
///
/// Only the manifest and the statistics stay in memory; every `get` re-reads
/// its snippet from disk.
#[derive(Debug, Clone)]
pub struct AnimationDataset {
    sample_dir: PathBuf,
    records: Vec<SnippetRecord>,
    stats: NormalizationStats,
}

impl AnimationDataset {
    /// Read the manifest and compute statistics with one pass over every snippet.
    pub fn open(manifest: &Path, sample_dir: &Path) -> DatasetResult<Self> {
        let records = load_manifest(manifest)?;
        if records.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        let mut acc = StatsAccumulator::default();
        for record in &records {
            let sample = load_sample(&sample_dir.join(record.file_name()))?;
            acc.update(&sample)?;
        }
        let stats = acc.finish()?;
        tracing::info!(
            samples = records.len(),
            human_channels = stats.human_channels(),
            animation_channels = stats.animation_channels(),
            "opened animation dataset"
        );
        Ok(Self {
            sample_dir: sample_dir.to_path_buf(),
            records,
            stats,
        })
    }

    /// Reuse statistics computed elsewhere (e.g. saved next to a checkpoint).
    pub fn with_stats(
        manifest: &Path,
        sample_dir: &Path,
        stats: NormalizationStats,
    ) -> DatasetResult<Self> {
        let records = load_manifest(manifest)?;
        if records.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        Ok(Self {
            sample_dir: sample_dir.to_path_buf(),
            records,
            stats,
        })
    }

    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    pub fn records(&self) -> &[SnippetRecord] {
        &self.records
    }

    pub fn sample_path(&self, index: usize) -> Option<PathBuf> {
        self.records
            .get(index)
            .map(|r| self.sample_dir.join(r.file_name()))
    }

    /// Raw snippet values, without normalization.
    pub fn load_raw(&self, index: usize) -> DatasetResult<TrajectorySample> {
        let path = self
            .sample_path(index)
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })?;
        load_sample(&path)
    }

    pub fn try_get(&self, index: usize) -> DatasetResult<TrajectorySample> {
        self.stats.apply(self.load_raw(index)?)
    }
}

impl Dataset<TrajectorySample> for AnimationDataset {
    fn get(&self, index: usize) -> Option<TrajectorySample> {
        match self.try_get(index) {
            Ok(sample) => Some(sample),
            Err(DatasetError::IndexOutOfRange { .. }) => None,
            Err(err) => {
                tracing::warn!("failed to load sample {index}: {err}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
