use animation_dataset::NormalizationStats;
use anyhow::Context;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use models::{Cvae, CvaeConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Files making up one saved run: weights, layer sizes, normalization, and loss history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    pub model: PathBuf,
    pub config: PathBuf,
    pub stats: PathBuf,
    pub history: PathBuf,
}

impl CheckpointPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("cvae.bin"),
            config: dir.join("cvae_config.json"),
            stats: dir.join("normalization.json"),
            history: dir.join("history.json"),
        }
    }
}

pub fn save_checkpoint<B: Backend>(
    model: &Cvae<B>,
    cfg: &CvaeConfig,
    stats: &NormalizationStats,
    paths: &CheckpointPaths,
) -> anyhow::Result<()> {
    if let Some(parent) = paths.model.parent() {
        fs::create_dir_all(parent)?;
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(paths.model.as_path(), &recorder)
        .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
    fs::write(&paths.config, serde_json::to_vec_pretty(cfg)?)
        .with_context(|| format!("failed to write {}", paths.config.display()))?;
    stats.save_json(&paths.stats)?;
    Ok(())
}

pub fn load_checkpoint<B: Backend>(
    paths: &CheckpointPaths,
    device: &B::Device,
) -> anyhow::Result<(Cvae<B>, CvaeConfig, NormalizationStats)> {
    let raw = fs::read(&paths.config)
        .with_context(|| format!("failed to read {}", paths.config.display()))?;
    let cfg: CvaeConfig = serde_json::from_slice(&raw)?;
    let stats = NormalizationStats::load_json(&paths.stats)?;
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    let model = Cvae::<B>::new(&cfg, device)
        .load_file(paths.model.as_path(), &recorder, device)
        .map_err(|e| {
            anyhow::anyhow!(
                "failed to load checkpoint {}: {e}",
                paths.model.display()
            )
        })?;
    Ok((model, cfg, stats))
}
