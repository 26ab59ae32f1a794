use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Round to 4 decimal places, as losses are reported.
pub fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}

/// A test-set example captured for plotting (normalized units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedSample {
    pub times: Vec<f32>,
    pub original_animation: Vec<f32>,
    pub human_input: Vec<f32>,
    pub reconstructed_animation: Vec<f32>,
    pub animation_channels: usize,
    pub human_channels: usize,
}

impl CapturedSample {
    pub fn original_points(&self) -> Vec<(f32, f32)> {
        animation_dataset::xy_points(&self.original_animation, self.animation_channels)
    }

    pub fn human_points(&self) -> Vec<(f32, f32)> {
        animation_dataset::xy_points(&self.human_input, self.human_channels)
    }

    pub fn reconstructed_points(&self) -> Vec<(f32, f32)> {
        animation_dataset::xy_points(&self.reconstructed_animation, self.animation_channels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub test_loss: f64,
}

/// Per-epoch losses (per sample, rounded) plus the final epoch's captured samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainHistory {
    pub train_losses: Vec<f64>,
    pub test_losses: Vec<f64>,
    pub samples: Vec<CapturedSample>,
}

impl TrainHistory {
    pub fn record(&mut self, train_loss: f64, test_loss: f64) -> EpochMetrics {
        self.train_losses.push(round4(train_loss));
        self.test_losses.push(round4(test_loss));
        EpochMetrics {
            epoch: self.train_losses.len(),
            train_loss: round4(train_loss),
            test_loss: round4(test_loss),
        }
    }

    pub fn epochs(&self) -> usize {
        self.train_losses.len()
    }

    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Append one JSON line per epoch.
pub fn append_metrics_line(path: &Path, metrics: &EpochMetrics) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open metrics file {}", path.display()))?;
    let line = serde_json::to_string(metrics)?;
    writeln!(f, "{line}")?;
    Ok(())
}
