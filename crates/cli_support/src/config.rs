use std::path::{Path, PathBuf};

use data_contracts::DEFAULT_SAMPLE_LENGTH;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_NAME: &str = "trajectory-tools.toml";
const CONFIG_ENV: &str = "TRAJECTORY_TOOLS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Hyperparameter defaults for the `train` binary; CLI flags override these.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingDefaults {
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f64,
    pub train_fraction: f64,
    pub seed: Option<u64>,
    pub h_dim1: usize,
    pub h_dim2: usize,
    pub z_dim: usize,
}

impl Default for TrainingDefaults {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 4,
            lr: 1e-3,
            train_fraction: 0.8,
            seed: None,
            h_dim1: 128,
            h_dim2: 64,
            z_dim: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub raw_data_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub checkpoints_dir: PathBuf,
    pub sample_length: usize,
    pub training: TrainingDefaults,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from("raw_train_data"),
            dataset_dir: PathBuf::from("animation_dataset"),
            figures_dir: PathBuf::from("figures"),
            checkpoints_dir: PathBuf::from("checkpoints"),
            sample_length: DEFAULT_SAMPLE_LENGTH,
            training: TrainingDefaults::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ToolConfigFile {
    raw_data_dir: Option<String>,
    dataset_dir: Option<String>,
    figures_dir: Option<String>,
    checkpoints_dir: Option<String>,
    sample_length: Option<usize>,
    training: Option<TrainingSection>,
}

#[derive(Debug, Deserialize, Default)]
struct TrainingSection {
    epochs: Option<usize>,
    batch_size: Option<usize>,
    lr: Option<f64>,
    train_fraction: Option<f64>,
    seed: Option<u64>,
    h_dim1: Option<usize>,
    h_dim2: Option<usize>,
    z_dim: Option<usize>,
}

impl ToolConfig {
    /// Load from `$TRAJECTORY_TOOLS_CONFIG`, else `./trajectory-tools.toml`, else defaults.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        if !path.exists() {
            return Self::default();
        }
        let cfg = match Self::from_path(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("{err}; using defaults");
                Self::default()
            }
        };
        cfg.warn_if_invalid();
        cfg
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let file: ToolConfigFile = toml::from_str(raw)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let defaults = Self::default();
        let training = file.training.unwrap_or_default();
        let train_defaults = defaults.training;
        ToolConfig {
            raw_data_dir: file
                .raw_data_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.raw_data_dir),
            dataset_dir: file
                .dataset_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.dataset_dir),
            figures_dir: file
                .figures_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.figures_dir),
            checkpoints_dir: file
                .checkpoints_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.checkpoints_dir),
            sample_length: file.sample_length.unwrap_or(defaults.sample_length),
            training: TrainingDefaults {
                epochs: training.epochs.unwrap_or(train_defaults.epochs),
                batch_size: training.batch_size.unwrap_or(train_defaults.batch_size),
                lr: training.lr.unwrap_or(train_defaults.lr),
                train_fraction: training
                    .train_fraction
                    .unwrap_or(train_defaults.train_fraction),
                seed: training.seed.or(train_defaults.seed),
                h_dim1: training.h_dim1.unwrap_or(train_defaults.h_dim1),
                h_dim2: training.h_dim2.unwrap_or(train_defaults.h_dim2),
                z_dim: training.z_dim.unwrap_or(train_defaults.z_dim),
            },
        }
    }

    fn warn_if_invalid(&self) {
        for msg in self.validation_warnings() {
            tracing::warn!("tools config: {msg}");
        }
    }

    /// Values that load fine but will be refused by the tool that reads them.
    pub fn validation_warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.sample_length == 0 {
            out.push("sample_length is 0; segmentation will refuse to run".to_string());
        }
        if self.training.batch_size == 0 {
            out.push("training.batch_size is 0; training will refuse to run".to_string());
        }
        let fraction = self.training.train_fraction;
        if fraction <= 0.0 || fraction >= 1.0 || fraction.is_nan() {
            out.push(format!(
                "training.train_fraction {fraction} is outside (0, 1); training will refuse to run"
            ));
        }
        out
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

/// Replace `${VAR}` with its value; unknown variables are left as written.
fn expand_env(input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&format!("${{{key}}}")),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
