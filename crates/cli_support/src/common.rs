use clap::Args;
use data_contracts::{MANIFEST_FILE, SAMPLES_SUBDIR};
use std::path::{Path, PathBuf};

use crate::config::ToolConfig;

/// Dataset location flags shared by binaries that read a segmented dataset.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetArgs {
    /// Dataset root containing dataset_info.csv and samples/ (defaults to config).
    #[arg(long)]
    pub dataset_dir: Option<PathBuf>,
    /// Manifest path override (defaults to <dataset_dir>/dataset_info.csv).
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Samples directory override (defaults to <dataset_dir>/samples).
    #[arg(long)]
    pub samples_dir: Option<PathBuf>,
}

/// Resolved manifest and samples locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub manifest: PathBuf,
    pub samples_dir: PathBuf,
}

impl DatasetPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            manifest: root.join(MANIFEST_FILE),
            samples_dir: root.join(SAMPLES_SUBDIR),
        }
    }
}

impl DatasetArgs {
    /// CLI flags win over the config file.
    pub fn resolve(&self, cfg: &ToolConfig) -> DatasetPaths {
        let root = self
            .dataset_dir
            .clone()
            .unwrap_or_else(|| cfg.dataset_dir.clone());
        let defaults = DatasetPaths::under(&root);
        DatasetPaths {
            manifest: self.manifest.clone().unwrap_or(defaults.manifest),
            samples_dir: self.samples_dir.clone().unwrap_or(defaults.samples_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_root() {
        let cfg = ToolConfig::default();
        let args = DatasetArgs {
            dataset_dir: Some(PathBuf::from("/data/anim")),
            manifest: None,
            samples_dir: Some(PathBuf::from("/elsewhere")),
        };
        let paths = args.resolve(&cfg);
        assert_eq!(paths.manifest, PathBuf::from("/data/anim/dataset_info.csv"));
        assert_eq!(paths.samples_dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn defaults_follow_config() {
        let cfg = ToolConfig::default();
        let paths = DatasetArgs::default().resolve(&cfg);
        assert_eq!(paths, DatasetPaths::under(Path::new("animation_dataset")));
    }
}
