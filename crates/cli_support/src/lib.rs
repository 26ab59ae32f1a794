//! CLI plumbing shared by the `segment`, `train`, `eval`, and `generate` binaries.

pub mod common;
pub mod config;
pub mod logging;

pub use common::{DatasetArgs, DatasetPaths};
pub use config::{ToolConfig, TrainingDefaults};
pub use logging::init_tracing;
