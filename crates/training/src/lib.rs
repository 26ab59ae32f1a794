#![recursion_limit = "256"]

pub mod checkpoint;
pub mod history;
pub mod loss;
pub mod util;

pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointPaths};
pub use history::{append_metrics_line, round4, CapturedSample, EpochMetrics, TrainHistory};
pub use loss::{cvae_loss, kl_divergence, scalar_value};
pub use models::{Cvae, CvaeConfig, CvaeOutput};
pub use util::{
    evaluate_checkpoint, generate_from_checkpoint, run_eval, run_generate, run_train, test_epoch,
    train_epoch, train_with_options, BackendKind, EvalArgs, GenerateArgs, GeneratedTrajectory,
    TrainArgs, TrainOptions, TrainReport,
};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
