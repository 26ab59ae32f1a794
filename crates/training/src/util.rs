use animation_dataset::{
    collate, random_split, AnimationDataset, BatchConfig, BatchIter, TrajectorySample,
};
use anyhow::Context;
use burn::backend::Autodiff;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use cli_support::{DatasetArgs, DatasetPaths, ToolConfig};
use clap::{Parser, ValueEnum};
use models::{Cvae, CvaeConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::checkpoint::{load_checkpoint, save_checkpoint, CheckpointPaths};
use crate::history::{append_metrics_line, CapturedSample, TrainHistory};
use crate::loss::{cvae_loss, scalar_value};
use crate::TrainBackend;

type ADBackend = Autodiff<TrainBackend>;

pub const LOSS_PLOT_FILE: &str = "train_and_test_losses_vs_epochs.png";
pub const TRAJECTORY_PLOT_FILE: &str = "animation_trajectories_vs_time.png";
pub const NOVEL_PLOT_FILE: &str = "novel_trajectory.png";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NdArray,
    Wgpu,
}

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the trajectory CVAE on a segmented dataset")]
pub struct TrainArgs {
    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Number of epochs (defaults to config).
    #[arg(long)]
    pub epochs: Option<usize>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Adam learning rate.
    #[arg(long)]
    pub lr: Option<f64>,
    /// Fraction of samples used for training; the rest is the test split.
    #[arg(long)]
    pub train_fraction: Option<f64>,
    /// Seed for the split, shuffling, and weight init.
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub h_dim1: Option<usize>,
    #[arg(long)]
    pub h_dim2: Option<usize>,
    #[arg(long)]
    pub z_dim: Option<usize>,
    /// Log progress every N train batches.
    #[arg(long, default_value_t = 100)]
    pub log_interval: usize,
    /// Test samples captured on the final epoch for plotting.
    #[arg(long, default_value_t = 4)]
    pub capture: usize,
    /// First epoch index shown in the loss plot.
    #[arg(long, default_value_t = 1)]
    pub plot_from: usize,
    /// Checkpoint directory (defaults to config).
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Figure output directory (defaults to config).
    #[arg(long)]
    pub figures_dir: Option<PathBuf>,
    /// Optional JSONL file receiving one line of losses per epoch.
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
    /// Skip rendering figures.
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}

/// Fully resolved training settings.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub paths: DatasetPaths,
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f64,
    pub train_fraction: f64,
    pub seed: Option<u64>,
    pub h_dim1: usize,
    pub h_dim2: usize,
    pub z_dim: usize,
    pub log_interval: usize,
    pub capture: usize,
    pub plot_from: usize,
    pub checkpoint_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub metrics_out: Option<PathBuf>,
    pub render_plots: bool,
}

impl TrainOptions {
    pub fn from_config(cfg: &ToolConfig) -> Self {
        let t = &cfg.training;
        Self {
            paths: DatasetPaths::under(&cfg.dataset_dir),
            epochs: t.epochs,
            batch_size: t.batch_size,
            lr: t.lr,
            train_fraction: t.train_fraction,
            seed: t.seed,
            h_dim1: t.h_dim1,
            h_dim2: t.h_dim2,
            z_dim: t.z_dim,
            log_interval: 100,
            capture: 4,
            plot_from: 1,
            checkpoint_dir: cfg.checkpoints_dir.clone(),
            figures_dir: cfg.figures_dir.clone(),
            metrics_out: None,
            render_plots: true,
        }
    }

    /// CLI flags override config values.
    pub fn from_args(args: &TrainArgs, cfg: &ToolConfig) -> Self {
        let base = Self::from_config(cfg);
        Self {
            paths: args.dataset.resolve(cfg),
            epochs: args.epochs.unwrap_or(base.epochs),
            batch_size: args.batch_size.unwrap_or(base.batch_size),
            lr: args.lr.unwrap_or(base.lr),
            train_fraction: args.train_fraction.unwrap_or(base.train_fraction),
            seed: args.seed.or(base.seed),
            h_dim1: args.h_dim1.unwrap_or(base.h_dim1),
            h_dim2: args.h_dim2.unwrap_or(base.h_dim2),
            z_dim: args.z_dim.unwrap_or(base.z_dim),
            log_interval: args.log_interval,
            capture: args.capture,
            plot_from: args.plot_from,
            checkpoint_dir: args.checkpoint_dir.clone().unwrap_or(base.checkpoint_dir),
            figures_dir: args.figures_dir.clone().unwrap_or(base.figures_dir),
            metrics_out: args.metrics_out.clone(),
            render_plots: !args.no_plot,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.epochs == 0 {
            anyhow::bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            anyhow::bail!(
                "train fraction must be in (0, 1), got {}",
                self.train_fraction
            );
        }
        if !(self.lr > 0.0) {
            anyhow::bail!("learning rate must be positive, got {}", self.lr);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history: TrainHistory,
    pub model_config: CvaeConfig,
    pub checkpoint: CheckpointPaths,
    pub train_size: usize,
    pub test_size: usize,
}

pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    validate_backend_choice(args.backend)?;
    let cfg = ToolConfig::load();
    let opts = TrainOptions::from_args(&args, &cfg);
    let report = train_with_options(&opts)?;
    info!(
        "Saved checkpoint to {} ({} train / {} test samples)",
        report.checkpoint.model.display(),
        report.train_size,
        report.test_size
    );
    Ok(())
}

pub fn train_with_options(opts: &TrainOptions) -> anyhow::Result<TrainReport> {
    opts.validate()?;
    let device = <ADBackend as Backend>::Device::default();
    if let Some(seed) = opts.seed {
        <ADBackend as Backend>::seed(seed);
    }

    let dataset = AnimationDataset::open(&opts.paths.manifest, &opts.paths.samples_dir)
        .with_context(|| {
            format!(
                "failed to open dataset at {}",
                opts.paths.manifest.display()
            )
        })?;
    let (train_idx, test_idx) = random_split(dataset.len(), opts.train_fraction, opts.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        anyhow::bail!(
            "dataset of {} samples gives an empty split (train {}, test {}) at train fraction {}",
            dataset.len(),
            train_idx.len(),
            test_idx.len(),
            opts.train_fraction
        );
    }

    let first = dataset.try_get(0)?;
    let model_config = model_config_for(&first, opts);
    info!(
        "Dataset: {} samples ({} train / {} test); animation {}x{}, human input {}x{}",
        dataset.len(),
        train_idx.len(),
        test_idx.len(),
        model_config.x_len,
        model_config.x_channels,
        model_config.c_len,
        model_config.c_channels
    );

    let mut model = Cvae::<ADBackend>::new(&model_config, &device);
    let mut optim = AdamConfig::new().init::<ADBackend, Cvae<ADBackend>>();
    let train_batches = BatchConfig {
        batch_size: opts.batch_size,
        shuffle: true,
        seed: opts.seed,
    };

    if let Some(path) = &opts.metrics_out {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to reset metrics file {}", path.display()))?;
        }
    }

    let mut history = TrainHistory::default();
    for epoch in 1..=opts.epochs {
        let (next, train_loss) = train_epoch(
            model,
            &mut optim,
            &dataset,
            &train_idx,
            &train_batches,
            epoch,
            opts.lr,
            opts.log_interval,
            &device,
        )?;
        model = next;

        let capture = if epoch == opts.epochs { opts.capture } else { 0 };
        let (test_loss, samples) = test_epoch(
            &model.valid(),
            &dataset,
            &test_idx,
            opts.batch_size,
            capture,
            &device,
        )?;
        let metrics = history.record(train_loss, test_loss);
        if let Some(path) = &opts.metrics_out {
            append_metrics_line(path, &metrics)?;
        }
        if capture > 0 {
            history.samples = samples;
        }
    }

    let checkpoint = CheckpointPaths::in_dir(&opts.checkpoint_dir);
    save_checkpoint(&model.valid(), &model_config, dataset.stats(), &checkpoint)?;
    history.save_json(&checkpoint.history)?;

    if opts.render_plots {
        render_training_figures(&history, opts.plot_from, &opts.figures_dir);
    }

    Ok(TrainReport {
        history,
        model_config,
        checkpoint,
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    })
}

fn model_config_for(sample: &TrajectorySample, opts: &TrainOptions) -> CvaeConfig {
    CvaeConfig {
        x_len: sample.frames(),
        x_channels: sample.animation_channels,
        c_len: sample.frames(),
        c_channels: sample.human_channels,
        h_dim1: opts.h_dim1,
        h_dim2: opts.h_dim2,
        z_dim: opts.z_dim,
    }
}

/// One pass over the train split. Returns the updated model and the average loss per sample.
#[allow(clippy::too_many_arguments)]
pub fn train_epoch<B, O>(
    mut model: Cvae<B>,
    optim: &mut O,
    dataset: &AnimationDataset,
    indices: &[usize],
    batches: &BatchConfig,
    epoch: usize,
    lr: f64,
    log_interval: usize,
    device: &B::Device,
) -> anyhow::Result<(Cvae<B>, f64)>
where
    B: AutodiffBackend,
    O: Optimizer<Cvae<B>, B>,
{
    let mut iter = BatchIter::for_epoch(indices, batches, epoch);
    let total = iter.total();
    let num_batches = iter.batches();
    let mut total_loss = 0.0f64;
    let mut batch_idx = 0usize;

    while let Some(batch) = iter.next_batch::<B>(dataset, device)? {
        let len = batch.len();
        let out = model.forward(batch.animation.clone(), batch.human_input);
        let loss = cvae_loss(out.reconstruction, batch.animation, out.mu, out.log_var);
        let loss_value = scalar_value(loss.clone());
        total_loss += loss_value;

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(lr, model, grads);

        if log_interval > 0 && batch_idx % log_interval == 0 {
            info!(
                "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
                epoch,
                batch_idx * len,
                total,
                100.0 * batch_idx as f64 / num_batches as f64,
                loss_value / len as f64
            );
        }
        batch_idx += 1;
    }

    let avg = total_loss / total.max(1) as f64;
    info!("====> Epoch: {} Average loss: {:.4}", epoch, avg);
    Ok((model, avg))
}

/// Average loss per test sample; captures the first element of each batch, up to `capture`.
pub fn test_epoch<B: Backend>(
    model: &Cvae<B>,
    dataset: &AnimationDataset,
    indices: &[usize],
    batch_size: usize,
    capture: usize,
    device: &B::Device,
) -> anyhow::Result<(f64, Vec<CapturedSample>)> {
    let cfg = BatchConfig {
        batch_size,
        shuffle: false,
        seed: None,
    };
    let mut iter = BatchIter::for_epoch(indices, &cfg, 0);
    let total = iter.total();
    let mut total_loss = 0.0f64;
    let mut captured = Vec::new();

    while let Some(samples) = iter.next_samples(dataset)? {
        let batch = collate::<B>(&samples, device)?;
        let out = model.forward(batch.animation.clone(), batch.human_input);
        if captured.len() < capture {
            let recon = tensor_values(out.reconstruction.clone())?;
            let first = &samples[0];
            let per_sample = first.animation.len();
            captured.push(CapturedSample {
                times: first.times.clone(),
                original_animation: first.animation.clone(),
                human_input: first.human_input.clone(),
                reconstructed_animation: recon.into_iter().take(per_sample).collect(),
                animation_channels: first.animation_channels,
                human_channels: first.human_channels,
            });
        }
        let loss = cvae_loss(out.reconstruction, batch.animation, out.mu, out.log_var);
        total_loss += scalar_value(loss);
    }

    let avg = total_loss / total.max(1) as f64;
    info!("====> Test set loss: {:.4}", avg);
    Ok((avg, captured))
}

fn tensor_values<B: Backend, const D: usize>(t: Tensor<B, D>) -> anyhow::Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("failed to read tensor values: {e:?}"))
}

/// Runs after the checkpoint is saved, so every failure here only warns.
fn render_training_figures(history: &TrainHistory, plot_from: usize, figures_dir: &Path) {
    if let Err(err) = fs::create_dir_all(figures_dir) {
        warn!(
            "skipping figures: cannot create {}: {err}",
            figures_dir.display()
        );
        return;
    }
    let train: Vec<f32> = history.train_losses.iter().map(|v| *v as f32).collect();
    let test: Vec<f32> = history.test_losses.iter().map(|v| *v as f32).collect();
    let loss_path = figures_dir.join(LOSS_PLOT_FILE);
    match plots::render_loss_curves(&train, &test, plot_from, &loss_path) {
        Ok(()) => info!("Wrote {}", loss_path.display()),
        Err(err) => warn!("skipping loss plot: {err}"),
    }

    if let Some(sample) = history.samples.first() {
        let path = figures_dir.join(TRAJECTORY_PLOT_FILE);
        match plots::render_trajectories(
            &sample.original_points(),
            &sample.human_points(),
            &sample.reconstructed_points(),
            &path,
        ) {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(err) => warn!("skipping trajectory plot: {err}"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "eval", about = "Evaluate a trained CVAE checkpoint on a dataset")]
pub struct EvalArgs {
    /// Checkpoint directory (defaults to config).
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,
}

/// Average loss per sample over the whole dataset, normalized with the checkpoint's stats.
pub fn run_eval(args: EvalArgs) -> anyhow::Result<f64> {
    let cfg = ToolConfig::load();
    let ckpt_dir = args
        .checkpoint_dir
        .clone()
        .unwrap_or_else(|| cfg.checkpoints_dir.clone());
    let paths = args.dataset.resolve(&cfg);
    evaluate_checkpoint(&ckpt_dir, &paths, args.batch_size)
}

pub fn evaluate_checkpoint(
    ckpt_dir: &Path,
    paths: &DatasetPaths,
    batch_size: usize,
) -> anyhow::Result<f64> {
    if batch_size == 0 {
        anyhow::bail!("batch size must be at least 1");
    }
    let device = <TrainBackend as Backend>::Device::default();
    let (model, model_config, stats) =
        load_checkpoint::<TrainBackend>(&CheckpointPaths::in_dir(ckpt_dir), &device)?;
    let dataset = AnimationDataset::with_stats(&paths.manifest, &paths.samples_dir, stats)?;
    check_shape(&dataset.try_get(0)?, &model_config)?;

    let indices: Vec<usize> = (0..dataset.len()).collect();
    let (avg, _) = test_epoch(&model, &dataset, &indices, batch_size, 0, &device)?;
    info!(
        "Evaluated {} samples from {}: average loss {:.4}",
        indices.len(),
        paths.manifest.display(),
        avg
    );
    Ok(avg)
}

fn check_shape(sample: &TrajectorySample, cfg: &CvaeConfig) -> anyhow::Result<()> {
    let found = (
        sample.frames(),
        sample.animation_channels,
        sample.human_channels,
    );
    let expected = (cfg.x_len, cfg.x_channels, cfg.c_channels);
    if found != expected || cfg.c_len != cfg.x_len {
        anyhow::bail!(
            "dataset sample shape (frames, animation, human) = {:?} does not match checkpoint {:?}",
            found,
            expected
        );
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "generate",
    about = "Sample a novel animation trajectory conditioned on a dataset item's human input"
)]
pub struct GenerateArgs {
    /// Checkpoint directory (defaults to config).
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Dataset item whose human input is the condition.
    #[arg(long, default_value_t = 0)]
    pub index: usize,
    /// Seed for the latent draw.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Plot in recording units instead of normalized [0, 1].
    #[arg(long, default_value_t = false)]
    pub denormalize: bool,
    /// Output PNG (defaults to <figures_dir>/novel_trajectory.png).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// A generated trajectory and the condition it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTrajectory {
    pub animation: Vec<f32>,
    pub animation_channels: usize,
    pub human_input: Vec<f32>,
    pub human_channels: usize,
}

pub fn run_generate(args: GenerateArgs) -> anyhow::Result<PathBuf> {
    let cfg = ToolConfig::load();
    let ckpt_dir = args
        .checkpoint_dir
        .clone()
        .unwrap_or_else(|| cfg.checkpoints_dir.clone());
    let paths = args.dataset.resolve(&cfg);
    let generated = generate_from_checkpoint(
        &ckpt_dir,
        &paths,
        args.index,
        args.seed,
        args.denormalize,
    )?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| cfg.figures_dir.join(NOVEL_PLOT_FILE));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    plots::render_novel_trajectory(
        &animation_dataset::xy_points(&generated.animation, generated.animation_channels),
        &animation_dataset::xy_points(&generated.human_input, generated.human_channels),
        &output,
    )?;
    info!("Wrote novel trajectory to {}", output.display());
    Ok(output)
}

pub fn generate_from_checkpoint(
    ckpt_dir: &Path,
    paths: &DatasetPaths,
    index: usize,
    seed: Option<u64>,
    denormalize: bool,
) -> anyhow::Result<GeneratedTrajectory> {
    let device = <TrainBackend as Backend>::Device::default();
    if let Some(seed) = seed {
        TrainBackend::seed(seed);
    }
    let (model, model_config, stats) =
        load_checkpoint::<TrainBackend>(&CheckpointPaths::in_dir(ckpt_dir), &device)?;
    let dataset = AnimationDataset::with_stats(&paths.manifest, &paths.samples_dir, stats)?;
    if index >= dataset.len() {
        anyhow::bail!(
            "index {} out of range for dataset of {} samples",
            index,
            dataset.len()
        );
    }
    let condition = dataset.try_get(index)?;
    check_shape(&condition, &model_config)?;

    let batch = collate::<TrainBackend>(std::slice::from_ref(&condition), &device)?;
    let novel = tensor_values(model.generate(batch.human_input))?;

    let (animation, human_input) = if denormalize {
        let raw = dataset.load_raw(index)?;
        (dataset.stats().denormalize_animation(&novel), raw.human_input)
    } else {
        (novel, condition.human_input.clone())
    };
    Ok(GeneratedTrajectory {
        animation,
        animation_channels: condition.animation_channels,
        human_input,
        human_channels: condition.human_channels,
    })
}

pub fn validate_backend_choice(kind: BackendKind) -> anyhow::Result<()> {
    let built_wgpu = cfg!(feature = "backend-wgpu");
    match (kind, built_wgpu) {
        (BackendKind::Wgpu, false) => {
            anyhow::bail!("backend-wgpu feature not enabled; rebuild with --features backend-wgpu or choose ndarray backend")
        }
        (BackendKind::NdArray, true) => {
            warn!("built with backend-wgpu; training will still use the WGPU backend despite --backend ndarray");
        }
        _ => {}
    }
    Ok(())
}
