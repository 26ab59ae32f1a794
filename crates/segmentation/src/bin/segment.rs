use clap::Parser;
use cli_support::{init_tracing, ToolConfig};
use segmentation::{segment_directory, write_length_histogram, SegmentOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "segment",
    about = "Split raw trajectory recordings into fixed-length snippets and write the dataset manifest"
)]
struct Args {
    /// Directory of raw `*.txt` recordings (defaults to config).
    #[arg(long)]
    raw_dir: Option<PathBuf>,
    /// Output dataset root (defaults to config).
    #[arg(long)]
    dataset_dir: Option<PathBuf>,
    /// Frames per snippet (defaults to config).
    #[arg(long)]
    sample_length: Option<usize>,
    /// Directory for the recording-length histogram.
    #[arg(long)]
    figures_dir: Option<PathBuf>,
    /// Skip rendering the histogram.
    #[arg(long, default_value_t = false)]
    no_plot: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = ToolConfig::load();

    let opts = SegmentOptions {
        raw_dir: args.raw_dir.unwrap_or(cfg.raw_data_dir),
        dataset_dir: args.dataset_dir.unwrap_or(cfg.dataset_dir),
        sample_length: args.sample_length.unwrap_or(cfg.sample_length),
    };
    let summary = segment_directory(&opts)?;
    tracing::info!(
        "Loaded {} samples from {} files.",
        summary.snippets(),
        summary.files
    );

    if args.no_plot {
        return Ok(());
    }
    let figures_dir = args.figures_dir.unwrap_or(cfg.figures_dir);
    if let Some(out) = write_length_histogram(&summary, &figures_dir) {
        tracing::info!("wrote {}", out.display());
    }
    Ok(())
}
