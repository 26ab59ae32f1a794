//! Diagnostic plots rendered with `plotters` to PNG.
//!
//! Every renderer validates its inputs before touching the drawing backend, so
//! bad input never leaves a half-written image behind.

use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// An (x, y) point in trajectory space.
pub type Point = (f32, f32);

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("train and test losses differ in length ({train} vs {test})")]
    LengthMismatch { train: usize, test: usize },
    #[error("plot starts at epoch {from} but only {available} epochs were recorded")]
    StartOutOfRange { from: usize, available: usize },
    #[error("draw error: {0}")]
    Draw(String),
}

pub type PlotResult<T> = Result<T, PlotError>;

fn draw_err<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Draw(err.to_string())
}

/// Axis range covering `values`, padded by 5% (or ±0.5 when flat).
pub fn padded_range(values: impl IntoIterator<Item = f32>) -> Option<Range<f32>> {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    Some((lo - pad)..(hi + pad))
}

fn xy_ranges<'a>(series: impl IntoIterator<Item = &'a [Point]> + Clone) -> (Range<f32>, Range<f32>) {
    let xs = series
        .clone()
        .into_iter()
        .flat_map(|s| s.iter().map(|p| p.0));
    let ys = series.into_iter().flat_map(|s| s.iter().map(|p| p.1));
    (
        padded_range(xs).unwrap_or(0.0..1.0),
        padded_range(ys).unwrap_or(0.0..1.0),
    )
}

/// Light-to-dark blue ramp; `t` is clamped into [0, 1].
pub fn blues(t: f32) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f32, b: f32| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(198.0, 8.0), lerp(219.0, 48.0), lerp(239.0, 107.0))
}

/// One bar per distinct recording length.
pub fn render_length_histogram(lengths: &[usize], path: &Path) -> PlotResult<()> {
    let min = *lengths.iter().min().ok_or(PlotError::Empty("lengths"))? as u32;
    let max = *lengths.iter().max().ok_or(PlotError::Empty("lengths"))? as u32;
    let mut counts = std::collections::BTreeMap::new();
    for len in lengths {
        *counts.entry(*len as u32).or_insert(0u32) += 1;
    }
    let peak = counts.values().copied().max().unwrap_or(1);

    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption("Histogram of Sample Lengths", ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((min..max + 1).into_segmented(), 0u32..peak + 1)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Sample Length")
        .y_desc("Frequency")
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.6).filled())
                .margin(1)
                .data(counts.into_iter()),
        )
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Train/test loss per epoch, skipping the first `from_epoch` entries.
///
/// Epochs are labelled from 1.
pub fn render_loss_curves(
    train: &[f32],
    test: &[f32],
    from_epoch: usize,
    path: &Path,
) -> PlotResult<()> {
    if train.is_empty() {
        return Err(PlotError::Empty("train losses"));
    }
    if train.len() != test.len() {
        return Err(PlotError::LengthMismatch {
            train: train.len(),
            test: test.len(),
        });
    }
    if from_epoch >= train.len() {
        return Err(PlotError::StartOutOfRange {
            from: from_epoch,
            available: train.len(),
        });
    }
    let epoch_points = |losses: &[f32]| -> Vec<Point> {
        losses
            .iter()
            .enumerate()
            .skip(from_epoch)
            .map(|(i, l)| ((i + 1) as f32, *l))
            .collect()
    };
    let train_pts = epoch_points(train);
    let test_pts = epoch_points(test);
    let x_range = padded_range(train_pts.iter().map(|p| p.0)).unwrap_or(0.0..1.0);
    let y_range = padded_range(train_pts.iter().chain(test_pts.iter()).map(|p| p.1))
        .unwrap_or(0.0..1.0);

    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption("Train and Test Losses vs. Epochs", ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Loss")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(train_pts.clone(), BLUE.stroke_width(2)))
        .map_err(draw_err)?
        .label("Train Loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(train_pts.iter().map(|p| Circle::new(*p, 3, BLUE.filled())))
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(test_pts.clone(), RED.stroke_width(2)))
        .map_err(draw_err)?
        .label("Test Loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .draw_series(
            test_pts
                .iter()
                .map(|p| TriangleMarker::new(*p, 4, RED.filled())),
        )
        .map_err(draw_err)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Original animation, human input, and reconstruction in the X/Y plane.
pub fn render_trajectories(
    original: &[Point],
    human_input: &[Point],
    reconstruction: &[Point],
    path: &Path,
) -> PlotResult<()> {
    if original.is_empty() {
        return Err(PlotError::Empty("original animation"));
    }
    if human_input.is_empty() {
        return Err(PlotError::Empty("human input"));
    }
    if reconstruction.is_empty() {
        return Err(PlotError::Empty("reconstruction"));
    }
    let (x_range, y_range) = xy_ranges([original, human_input, reconstruction]);

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption("Animation Trajectories vs. Time", ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("X")
        .y_desc("Y")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(original.to_vec(), BLUE.stroke_width(2)))
        .map_err(draw_err)?
        .label("Original animation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(LineSeries::new(human_input.to_vec(), RGBColor(255, 140, 0).stroke_width(2)))
        .map_err(draw_err)?
        .label("Human input")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RGBColor(255, 140, 0)));
    chart
        .draw_series(DashedLineSeries::new(
            reconstruction.to_vec(),
            6,
            4,
            GREEN.stroke_width(2),
        ))
        .map_err(draw_err)?
        .label("Reconstructed animation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// A sampled animation coloured by time step (light to dark), with the human input overlaid.
pub fn render_novel_trajectory(
    novel: &[Point],
    human_input: &[Point],
    path: &Path,
) -> PlotResult<()> {
    let (first, last) = match (novel.first(), novel.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(PlotError::Empty("novel trajectory")),
    };
    if human_input.is_empty() {
        return Err(PlotError::Empty("human input"));
    }
    let (x_range, y_range) = xy_ranges([novel, human_input]);
    let steps = novel.len().saturating_sub(1).max(1) as f32;

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption("Animation Trajectory with Motion Path", ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("X")
        .y_desc("Y")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(novel.windows(2).enumerate().map(|(i, seg)| {
            PathElement::new(vec![seg[0], seg[1]], blues(i as f32 / steps).stroke_width(2))
        }))
        .map_err(draw_err)?
        .label("Novel animation (light to dark = time)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], blues(1.0)));
    let orange = RGBColor(255, 140, 0).mix(0.7);
    chart
        .draw_series(LineSeries::new(human_input.to_vec(), orange))
        .map_err(draw_err)?
        .label("Human input")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], orange));
    chart
        .draw_series(std::iter::once(Circle::new(first, 6, GREEN.filled())))
        .map_err(draw_err)?
        .label("Start (novel)")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, GREEN.filled()));
    chart
        .draw_series(std::iter::once(Cross::new(last, 6, RED.stroke_width(3))))
        .map_err(draw_err)?
        .label("End (novel)")
        .legend(|(x, y)| Cross::new((x + 10, y), 4, RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_flat_and_empty() {
        assert_eq!(padded_range([2.0, 2.0]), Some(1.5..2.5));
        assert_eq!(padded_range(std::iter::empty()), None);
        assert_eq!(padded_range([f32::NAN]), None);
        let r = padded_range([0.0, 10.0]).unwrap();
        assert!((r.start + 0.5).abs() < 1e-6 && (r.end - 10.5).abs() < 1e-6);
    }

    #[test]
    fn blues_ramp_endpoints() {
        assert_eq!(blues(0.0), RGBColor(198, 219, 239));
        assert_eq!(blues(1.0), RGBColor(8, 48, 107));
        assert_eq!(blues(7.0), blues(1.0));
    }
}
