//! Training-curve chart saved as a PNG.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use super::TrainError;
use super::gbdt::EvalHistory;

/// File name of the loss plot inside the figures directory.
pub const LOSS_PLOT_FILE: &str = "gbdt_logloss.png";

const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 500;
const TITLE: &str = "GBDT Log Loss";
const FONT_FAMILY: &str = "sans-serif";
/// egui's bundled proportional face, reused for chart text.
const UI_FONT: &str = "Ubuntu-Light";

const BEST_ROUND: RGBColor = RGBColor(150, 150, 150);
/// Train curve colour.
pub const TRAIN_COLOR: RGBColor = RGBColor(31, 119, 180);
/// Validation curve colour.
pub const VALIDATION_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Render `history` and save it as a PNG at `path`.
pub fn plot_loss_curves(history: &EvalHistory, path: &Path) -> Result<(), TrainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TrainError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    render_loss_curves(history, PLOT_WIDTH, PLOT_HEIGHT)?
        .save(path)
        .map_err(|source| TrainError::Plot {
            path: path.to_path_buf(),
            source,
        })
}

/// Train and test loss per round with a title, axis labels, a legend and a
/// marker at the best round.
pub fn render_loss_curves(
    history: &EvalHistory,
    width: u32,
    height: u32,
) -> Result<RgbImage, TrainError> {
    ensure_chart_font()?;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, history).map_err(|err| TrainError::Chart(err.to_string()))?;
        root.present().map_err(|err| TrainError::Chart(err.to_string()))?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| TrainError::Chart("chart buffer does not match its size".into()))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    history: &EvalHistory,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let (lo, hi) = loss_bounds(history);
    let last_round = history.rounds().saturating_sub(1).max(1);

    let mut chart = ChartBuilder::on(root)
        .caption(TITLE, (FONT_FAMILY, 20))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(52)
        .build_cartesian_2d(0usize..last_round, lo..hi)?;
    chart
        .configure_mesh()
        .x_desc("Boosting round")
        .y_desc("Log Loss")
        .label_style((FONT_FAMILY, 12))
        .axis_desc_style((FONT_FAMILY, 14))
        .draw()?;

    if history.rounds() > 0 {
        let best = history.best_round;
        chart.draw_series(LineSeries::new(
            [(best, lo), (best, hi)],
            BEST_ROUND.stroke_width(1),
        ))?;
    }
    for (label, losses, color) in [
        ("Train", &history.train, TRAIN_COLOR),
        ("Test", &history.validation, VALIDATION_COLOR),
    ] {
        let points = losses
            .iter()
            .enumerate()
            .filter(|(_, loss)| loss.is_finite())
            .map(|(round, &loss)| (round, loss));
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)).point_size(2))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((FONT_FAMILY, 14))
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .draw()
}

/// Finite loss range padded by 5%, widened when flat.
fn loss_bounds(history: &EvalHistory) -> (f32, f32) {
    let (mut lo, mut hi) = history
        .train
        .iter()
        .chain(&history.validation)
        .copied()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        lo = 0.0;
        hi = 1.0;
    }
    if hi - lo < 1e-6 {
        lo -= 0.5;
        hi += 0.5;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Registers egui's default proportional font under the chart family once.
fn ensure_chart_font() -> Result<(), TrainError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered = *REGISTERED.get_or_init(|| {
        bundled_font()
            .is_some_and(|bytes| register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok())
    });
    if registered {
        Ok(())
    } else {
        Err(TrainError::Chart(format!("font {UI_FONT} is unavailable")))
    }
}

fn bundled_font() -> Option<&'static [u8]> {
    let fonts = egui::FontDefinitions::default();
    match &fonts.font_data.get(UI_FONT)?.font {
        Cow::Borrowed(bytes) => Some(*bytes),
        Cow::Owned(_) => None,
    }
}
