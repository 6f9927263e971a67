use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::*;
use tracing::{info, warn};

use crate::models::polars_err;
use crate::plotting::theme::PlotTheme;
use crate::simulation::inserter::Histogram;

/// Resolution used when the figure is only shown on screen.
const SCREEN_DPI: f64 = 100.0;
/// Where a shown figure goes when no image viewer is installed.
const FALLBACK_FIGURE: &str = "figure.png";

/// Where a rendered figure goes.
#[derive(Debug, Clone)]
pub enum OutputMode {
    /// Open in an image viewer and wait for it to close.
    Show,
    /// Write to `path` (`.svg` for vector output, anything else is a bitmap).
    Save { path: PathBuf, dpi: u32 },
}

/// Points of a scatter, optionally tagged with a group label per point.
#[derive(Debug, Clone, Default)]
pub struct ScatterSeries {
    pub points: Vec<(f64, f64)>,
    pub groups: Option<Vec<String>>,
}

impl ScatterSeries {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points, groups: None }
    }

    pub fn grouped(points: Vec<(f64, f64)>, groups: Vec<String>) -> PolarsResult<Self> {
        if points.len() != groups.len() {
            return Err(PolarsError::ShapeMismatch(
                format!("{} points but {} group labels", points.len(), groups.len()).into(),
            ));
        }
        Ok(Self { points, groups: Some(groups) })
    }

    /// Points split by group, groups in order of first appearance.
    pub fn by_group(&self) -> Vec<(Option<&str>, Vec<(f64, f64)>)> {
        let groups = match &self.groups {
            None => return vec![(None, self.points.clone())],
            Some(groups) => groups,
        };

        let mut split: Vec<(Option<&str>, Vec<(f64, f64)>)> = Vec::new();
        for (point, group) in self.points.iter().zip(groups) {
            match split.iter_mut().find(|(g, _)| *g == Some(group.as_str())) {
                Some((_, pts)) => pts.push(*point),
                None => split.push((Some(group.as_str()), vec![*point])),
            }
        }
        split
    }
}

/// A labelled line drawn over the scatter.
#[derive(Debug, Clone)]
pub struct CurveSeries {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// One set of axes: a scatter plus overlay curves.
#[derive(Debug, Clone, Default)]
pub struct Figure {
    pub x_label: String,
    pub y_label: String,
    pub scatter: ScatterSeries,
    pub curves: Vec<CurveSeries>,
}

impl Figure {
    /// Axis ranges covering every finite point, padded by 5% on each side.
    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let points = self
            .scatter
            .points
            .iter()
            .chain(self.curves.iter().flat_map(|c| c.points.iter()))
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        (padded(x_min, x_max), padded(y_min, y_max))
    }
}

fn padded(min: f64, max: f64) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

enum Plot<'a> {
    Figure(&'a Figure),
    Histogram { histogram: &'a Histogram, markers: &'a [f64] },
}

fn plot_err<E: std::error::Error + 'static>(e: E) -> PolarsError {
    polars_err(Box::new(e))
}

/// Draws figures with one fixed theme.
pub struct Renderer {
    theme: PlotTheme,
}

impl Renderer {
    pub fn new(theme: PlotTheme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &PlotTheme {
        &self.theme
    }

    pub fn render(&self, figure: &Figure, mode: &OutputMode) -> PolarsResult<()> {
        self.output(&Plot::Figure(figure), mode)
    }

    /// Histogram bars with red vertical markers at `markers`.
    pub fn render_histogram(
        &self,
        histogram: &Histogram,
        markers: &[f64],
        mode: &OutputMode,
    ) -> PolarsResult<()> {
        self.output(&Plot::Histogram { histogram, markers }, mode)
    }

    fn output(&self, plot: &Plot, mode: &OutputMode) -> PolarsResult<()> {
        match mode {
            OutputMode::Save { path, dpi } => {
                self.render_to_file(path, *dpi as f64, plot)?;
                info!("Figure saved to {}", path.display());
                Ok(())
            }
            OutputMode::Show => self.show(plot),
        }
    }

    // ───────── backends ─────────

    fn render_to_file(&self, path: &Path, dpi: f64, plot: &Plot) -> PolarsResult<()> {
        let size = self.theme.canvas_size(dpi);
        let is_svg = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);

        if is_svg {
            let root = SVGBackend::new(path, size).into_drawing_area();
            self.draw(&root, plot, dpi)?;
            root.present().map_err(plot_err)?;
        } else {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            self.draw(&root, plot, dpi)?;
            root.present().map_err(plot_err)?;
        }
        Ok(())
    }

    fn show(&self, plot: &Plot) -> PolarsResult<()> {
        self.show_with(plot, find_viewer(), Path::new(FALLBACK_FIGURE))
    }

    /// Without a viewer the figure is drawn straight to `fallback`.
    fn show_with(&self, plot: &Plot, viewer: Option<Viewer>, fallback: &Path) -> PolarsResult<()> {
        let Some(viewer) = viewer else {
            self.render_to_file(fallback, SCREEN_DPI, plot)?;
            warn!("No image viewer found, figure saved to {}", fallback.display());
            return Ok(());
        };

        let tmp = tempfile::Builder::new()
            .prefix("finetime-")
            .suffix(".png")
            .tempfile()
            .map_err(plot_err)?;
        self.render_to_file(tmp.path(), SCREEN_DPI, plot)?;

        info!("Showing figure with {}", viewer.program.display());
        let status = Command::new(&viewer.program)
            .args(viewer.args)
            .arg(tmp.path())
            .status()
            .map_err(plot_err)?;
        if !status.success() {
            warn!("Viewer exited with {}", status);
        }

        if !viewer.blocks {
            // The viewer reads the file after we return
            let kept = tmp.into_temp_path().keep().map_err(plot_err)?;
            info!("Figure kept at {}", kept.display());
        }
        Ok(())
    }

    // ───────── drawing ─────────

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, plot: &Plot, dpi: f64) -> PolarsResult<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        match plot {
            Plot::Figure(figure) => self.draw_figure(root, figure, dpi),
            Plot::Histogram { histogram, markers } => self.draw_histogram(root, histogram, markers, dpi),
        }
    }

    fn draw_figure<DB>(&self, root: &DrawingArea<DB, Shift>, figure: &Figure, dpi: f64) -> PolarsResult<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let theme = &self.theme;
        let font_px = theme.px(theme.font_pt, dpi);
        let marker_px = theme.px(theme.marker_pt, dpi).round().max(1.0) as u32;
        let line_px = theme.px(theme.line_pt, dpi).round().max(1.0) as u32;

        root.fill(&theme.figure_background).map_err(plot_err)?;

        let (x_range, y_range) = figure.ranges();
        let mut chart = ChartBuilder::on(root)
            .margin(theme.pad_px(dpi))
            .x_label_area_size(theme.px(30.0, dpi) as u32)
            .y_label_area_size(theme.px(45.0, dpi) as u32)
            .build_cartesian_2d(x_range, y_range)
            .map_err(plot_err)?;

        chart.plotting_area().fill(&theme.background).map_err(plot_err)?;

        chart
            .configure_mesh()
            .bold_line_style(theme.grid.stroke_width(line_px))
            .light_line_style(&TRANSPARENT)
            .axis_style(&TRANSPARENT)
            .x_desc(figure.x_label.as_str())
            .y_desc(figure.y_label.as_str())
            .label_style((theme.font.as_str(), font_px * 0.9).into_font().color(&theme.text))
            .axis_desc_style((theme.font.as_str(), font_px).into_font().color(&theme.text))
            .draw()
            .map_err(plot_err)?;

        let legend_len = theme.px(18.0, dpi) as i32;
        for curve in &figure.curves {
            let color = curve.color;
            chart
                .draw_series(LineSeries::new(
                    curve.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
                    color.stroke_width(line_px),
                ))
                .map_err(plot_err)?
                .label(curve.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + legend_len, y)], color.stroke_width(line_px))
                });
        }

        let mut labelled = !figure.curves.is_empty();
        for (i, (group, points)) in figure.scatter.by_group().into_iter().enumerate() {
            let color = theme.color(i);
            let series = chart
                .draw_series(
                    points
                        .into_iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(move |p| Circle::new(p, marker_px, color.filled())),
                )
                .map_err(plot_err)?;
            if let Some(group) = group {
                labelled = true;
                series
                    .label(group)
                    .legend(move |(x, y)| Circle::new((x + legend_len / 2, y), marker_px, color.filled()));
            }
        }

        if labelled {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(&theme.background)
                .label_font((theme.font.as_str(), font_px * 0.9).into_font().color(&theme.text))
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(plot_err)?;
        }

        Ok(())
    }

    fn draw_histogram<DB>(
        &self,
        root: &DrawingArea<DB, Shift>,
        histogram: &Histogram,
        markers: &[f64],
        dpi: f64,
    ) -> PolarsResult<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let theme = &self.theme;
        let font_px = theme.px(theme.font_pt, dpi);
        let line_px = theme.px(theme.line_pt, dpi).round().max(1.0) as u32;

        root.fill(&theme.figure_background).map_err(plot_err)?;

        let max_count = histogram.bins().iter().copied().max().unwrap_or(0).max(1) as f64;
        let mut chart = ChartBuilder::on(root)
            .margin(theme.pad_px(dpi))
            .caption(
                format!("{}: {} entries", histogram.name(), histogram.entries()),
                (theme.font.as_str(), font_px),
            )
            .x_label_area_size(theme.px(30.0, dpi) as u32)
            .y_label_area_size(theme.px(45.0, dpi) as u32)
            .build_cartesian_2d(histogram.low()..histogram.high(), 0.0..max_count * 1.05)
            .map_err(plot_err)?;

        chart.plotting_area().fill(&theme.background).map_err(plot_err)?;
        chart
            .configure_mesh()
            .bold_line_style(theme.grid.stroke_width(line_px))
            .light_line_style(&TRANSPARENT)
            .x_desc("position")
            .y_desc("count")
            .label_style((theme.font.as_str(), font_px * 0.9))
            .axis_desc_style((theme.font.as_str(), font_px))
            .draw()
            .map_err(plot_err)?;

        let bar = theme.color(0);
        let width = histogram.bin_width();
        chart
            .draw_series(histogram.bins().iter().enumerate().filter(|(_, c)| **c > 0).map(|(i, &c)| {
                let x0 = histogram.low() + i as f64 * width;
                Rectangle::new([(x0, 0.0), (x0 + width, c as f64)], bar.filled())
            }))
            .map_err(plot_err)?;

        for &x in markers {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x, 0.0), (x, max_count * 1.05)],
                    RED.stroke_width(2 * line_px),
                )))
                .map_err(plot_err)?;
        }

        Ok(())
    }
}

struct Viewer {
    program: PathBuf,
    args: &'static [&'static str],
    /// Whether the command only returns once the window is closed.
    blocks: bool,
}

struct ViewerCandidate {
    name: &'static str,
    args: &'static [&'static str],
    blocks: bool,
}

#[cfg(target_os = "macos")]
const VIEWERS: &[ViewerCandidate] = &[ViewerCandidate { name: "open", args: &["-W"], blocks: true }];

#[cfg(target_os = "windows")]
const VIEWERS: &[ViewerCandidate] = &[ViewerCandidate { name: "explorer", args: &[], blocks: false }];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const VIEWERS: &[ViewerCandidate] = &[
    ViewerCandidate { name: "feh", args: &[], blocks: true },
    ViewerCandidate { name: "eog", args: &[], blocks: true },
    ViewerCandidate { name: "display", args: &[], blocks: true },
    ViewerCandidate { name: "xdg-open", args: &[], blocks: false },
];

fn find_viewer() -> Option<Viewer> {
    VIEWERS.iter().find_map(|candidate| {
        which::which(candidate.name).ok().map(|program| Viewer {
            program,
            args: candidate.args,
            blocks: candidate.blocks,
        })
    })
}
