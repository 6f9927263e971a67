use ndarray::Array1;
use polars::prelude::*;
use tracing::info;

use crate::data_handling::pa_scan::PaScanDataset;
use crate::formulas::{err_pre_approx_curve, err_pre_base_curve, err_pre_curve};
use crate::helper_functions::column_f64;
use crate::models::Dataset;
use crate::plotting::renderer::{CurveSeries, Figure, OutputMode, Renderer, ScatterSeries};
use crate::plotting::theme::PlotTheme;

/// The three predictions over `points` values of `pa` in `[0, 1]`.
pub fn prediction_curves(
    theme: &PlotTheme,
    entry_n: f64,
    prob_b: f64,
    points: usize,
) -> Vec<CurveSeries> {
    let xaxis = Array1::linspace(0.0, 1.0, points);
    let curve = |label: &str, code: char, ys: Array1<f64>| CurveSeries {
        label: label.to_string(),
        color: theme.color_code(code),
        points: xaxis.iter().copied().zip(ys.iter().copied()).collect(),
    };

    vec![
        curve("exact solution", 'r', err_pre_curve(&xaxis, entry_n, prob_b)),
        curve("approx solution", 'g', err_pre_approx_curve(&xaxis, entry_n, prob_b)),
        curve("base solution", 'b', err_pre_base_curve(&xaxis, entry_n, prob_b)),
    ]
}

/// Measured stderr against `pa` with the predictions laid over it.
pub fn pres_figure(
    df: &DataFrame,
    theme: &PlotTheme,
    entry_n: f64,
    prob_b: f64,
    points: usize,
) -> PolarsResult<Figure> {
    let pa = column_f64(df, "pa")?;
    let stderr = column_f64(df, "stderr")?;

    Ok(Figure {
        x_label: "probability_a".to_string(),
        y_label: "error".to_string(),
        scatter: ScatterSeries::new(pa.into_iter().zip(stderr).collect()),
        curves: prediction_curves(theme, entry_n, prob_b, points),
    })
}

pub fn plot_pres(
    dataset: &PaScanDataset,
    renderer: &Renderer,
    entry_n: f64,
    prob_b: f64,
    points: usize,
    mode: &OutputMode,
) -> PolarsResult<()> {
    let df = dataset.load()?;
    info!("Comparing {} pa measurements with N = {}, pb = {}", df.height(), entry_n, prob_b);
    let figure = pres_figure(&df, renderer.theme(), entry_n, prob_b, points)?;
    renderer.render(&figure, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulas::err_pre_base;
    use polars::df;

    #[test]
    fn curves_span_unit_interval() {
        let theme = PlotTheme::darkgrid();
        let curves = prediction_curves(&theme, 100000.0, 0.01, 400);
        let labels: Vec<&str> = curves.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["exact solution", "approx solution", "base solution"]);
        for curve in &curves {
            assert_eq!(curve.points.len(), 400);
            assert_eq!(curve.points[0].0, 0.0);
            assert_eq!(curve.points[399].0, 1.0);
        }
        assert_eq!(curves[0].color, theme.color_code('r'));
        assert!(curves[2].points.iter().all(|p| p.1 == err_pre_base(100000.0, 0.01)));
    }

    #[test]
    fn figure_uses_measurements_as_scatter() {
        let df = df![
            "pa" => &[0.1, 0.5],
            "mean" => &[10.0, 50.0],
            "stderr" => &[290.0, 300.0],
        ]
        .unwrap();
        let figure = pres_figure(&df, &PlotTheme::darkgrid(), 100000.0, 0.01, 50).unwrap();
        assert_eq!(figure.scatter.points, vec![(0.1, 290.0), (0.5, 300.0)]);
        assert_eq!(figure.curves.len(), 3);
        assert_eq!(figure.x_label, "probability_a");
    }

    #[test]
    fn saves_prob_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("pa.csv");
        std::fs::write(&csv, "pa, mean, stderr\n0.5, 50, 300\n0.1, 10, 290\n").unwrap();
        let png = dir.path().join("prob_a.png");

        plot_pres(
            &PaScanDataset { path: csv },
            &Renderer::new(PlotTheme::darkgrid()),
            100000.0,
            0.01,
            100,
            &OutputMode::Save { path: png.clone(), dpi: 40 },
        )
        .unwrap();
        assert!(png.exists());
    }
}
