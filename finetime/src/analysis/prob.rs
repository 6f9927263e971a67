use polars::prelude::*;
use tracing::info;

use crate::data_handling::bin_sizes::BinSizeDataset;
use crate::helper_functions::column_f64;
use crate::plotting::renderer::{Figure, OutputMode, Renderer, ScatterSeries};

/// Build the stderr-vs-bin-size scatter, one colour per bin.
pub fn prob_figure(long: &DataFrame) -> PolarsResult<Figure> {
    let x = column_f64(long, "bin_size")?;
    let y = column_f64(long, "stderr")?;
    let groups: Vec<String> = long
        .column("type")?
        .str()?
        .into_iter()
        .map(|t| t.unwrap_or("").to_string())
        .collect();

    Ok(Figure {
        x_label: "bin_size".to_string(),
        y_label: "stderr".to_string(),
        scatter: ScatterSeries::grouped(x.into_iter().zip(y).collect(), groups)?,
        curves: Vec::new(),
    })
}

/// Scatter of the measured stderr against the size of each bin.
pub fn plot_prob(dataset: &BinSizeDataset, renderer: &Renderer, mode: &OutputMode) -> PolarsResult<()> {
    let long = dataset.load_long()?;
    info!("Plotting {} bin sizes", long.height());
    renderer.render(&prob_figure(&long)?, mode)
}
