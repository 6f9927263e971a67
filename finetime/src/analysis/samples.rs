use polars::prelude::*;
use tracing::info;

use crate::data_handling::samples::SampleSizeDataset;
use crate::models::LinRegress;
use crate::regression::linregress_columns;

/// Slope and offset the linear model predicts for stderr vs sample size.
pub fn expected_fit(prob_b: f64) -> (f64, f64) {
    (prob_b / 12f64.sqrt(), 1.0 / 3f64.sqrt())
}

/// Fit stderr against sample size, ignoring the `skip_rows` smallest
/// samples, and print the fit next to the prediction.
pub fn plot_samples(dataset: &SampleSizeDataset, skip_rows: usize, prob_b: f64) -> PolarsResult<LinRegress> {
    let df = dataset.load_sorted_tail(skip_rows)?;
    info!("Fitting {} samples after skipping {}", df.height(), skip_rows);

    let res = linregress_columns(&df, "sample_size", "stderr")?;
    let (slope, offset) = expected_fit(prob_b);
    println!("{}", res);
    println!("expected slope: {} and offest {}", slope, offset);
    Ok(res)
}
