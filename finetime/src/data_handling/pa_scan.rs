use std::path::PathBuf;

use polars::prelude::*;
use tracing::info;

use crate::helper_functions::{read_csv, require_columns};
use crate::models::Dataset;

/// `pa.csv`: stderr measured while scanning the probability of the bin
/// before the central one.
pub struct PaScanDataset {
    pub path: PathBuf,
}

impl Dataset for PaScanDataset {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading pa scan from {}", self.path.display());
        let df = read_csv(&self.path)?;
        require_columns(&df, &["pa", "stderr"])?;
        df.sort(["pa"], SortMultipleOptions::default())
    }
}
