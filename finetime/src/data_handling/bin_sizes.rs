use std::path::PathBuf;

use polars::prelude::*;
use tracing::{error, info};

use crate::helper_functions::{read_csv, require_columns, to_long_form};
use crate::models::Dataset;

pub const ID_COLUMNS: [&str; 2] = ["mean", "stderr"];
const SIZE_COLUMNS: [&str; 3] = ["pre_size", "mid_size", "post_size"];
const PROB_COLUMNS: [&str; 3] = ["pre_prob", "mid_prob", "post_prob"];

/// `data.csv`: mean and stderr per run together with the three bin sizes,
/// or the three bin probabilities in the older layout.
pub struct BinSizeDataset {
    pub path: PathBuf,
}

impl BinSizeDataset {
    /// The per-bin columns present in `df`, preferring the size layout.
    pub fn value_columns(df: &DataFrame) -> PolarsResult<[&'static str; 3]> {
        if require_columns(df, &SIZE_COLUMNS).is_ok() {
            Ok(SIZE_COLUMNS)
        } else {
            require_columns(df, &PROB_COLUMNS)?;
            Ok(PROB_COLUMNS)
        }
    }

    /// Long form with one row per (run, bin): `mean, stderr, type, bin_size`.
    pub fn load_long(&self) -> PolarsResult<DataFrame> {
        let df = self.load()?;
        let value_cols = Self::value_columns(&df)?;
        to_long_form(&df, &ID_COLUMNS, &value_cols, "type", "bin_size")
    }
}

impl Dataset for BinSizeDataset {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading bin sizes from {}", self.path.display());
        let df = match read_csv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read bin size CSV: {}", e);
                return Err(e);
            }
        };
        require_columns(&df, &ID_COLUMNS)?;
        Self::value_columns(&df)?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_functions::column_f64;
    use std::io::Write;

    #[test]
    fn loads_probability_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mean, stderr, pre_prob, mid_prob, post_prob").unwrap();
        writeln!(file, "12.0, 0.3, 0.2, 0.01, 0.79").unwrap();
        writeln!(file, "13.0, 0.4, 0.5, 0.01, 0.49").unwrap();

        let long = BinSizeDataset { path: file.path().to_path_buf() }.load_long().unwrap();
        assert_eq!(long.height(), 6);
        assert_eq!(
            column_f64(&long, "bin_size").unwrap(),
            vec![0.2, 0.01, 0.79, 0.5, 0.01, 0.49]
        );
    }

    #[test]
    fn rejects_unknown_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mean, stderr, pre, mid").unwrap();
        writeln!(file, "1, 2, 3, 4").unwrap();

        let err = BinSizeDataset { path: file.path().to_path_buf() }.load().unwrap_err();
        assert!(matches!(err, PolarsError::ColumnNotFound(_)));
    }
}
