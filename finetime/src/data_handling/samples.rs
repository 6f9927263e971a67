use std::path::PathBuf;

use polars::prelude::*;
use tracing::info;

use crate::helper_functions::{read_csv, require_columns};
use crate::models::Dataset;

/// `samples.csv`: stderr as a function of the number of entries per draw.
pub struct SampleSizeDataset {
    pub path: PathBuf,
}

impl SampleSizeDataset {
    /// Rows sorted by `sample_size`, with the first `skip_rows` dropped.
    pub fn load_sorted_tail(&self, skip_rows: usize) -> PolarsResult<DataFrame> {
        let df = self
            .load()?
            .sort(["sample_size"], SortMultipleOptions::default())?;
        let remaining = df.height().saturating_sub(skip_rows);
        Ok(df.slice(skip_rows as i64, remaining))
    }
}

impl Dataset for SampleSizeDataset {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading sample sizes from {}", self.path.display());
        let df = read_csv(&self.path)?;
        require_columns(&df, &["sample_size", "stderr"])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_functions::column_f64;
    use std::io::Write;

    #[test]
    fn sorts_then_skips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_size, mean, stderr").unwrap();
        for size in [40, 10, 30, 20, 50] {
            writeln!(file, "{}, 0, {}", size, size as f64 / 10.0).unwrap();
        }

        let df = SampleSizeDataset { path: file.path().to_path_buf() }
            .load_sorted_tail(2)
            .unwrap();
        assert_eq!(column_f64(&df, "sample_size").unwrap(), vec![30.0, 40.0, 50.0]);
        assert_eq!(column_f64(&df, "stderr").unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn skipping_everything_leaves_empty_frame() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_size,stderr").unwrap();
        writeln!(file, "1,2").unwrap();

        let df = SampleSizeDataset { path: file.path().to_path_buf() }
            .load_sorted_tail(250)
            .unwrap();
        assert_eq!(df.height(), 0);
    }
}
