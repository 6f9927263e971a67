use std::env;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use polars::prelude::*;
use tracing::{debug, info};

use crate::models::polars_err;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Read a comma separated file with a header row.
///
/// Whitespace around every field is skipped, so `pa, mean, stderr` and
/// `pa,mean,stderr` load the same. A column becomes `Float64` when every
/// non-empty field parses as a number (empty fields become nulls), and
/// `String` otherwise. Column and row order follow the file.
pub fn read_csv(file_path: impl AsRef<Path>) -> PolarsResult<DataFrame> {
    let file_path = file_path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(file_path)
        .map_err(|e| {
            PolarsError::ComputeError(format!("cannot open {}: {}", file_path.display(), e).into())
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| polars_err(Box::new(e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| polars_err(Box::new(e)))?;
        for (j, field) in record.iter().enumerate() {
            raw[j].push(field.to_string());
        }
    }

    let columns = headers
        .iter()
        .zip(raw)
        .map(|(name, fields)| infer_column(name, fields))
        .collect::<Vec<_>>();

    let df = DataFrame::new(columns)?;
    debug!("Read {} rows x {} columns from {}", df.height(), df.width(), file_path.display());
    Ok(df)
}

fn infer_column(name: &str, fields: Vec<String>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = fields
        .iter()
        .map(|f| {
            if f.is_empty() {
                Some(None)
            } else {
                f.parse::<f64>().ok().map(Some)
            }
        })
        .collect();

    match parsed {
        Some(values) => Column::new(name.into(), values),
        None => Column::new(name.into(), fields),
    }
}

/// Fail with `ColumnNotFound` unless every name in `required` is present.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> PolarsResult<()> {
    let present = df.get_column_names();
    for &name in required {
        if !present.iter().any(|c| c.as_str() == name) {
            let known: Vec<&str> = present.iter().map(|c| c.as_str()).collect();
            return Err(PolarsError::ColumnNotFound(
                format!("`{}` not found in [{}]", name, known.join(", ")).into(),
            ));
        }
    }
    Ok(())
}

/// Extract a numeric column as `f64`, casting integer columns on the way.
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let col = df.column(name)?.cast(&DataType::Float64)?;
    Ok(col.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Reshape `value_cols` into long form.
///
/// Every input row yields one output row per value column, in input-row
/// order and then value-column order. The id columns are repeated, `var_name`
/// holds the name of the source column and `value_name` its value.
pub fn to_long_form(
    df: &DataFrame,
    id_cols: &[&str],
    value_cols: &[&str],
    var_name: &str,
    value_name: &str,
) -> PolarsResult<DataFrame> {
    require_columns(df, id_cols)?;
    require_columns(df, value_cols)?;

    let n = df.height();
    let k = value_cols.len();

    let indices: Vec<IdxSize> = (0..n)
        .flat_map(|i| std::iter::repeat(i as IdxSize).take(k))
        .collect();
    let idx = IdxCa::from_vec("idx".into(), indices);
    let mut long = df.select(id_cols.iter().copied())?.take(&idx)?;

    let wide: Vec<Vec<Option<f64>>> = value_cols
        .iter()
        .map(|&name| -> PolarsResult<Vec<Option<f64>>> {
            let col = df.column(name)?.cast(&DataType::Float64)?;
            Ok(col.f64()?.into_iter().collect())
        })
        .collect::<PolarsResult<_>>()?;

    let mut labels = Vec::with_capacity(n * k);
    let mut values = Vec::with_capacity(n * k);
    for i in 0..n {
        for (j, &name) in value_cols.iter().enumerate() {
            labels.push(name);
            values.push(wide[j][i]);
        }
    }

    long.with_column(Series::new(var_name.into(), labels))?;
    long.with_column(Series::new(value_name.into(), values))?;

    info!("Reshaped {} rows into {} long-form rows", n, long.height());
    Ok(long)
}
