use std::path::PathBuf;

use polars::prelude::*;
use tracing::{info, warn};

use crate::models::{polars_err, RunOutput};
use crate::plotting::renderer::{OutputMode, Renderer};
use crate::plotting::theme::PlotTheme;

/// Receives every finished run and writes its output once all runs are done.
pub trait Sink: Send {
    fn record(&mut self, result: &RunOutput);
    fn write(&self) -> PolarsResult<()>;
}

/// Which run parameter goes into the first CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKey {
    Pa,
    EntryN,
}

impl CsvKey {
    fn header(&self) -> &'static str {
        match self {
            CsvKey::Pa => "pa",
            CsvKey::EntryN => "entryN",
        }
    }

    fn value(&self, result: &RunOutput) -> f64 {
        match self {
            CsvKey::Pa => result.pre_prob,
            CsvKey::EntryN => result.entry_n as f64,
        }
    }

    fn format(&self, value: f64) -> String {
        match self {
            CsvKey::Pa => value.to_string(),
            CsvKey::EntryN => (value as u32).to_string(),
        }
    }
}

/// `key, mean, stderr` rows, written sorted by key.
pub struct CsvSink {
    path: PathBuf,
    key: CsvKey,
    rows: Vec<(f64, f64, f64)>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, key: CsvKey) -> Self {
        Self { path: path.into(), key, rows: Vec::new() }
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[(f64, f64, f64)] {
        &self.rows
    }
}

impl Sink for CsvSink {
    fn record(&mut self, result: &RunOutput) {
        self.rows.push((self.key.value(result), result.stat.mean, result.stat.err));
    }

    fn write(&self) -> PolarsResult<()> {
        info!("writing to file {}", self.path.display());

        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| polars_err(Box::new(e)))?;
        writer
            .write_record([self.key.header(), "mean", "stderr"])
            .map_err(|e| polars_err(Box::new(e)))?;
        for (key, mean, err) in rows {
            writer
                .write_record([self.key.format(key), mean.to_string(), err.to_string()])
                .map_err(|e| polars_err(Box::new(e)))?;
        }
        writer.flush().map_err(|e| polars_err(Box::new(e)))?;

        info!("writing to file {} finished", self.path.display());
        Ok(())
    }
}

/// Draws the histogram of the last recorded run, with the central bin
/// edges expected from its probabilities marked in red.
pub struct HistSink {
    path: PathBuf,
    dpi: u32,
    theme: PlotTheme,
    last: Option<RunOutput>,
}

impl HistSink {
    pub fn new(path: impl Into<PathBuf>, dpi: u32, theme: PlotTheme) -> Self {
        Self { path: path.into(), dpi, theme, last: None }
    }

    /// Expected edges of the central bin for `result`.
    pub fn boundaries(result: &RunOutput) -> (f64, f64) {
        let n = result.entry_n as f64;
        (result.pre_prob * n, (1.0 - result.post_prob) * n)
    }
}

impl Sink for HistSink {
    fn record(&mut self, result: &RunOutput) {
        self.last = Some(result.clone());
    }

    fn write(&self) -> PolarsResult<()> {
        let Some(result) = &self.last else {
            warn!("No run recorded, {} not written", self.path.display());
            return Ok(());
        };
        info!(
            "histogram of ({}, {}, {}) total entries: {}",
            result.pre_prob,
            result.mid_prob,
            result.post_prob,
            result.histogram.entries()
        );

        let (start, end) = Self::boundaries(result);
        Renderer::new(self.theme.clone()).render_histogram(
            &result.histogram,
            &[start, end],
            &OutputMode::Save { path: self.path.clone(), dpi: self.dpi },
        )
    }
}
