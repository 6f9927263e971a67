use polars::prelude::*;
use std::fmt;

use crate::simulation::inserter::Histogram;

/// Wrap any foreign error (I/O, plotting, csv) into a `PolarsError`.
pub fn polars_err(e: Box<dyn std::error::Error>) -> PolarsError {
    PolarsError::ComputeError(format!("{}", e).into())
}

/// A CSV-backed measurement table.
pub trait Dataset {
    fn load(&self) -> PolarsResult<DataFrame>;
}

/// Mean and standard deviation of the positions recorded in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanError {
    pub mean: f64,
    pub err: f64,
}

/// Everything one simulation run hands to a sink.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub entry_n: u32,
    pub stat: MeanError,
    pub pre_prob: f64,
    pub mid_prob: f64,
    pub post_prob: f64,
    pub histogram: Histogram,
}

/// Ordinary least squares fit of `y` against `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinRegress {
    pub slope: f64,
    pub intercept: f64,
    pub rvalue: f64,
    pub pvalue: f64,
    pub stderr: f64,
    pub intercept_stderr: f64,
}

impl fmt::Display for LinRegress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinregressResult(slope={}, intercept={}, rvalue={}, pvalue={}, stderr={}, intercept_stderr={})",
            self.slope, self.intercept, self.rvalue, self.pvalue, self.stderr, self.intercept_stderr
        )
    }
}
