use polars::prelude::*;
use rand::Rng;
use tracing::warn;

use crate::models::MeanError;

const HIST_BINS: usize = 10000;

/// Fixed-width histogram that also keeps the running sums needed for the
/// mean and standard deviation of every in-range value it was filled with.
#[derive(Debug, Clone)]
pub struct Histogram {
    name: String,
    low: f64,
    high: f64,
    bins: Vec<u32>,
    entries: u64,
    sum_x: f64,
    sum_x2: f64,
}

impl Histogram {
    pub fn new(name: impl Into<String>, n_bins: usize, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            bins: vec![0; n_bins.max(1)],
            entries: 0,
            sum_x: 0.0,
            sum_x2: 0.0,
        }
    }

    /// Values outside `[low, high)` are dropped.
    pub fn fill(&mut self, value: f64) {
        if !(value >= self.low && value < self.high) {
            return;
        }
        let idx = ((value - self.low) / self.bin_width()) as usize;
        let idx = idx.min(self.bins.len() - 1);
        self.bins[idx] += 1;
        self.entries += 1;
        self.sum_x += value;
        self.sum_x2 += value * value;
    }

    pub fn mean(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        self.sum_x / self.entries as f64
    }

    /// Population standard deviation of the filled values.
    pub fn std_dev(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        let n = self.entries as f64;
        let mean = self.sum_x / n;
        (self.sum_x2 / n - mean * mean).max(0.0).sqrt()
    }

    pub fn reset(&mut self) {
        self.bins.iter_mut().for_each(|b| *b = 0);
        self.entries = 0;
        self.sum_x = 0.0;
        self.sum_x2 = 0.0;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.bins.len() as f64
    }
}

/// Index range `[start, end)` of the central bin, given per-bin occupancies.
pub fn get_center_boundary(counts: &[u32]) -> PolarsResult<(u32, u32)> {
    if counts.len() < 3 {
        return Err(PolarsError::ComputeError(
            format!("need at least 3 bins, got {}", counts.len()).into(),
        ));
    }
    let offset = counts.len() / 2;
    let start: u32 = counts[..offset].iter().sum();
    Ok((start, start + counts[offset]))
}

/// Places one hit uniformly inside the central bin of every draw and
/// histograms its position.
pub struct UniformInserter {
    histogram: Histogram,
    result: MeanError,
}

impl UniformInserter {
    /// `num` is the largest entry count this inserter will see.
    pub fn new(num: u32, name: &str) -> Self {
        Self {
            histogram: Histogram::new(name, HIST_BINS, 0.0, num as f64),
            result: MeanError::default(),
        }
    }

    pub fn insert<R: Rng + ?Sized>(&mut self, counts: &[u32], rng: &mut R) -> PolarsResult<()> {
        let (start, end) = get_center_boundary(counts)?;
        if start == end {
            return Ok(());
        }
        let bin_value = rng.gen::<f64>() * (end - start) as f64;
        self.histogram.fill(bin_value + start as f64);
        Ok(())
    }

    pub fn init(&mut self) {
        self.result = MeanError::default();
    }

    pub fn reset(&mut self) {
        self.histogram.reset();
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn result(&mut self) -> MeanError {
        let mean = self.histogram.mean();
        let err = self.histogram.std_dev();
        if err == 0.0 {
            warn!("0 stderr! histogram entries: {}", self.histogram.entries());
        }
        self.result = MeanError { mean, err };
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn center_boundary_of_three_bins() {
        assert_eq!(get_center_boundary(&[3, 4, 5]).unwrap(), (3, 7));
        assert_eq!(get_center_boundary(&[0, 0, 9]).unwrap(), (0, 0));
    }

    #[test]
    fn center_boundary_of_five_bins() {
        assert_eq!(get_center_boundary(&[1, 2, 3, 4, 5]).unwrap(), (3, 6));
    }

    #[test]
    fn center_boundary_needs_three_bins() {
        assert!(get_center_boundary(&[1, 2]).is_err());
    }

    #[test]
    fn histogram_moments() {
        let mut hist = Histogram::new("h", 10, 0.0, 10.0);
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            hist.fill(v);
        }
        hist.fill(10.0); // overflow
        hist.fill(-1.0); // underflow
        assert_eq!(hist.entries(), 8);
        assert!((hist.mean() - 5.0).abs() < 1e-12);
        assert!((hist.std_dev() - 2.0).abs() < 1e-12);
        assert_eq!(hist.bins()[4], 3);

        hist.reset();
        assert_eq!(hist.entries(), 0);
        assert!(hist.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn inserted_values_stay_inside_central_bin() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut inserter = UniformInserter::new(100, "test");
        for _ in 0..1000 {
            inserter.insert(&[20, 10, 70], &mut rng).unwrap();
        }
        let result = inserter.result();
        assert_eq!(inserter.histogram().entries(), 1000);
        assert!(result.mean > 20.0 && result.mean < 30.0);
        // Uniform on a width-10 interval: sd = 10 / sqrt(12)
        assert!((result.err - 10.0 / 12f64.sqrt()).abs() < 0.2);
    }

    #[test]
    fn empty_central_bin_is_skipped() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut inserter = UniformInserter::new(100, "test");
        inserter.insert(&[50, 0, 50], &mut rng).unwrap();
        assert_eq!(inserter.histogram().entries(), 0);
        assert_eq!(inserter.result(), MeanError::default());
    }
}
