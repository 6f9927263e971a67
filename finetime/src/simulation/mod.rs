//! Monte-Carlo generation of the measured spread.
//!
//! Every run draws `rnd_num` multinomial occupancies of three bins, places one
//! hit uniformly inside the central bin of each draw and records the mean and
//! standard deviation of the hit positions. Scans over `pa` or over the
//! entry count are split into contiguous chunks, one per worker thread.

pub mod distribution;
pub mod inserter;
pub mod multinomial;
pub mod sink;

use std::sync::Mutex;

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::models::{polars_err, RunOutput};
use distribution::DisGenerator;
use inserter::UniformInserter;
use multinomial::MultiNomial;
use sink::Sink;

pub const BINSIZE: usize = 3;

/// Split `total` work items into at most `threads` near-equal chunks, the
/// remainder going one each to the first chunks.
pub fn divide_into(total: u32, threads: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }
    let threads = threads.clamp(1, total);
    let divide = total / threads;
    let mut chunks = vec![divide; threads as usize];
    let remainder = total - divide * threads;
    for chunk in chunks.iter_mut().take(remainder as usize) {
        *chunk += 1;
    }
    chunks
}

pub struct FineTimeMc {
    entry_n: u32,
    rnd_num: u32,
    threads: u32,
    seed: u64,
}

impl FineTimeMc {
    pub fn new(seed: u64) -> Self {
        Self { entry_n: 100, rnd_num: 1000, threads: 1, seed }
    }

    pub fn set_threads_num(&mut self, num: u32) {
        self.threads = num.max(1);
    }

    pub fn set_rnd_number(&mut self, num: u32) {
        self.rnd_num = num;
    }

    pub fn set_entry_n(&mut self, size: u32) {
        self.entry_n = size;
    }

    fn pool(&self) -> PolarsResult<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads as usize)
            .build()
            .map_err(|e| polars_err(Box::new(e)))
    }

    /// Stream 0 draws shared inputs such as the generated distribution,
    /// chunk `i` runs on stream `i + 1`.
    fn stream_rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(stream))
    }

    fn chunk_rng(&self, chunk: usize) -> StdRng {
        self.stream_rng(chunk as u64 + 1)
    }

    fn single_run<S: Sink>(
        &self,
        distribution: [f64; BINSIZE],
        multinomial: &MultiNomial,
        inserter: &mut UniformInserter,
        rng: &mut StdRng,
        sink: &Mutex<S>,
    ) -> PolarsResult<()> {
        inserter.init();
        multinomial.loop_on(rng, &distribution, |entries, rng| inserter.insert(entries, rng))?;

        let result = RunOutput {
            entry_n: multinomial.entry_n(),
            stat: inserter.result(),
            pre_prob: distribution[0],
            mid_prob: distribution[1],
            post_prob: distribution[2],
            histogram: inserter.histogram().clone(),
        };
        debug!(
            "run entryN {} pa {:.4}: mean {:.4}, stderr {:.4}",
            result.entry_n, result.pre_prob, result.stat.mean, result.stat.err
        );

        sink.lock()
            .map_err(|e| PolarsError::ComputeError(format!("sink lock poisoned: {}", e).into()))?
            .record(&result);
        inserter.reset();
        Ok(())
    }

    /// Scan `pa` over `num` steps from `min` towards `max` with the central
    /// bin fixed at `mid_prob` and the last bin taking the rest.
    pub fn run_fixed_pb_all_pa<S: Sink>(
        &self,
        mid_prob: f64,
        min: f64,
        max: f64,
        num: u32,
        sink: &Mutex<S>,
    ) -> PolarsResult<()> {
        let chunks = divide_into(num, self.threads);
        let step = (max - min) / num as f64;

        let mut begin = min;
        let work: Vec<(f64, u32)> = chunks
            .iter()
            .map(|&size| {
                let start = begin;
                begin += step * size as f64;
                (start, size)
            })
            .collect();

        info!("Scanning pa in {} steps of {} over {} chunks", num, step, work.len());
        self.pool()?.install(|| {
            work.par_iter().enumerate().try_for_each(|(i, &(pa_begin, size))| -> PolarsResult<()> {
                let mut rng = self.chunk_rng(i);
                let mut inserter = UniformInserter::new(self.entry_n, &format!("pa_hist_{}", i));
                let multinomial = MultiNomial::new(self.entry_n, self.rnd_num);
                for pre_index in 0..size {
                    let pa = pre_index as f64 * step + pa_begin;
                    let distribution = [pa, mid_prob, 1.0 - pa - mid_prob];
                    self.single_run(distribution, &multinomial, &mut inserter, &mut rng, sink)?;
                }
                Ok(())
            })
        })
    }

    /// One run per entry count in `[min, max)` on a random distribution with
    /// the central bin fixed at `mid_prob`.
    pub fn run_fixed_pb_all_entry_n<S: Sink>(
        &self,
        mid_prob: f64,
        min: u32,
        max: u32,
        sink: &Mutex<S>,
    ) -> PolarsResult<()> {
        let chunks = divide_into(max.saturating_sub(min), self.threads);
        let mut rng = self.stream_rng(0);
        let distribution = DisGenerator::<BINSIZE>::new().generate(&mut rng, mid_prob, 1.0);

        let mut start = min;
        let work: Vec<(u32, u32)> = chunks
            .iter()
            .map(|&size| {
                let first = start;
                start += size;
                (first, size)
            })
            .collect();

        info!(
            "Scanning entryN over [{}, {}) with distribution {:?} over {} chunks",
            min, max, distribution, work.len()
        );
        self.pool()?.install(|| {
            work.par_iter().enumerate().try_for_each(|(i, &(first, size))| -> PolarsResult<()> {
                let mut rng = self.chunk_rng(i);
                let mut inserter = UniformInserter::new(first + size, &format!("entryN_hist_{}", i));
                let mut multinomial = MultiNomial::new(first, self.rnd_num);
                for sample_size in first..first + size {
                    multinomial.set_entry_n(sample_size);
                    self.single_run(distribution, &multinomial, &mut inserter, &mut rng, sink)?;
                }
                Ok(())
            })
        })
    }

    /// A single run at the configured entry count.
    pub fn run_with_all_fixed<S: Sink>(
        &self,
        distribution: [f64; BINSIZE],
        sink: &Mutex<S>,
    ) -> PolarsResult<()> {
        let mut rng = self.chunk_rng(0);
        let mut inserter = UniformInserter::new(self.entry_n, "fix distribution");
        let multinomial = MultiNomial::new(self.entry_n, self.rnd_num);
        self.single_run(distribution, &multinomial, &mut inserter, &mut rng, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::sink::{CsvKey, CsvSink};

    #[test]
    fn divide_spreads_remainder_first() {
        assert_eq!(divide_into(10, 3), vec![4, 3, 3]);
        assert_eq!(divide_into(200, 1), vec![200]);
        assert_eq!(divide_into(2, 5), vec![1, 1]);
        assert!(divide_into(0, 4).is_empty());
        assert_eq!(divide_into(7, 0), vec![7]);
    }

    #[test]
    fn distribution_stream_is_separate_from_chunks() {
        use rand::Rng;

        let mc = FineTimeMc::new(11);
        let mut shared = mc.stream_rng(0);
        let mut first_chunk = mc.chunk_rng(0);
        let a: Vec<u64> = (0..4).map(|_| shared.gen()).collect();
        let b: Vec<u64> = (0..4).map(|_| first_chunk.gen()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn pa_scan_covers_every_step() {
        let mut mc = FineTimeMc::new(0);
        mc.set_entry_n(100);
        mc.set_rnd_number(50);
        mc.set_threads_num(3);

        let sink = Mutex::new(CsvSink::new("unused.csv", CsvKey::Pa));
        mc.run_fixed_pb_all_pa(0.1, 0.0, 0.8, 8, &sink).unwrap();

        let sink = sink.into_inner().unwrap();
        let mut pas: Vec<f64> = sink.rows().iter().map(|r| r.0).collect();
        pas.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(pas.len(), 8);
        for (i, pa) in pas.iter().enumerate() {
            assert!((pa - i as f64 * 0.1).abs() < 1e-9);
        }
        // Central bin holds about 10 entries, the spread stays positive
        assert!(sink.rows().iter().all(|r| r.2 > 0.0));
    }

    #[test]
    fn entry_n_scan_covers_range() {
        let mut mc = FineTimeMc::new(1);
        mc.set_rnd_number(20);
        mc.set_threads_num(2);

        let sink = Mutex::new(CsvSink::new("unused.csv", CsvKey::EntryN));
        mc.run_fixed_pb_all_entry_n(0.5, 10, 15, &sink).unwrap();

        let mut keys: Vec<f64> = sink.into_inner().unwrap().rows().iter().map(|r| r.0).collect();
        keys.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(keys, vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn fixed_run_matches_uniform_spread() {
        let mut mc = FineTimeMc::new(2);
        mc.set_entry_n(1000);
        mc.set_rnd_number(2000);

        let sink = Mutex::new(CsvSink::new("unused.csv", CsvKey::Pa));
        mc.run_with_all_fixed([0.5, 0.1, 0.4], &sink).unwrap();

        let rows = sink.into_inner().unwrap().rows().to_vec();
        assert_eq!(rows.len(), 1);
        let (_, mean, err) = rows[0];
        // Centre of the central bin sits near 550 entries
        assert!((mean - 550.0).abs() < 10.0);
        assert!(err > 0.0);
    }
}
