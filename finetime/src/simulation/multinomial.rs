use polars::prelude::*;
use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::models::polars_err;

/// Repeated multinomial draws of `entry_n` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiNomial {
    entry_n: u32,
    rnd_num: u32,
}

impl MultiNomial {
    pub fn new(entry_n: u32, rnd_num: u32) -> Self {
        Self { entry_n, rnd_num }
    }

    pub fn set_entry_n(&mut self, entry_n: u32) {
        self.entry_n = entry_n;
    }

    pub fn entry_n(&self) -> u32 {
        self.entry_n
    }

    /// Occupancy per bin after distributing `entry_n` entries.
    ///
    /// Negative weights count as zero and the rest are normalised, so the
    /// weights need not sum to one. Each bin takes a binomial share of the
    /// entries left over by the bins before it.
    pub fn random_fill<R: Rng + ?Sized>(&self, rng: &mut R, distribution: &[f64]) -> PolarsResult<Vec<u32>> {
        let weights: Vec<f64> = distribution.iter().map(|&p| p.max(0.0)).collect();
        let mut counts = vec![0u32; distribution.len()];
        let mut rest_weight: f64 = weights.iter().sum();
        let Some(last) = weights.iter().rposition(|&w| w > 0.0) else {
            return Ok(counts);
        };

        let mut remaining = self.entry_n as u64;
        for (i, &w) in weights.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if i == last {
                counts[i] = remaining as u32;
                break;
            }
            let p = (w / rest_weight).clamp(0.0, 1.0);
            let drawn = Binomial::new(remaining, p)
                .map_err(|e| polars_err(Box::new(e)))?
                .sample(rng);
            counts[i] = drawn as u32;
            remaining -= drawn;
            rest_weight -= w;
        }
        Ok(counts)
    }

    /// Draw `rnd_num` times, handing every occupancy vector to `op`.
    pub fn loop_on<R, F>(&self, rng: &mut R, distribution: &[f64], mut op: F) -> PolarsResult<()>
    where
        R: Rng + ?Sized,
        F: FnMut(&[u32], &mut R) -> PolarsResult<()>,
    {
        for _ in 0..self.rnd_num {
            let entries = self.random_fill(rng, distribution)?;
            op(&entries, rng)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fill_conserves_entries() {
        let mut rng = StdRng::seed_from_u64(1);
        let multinomial = MultiNomial::new(400, 1);
        let counts = multinomial.random_fill(&mut rng, &[0.3, 0.01, 0.69]).unwrap();
        assert_eq!(counts.iter().sum::<u32>(), 400);
    }

    #[test]
    fn zero_weight_bin_stays_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let multinomial = MultiNomial::new(1000, 1);
        let counts = multinomial.random_fill(&mut rng, &[0.5, 0.5, -0.01]).unwrap();
        assert_eq!(counts[2], 0);
        assert_eq!(counts[0] + counts[1], 1000);
    }

    #[test]
    fn frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(2);
        let multinomial = MultiNomial::new(100000, 1);
        let counts = multinomial.random_fill(&mut rng, &[0.2, 0.3, 0.5]).unwrap();
        assert!((counts[0] as f64 / 100000.0 - 0.2).abs() < 0.01);
        assert!((counts[2] as f64 / 100000.0 - 0.5).abs() < 0.01);
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(4);
        let multinomial = MultiNomial::new(50000, 1);
        let counts = multinomial.random_fill(&mut rng, &[2.0, 0.0, 2.0]).unwrap();
        assert_eq!(counts[1], 0);
        assert_eq!(counts[0] + counts[2], 50000);
        assert!((counts[0] as f64 / 50000.0 - 0.5).abs() < 0.02);
    }

    #[test]
    fn no_positive_weight_leaves_bins_empty() {
        let mut rng = StdRng::seed_from_u64(5);
        let counts = MultiNomial::new(10, 1).random_fill(&mut rng, &[0.0, -1.0, 0.0]).unwrap();
        assert_eq!(counts, vec![0, 0, 0]);
    }

    #[test]
    fn loop_runs_rnd_num_times() {
        let mut rng = StdRng::seed_from_u64(3);
        let multinomial = MultiNomial::new(10, 25);
        let mut calls = 0;
        multinomial
            .loop_on(&mut rng, &[0.1, 0.8, 0.1], |entries, _| {
                assert_eq!(entries.iter().sum::<u32>(), 10);
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 25);
    }
}
