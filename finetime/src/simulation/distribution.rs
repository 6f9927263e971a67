use rand::Rng;

/// Random bin probabilities with a chosen central bin.
///
/// `N` is the number of bins and must be odd and at least 3.
pub struct DisGenerator<const N: usize>;

impl<const N: usize> DisGenerator<N> {
    const VALID: () = assert!(N % 2 == 1 && N >= 3, "bin count must be odd and >= 3");

    pub fn new() -> Self {
        let () = Self::VALID;
        Self
    }

    /// Split `total` into `out.len()` parts at sorted uniform cut points.
    pub fn uniform_split<R: Rng + ?Sized>(&self, rng: &mut R, total: f64, out: &mut [f64]) {
        if out.is_empty() {
            return;
        }
        let mut cuts: Vec<f64> = (0..out.len() - 1).map(|_| rng.gen::<f64>() * total).collect();
        cuts.push(total);
        cuts.sort_by(|a, b| a.total_cmp(b));

        let mut previous = 0.0;
        for (slot, cut) in out.iter_mut().zip(cuts) {
            *slot = cut - previous;
            previous = cut;
        }
    }

    /// Distribution whose central bin is `mid_prob`, or a uniform random
    /// value in `[0, max)` when `mid_prob` is zero.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, mid_prob: f64, max: f64) -> [f64; N] {
        let mut distribution = [0.0; N];
        let value = if mid_prob == 0.0 { rng.gen::<f64>() * max } else { mid_prob };
        distribution[0] = value;
        self.uniform_split(rng, 1.0 - value, &mut distribution[1..]);
        distribution.swap(0, N / 2);
        distribution
    }
}

impl<const N: usize> Default for DisGenerator<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn central_bin_is_requested_value() {
        let mut rng = StdRng::seed_from_u64(0);
        let generator = DisGenerator::<3>::new();
        for _ in 0..100 {
            let dist = generator.generate(&mut rng, 0.01, 1.0);
            assert_eq!(dist[1], 0.01);
            assert!(dist.iter().all(|&p| p >= 0.0));
            assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_mid_prob_draws_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = DisGenerator::<5>::new().generate(&mut rng, 0.0, 0.5);
        assert!(dist[2] >= 0.0 && dist[2] < 0.5);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
