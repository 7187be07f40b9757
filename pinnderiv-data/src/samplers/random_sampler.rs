// pinnderiv-data/src/samplers/random_sampler.rs

use super::traits::Sampler;
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws rows at random, with or without replacement.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    replacement: bool,
    num_samples: Option<usize>,
}

impl RandomSampler {
    /// Creates a new `RandomSampler`.
    ///
    /// # Arguments
    ///
    /// * `replacement`: If `true`, a row can be selected multiple times.
    /// * `num_samples`: Number of rows to draw. Defaults to the batch size.
    pub fn new(replacement: bool, num_samples: Option<usize>) -> Self {
        RandomSampler {
            replacement,
            num_samples,
        }
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, num_rows: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        if num_rows == 0 {
            return Box::new(std::iter::empty());
        }

        let mut rng = rand::thread_rng();
        let wanted = self.num_samples.unwrap_or(num_rows);

        if self.replacement {
            let indices: Vec<usize> = (0..wanted).map(|_| rng.gen_range(0..num_rows)).collect();
            Box::new(indices.into_iter())
        } else {
            if wanted > num_rows {
                warn!(
                    "RandomSampler: num_samples ({}) > num_rows ({}) without replacement, nothing sampled",
                    wanted, num_rows
                );
                return Box::new(std::iter::empty());
            }
            let mut indices: Vec<usize> = (0..num_rows).collect();
            indices.shuffle(&mut rng);
            indices.truncate(wanted);
            Box::new(indices.into_iter())
        }
    }

    fn len(&self, num_rows: usize) -> usize {
        self.num_samples.unwrap_or(num_rows)
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
