// pinnderiv-data/src/samplers/traits.rs

use std::fmt::Debug;

/// Defines how to iterate over the rows of a batch of points.
pub trait Sampler: Debug + Send + Sync {
    /// Returns an iterator over row indices in `0..num_rows`.
    fn iter(&self, num_rows: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync>;

    /// Number of indices the iterator will yield for a batch of `num_rows` rows.
    fn len(&self, num_rows: usize) -> usize;
}
