//! Collocation point sampling for pinnderiv.
//!
//! Samplers yield row indices into a batch of candidate points; the helpers in
//! [`sampling`] build batches ready to be passed to a `DeGetter`.

pub mod samplers;
pub mod sampling;

// Re-export main components
pub use samplers::{RandomSampler, Sampler};
pub use sampling::{sample_from_tensor, uniform_points};
