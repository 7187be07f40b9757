pub mod random_sampler;
pub mod traits;

pub use random_sampler::RandomSampler;
pub use traits::Sampler;
