use pinnderiv_core::{FnNetwork, Network, Tensor};
use std::sync::Arc;

// Shared helpers for the integration tests.
// allow(dead_code): each test crate only uses some of them.

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// u = sin(x)
#[allow(dead_code)]
pub fn sin_net() -> Arc<dyn Network> {
    Arc::new(FnNetwork::new(1, 1, |p| vec![p[0].sin()]))
}

/// u = sin(x) cos(y), v = x y
#[allow(dead_code)]
pub fn wave_net() -> Arc<dyn Network> {
    Arc::new(FnNetwork::new(2, 2, |p| vec![p[0].sin() * p[1].cos(), p[0] * p[1]]))
}

/// `n` evenly spaced points in `[a, b)` as an `[n, 1]` batch.
#[allow(dead_code)]
pub fn linspace_column(a: f64, b: f64, n: usize) -> Tensor {
    Tensor::from_column((0..n).map(|i| a + (b - a) * i as f64 / n as f64).collect())
}
