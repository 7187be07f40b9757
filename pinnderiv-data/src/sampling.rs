// pinnderiv-data/src/sampling.rs

use crate::samplers::{RandomSampler, Sampler};
use pinnderiv_core::{DerivError, Tensor};
use rand::Rng;

/// Draws `num_points` rows of `t` uniformly at random, with replacement.
///
/// The batch dimension is always the first one, so a `[L, D]` tensor yields a
/// `[num_points, D]` tensor on the same device.
pub fn sample_from_tensor(num_points: usize, t: &Tensor) -> Result<Tensor, DerivError> {
    if t.rows() == 0 && num_points > 0 {
        return Err(DerivError::IndexOutOfBounds {
            index: vec![0],
            shape: t.shape().to_vec(),
        });
    }
    let indices: Vec<usize> = RandomSampler::new(true, Some(num_points)).iter(t.rows()).collect();
    t.select_rows(&indices)
}

/// Draws `num_points` collocation points uniformly in the box
/// `bounds[0] x bounds[1] x ...`, one `(low, high)` pair per input dimension.
pub fn uniform_points(num_points: usize, bounds: &[(f64, f64)]) -> Result<Tensor, DerivError> {
    for (dim, &(low, high)) in bounds.iter().enumerate() {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(DerivError::InvalidBounds { dim, low, high });
        }
    }
    let mut rng = rand::thread_rng();
    let mut data = Vec::with_capacity(num_points * bounds.len());
    for _ in 0..num_points {
        for &(low, high) in bounds {
            data.push(rng.gen_range(low..high));
        }
    }
    Tensor::new(data, vec![num_points, bounds.len()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinnderiv_core::StorageDevice;

    #[test]
    fn test_sample_from_tensor_shape_and_membership() -> Result<(), DerivError> {
        let t = Tensor::from_rows(&[vec![0.0, 10.0], vec![1.0, 11.0], vec![2.0, 12.0]])?.to_device(StorageDevice::GPU);
        let s = sample_from_tensor(8, &t)?;
        assert_eq!(s.shape(), &[8, 2]);
        assert_eq!(s.device(), StorageDevice::GPU);
        for r in 0..8 {
            let row = s.row(r)?;
            assert_eq!(row[1] - row[0], 10.0);
        }
        Ok(())
    }

    #[test]
    fn test_sample_from_empty_tensor() {
        let t = Tensor::new(vec![], vec![0, 2]).expect("empty tensor");
        assert!(sample_from_tensor(1, &t).is_err());
    }

    #[test]
    fn test_uniform_points_in_box() -> Result<(), DerivError> {
        let pts = uniform_points(100, &[(0.0, 1.0), (-2.0, 2.0)])?;
        assert_eq!(pts.shape(), &[100, 2]);
        for r in 0..100 {
            let p = pts.row(r)?;
            assert!((0.0..1.0).contains(&p[0]));
            assert!((-2.0..2.0).contains(&p[1]));
        }
        assert!(matches!(
            uniform_points(3, &[(1.0, 1.0)]),
            Err(DerivError::InvalidBounds { dim: 0, .. })
        ));
        Ok(())
    }
}
