use crate::device::StorageDevice;
use crate::error::DerivError;
use crate::tensor::Tensor;
use std::fmt;

/// The network whose derivatives are extracted.
///
/// Any callable mapping an `[N, D]` batch to an `[N, M]` batch qualifies. The
/// network is assumed to be in a deterministic evaluation mode: engines may
/// call `forward` several times per `calculate` and expect consistent results.
pub trait Network: fmt::Debug + Send + Sync {
    /// Performs a forward pass on a batch of shape `[N, D]`.
    ///
    /// # Errors
    /// Implementations should return `DimensionMismatch` when `D` differs from
    /// the width they accept.
    fn forward(&self, input: &Tensor) -> Result<Tensor, DerivError>;

    /// Device the network's parameters live on.
    fn device(&self) -> StorageDevice {
        StorageDevice::CPU
    }
}

type PointFn = dyn Fn(&[f64]) -> Vec<f64> + Send + Sync;

/// A network defined by a pointwise function `R^D -> R^M`.
///
/// Rows are evaluated independently, which makes this adapter handy for
/// closed-form test functions and for wrapping external models that only
/// expose single-point evaluation.
pub struct FnNetwork {
    in_features: usize,
    out_features: usize,
    device: StorageDevice,
    func: Box<PointFn>,
}

impl FnNetwork {
    pub fn new<F>(in_features: usize, out_features: usize, func: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        FnNetwork {
            in_features,
            out_features,
            device: StorageDevice::CPU,
            func: Box::new(func),
        }
    }

    /// Tags the network with another device.
    pub fn on_device(mut self, device: StorageDevice) -> Self {
        self.device = device;
        self
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl fmt::Debug for FnNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNetwork")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .field("device", &self.device)
            .finish()
    }
}

impl Network for FnNetwork {
    fn forward(&self, input: &Tensor) -> Result<Tensor, DerivError> {
        if input.rank() != 2 || input.cols() != self.in_features {
            return Err(DerivError::DimensionMismatch {
                expected: self.in_features,
                actual: input.cols(),
            });
        }
        if input.device() != self.device {
            return Err(DerivError::DeviceMismatch {
                expected: self.device,
                actual: input.device(),
                operation: "FnNetwork::forward".to_string(),
            });
        }
        let mut out = Vec::with_capacity(input.rows() * self.out_features);
        for r in 0..input.rows() {
            let y = (self.func)(input.row(r)?);
            if y.len() != self.out_features {
                return Err(DerivError::DimensionMismatch {
                    expected: self.out_features,
                    actual: y.len(),
                });
            }
            out.extend(y);
        }
        Ok(Tensor::new(out, vec![input.rows(), self.out_features])?.to_device(self.device))
    }

    fn device(&self) -> StorageDevice {
        self.device
    }
}
