// src/tensor.rs

use crate::device::StorageDevice;
use crate::error::DerivError;

/// A dense, row-major `f64` tensor of rank 1 (`[N]`) or rank 2 (`[N, D]`).
///
/// The first dimension is always the batch dimension. Network inputs and
/// outputs are rank 2, derivative results are rank 1 and aligned row-for-row
/// with the batch they were computed from.
///
/// Tensors are plain values: cloning copies the buffer, and every operation
/// returns a new tensor. The device tag is carried along but never changed
/// implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f64>,
    shape: Vec<usize>,
    device: StorageDevice,
}

impl Tensor {
    /// Creates a new CPU tensor from row-major data and a shape of rank 1 or 2.
    ///
    /// # Errors
    /// `TensorCreationError` if the data length does not match the shape or the
    /// rank is not 1 or 2.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, DerivError> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || shape.len() > 2 || expected != data.len() {
            return Err(DerivError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor {
            data,
            shape,
            device: StorageDevice::CPU,
        })
    }

    /// Creates a tensor filled with `value`.
    pub fn full(shape: &[usize], value: f64) -> Result<Self, DerivError> {
        let numel = shape.iter().product();
        Tensor::new(vec![value; numel], shape.to_vec())
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Result<Self, DerivError> {
        Tensor::full(shape, 0.0)
    }

    /// Creates a `[N, 1]` tensor from a single column of values.
    pub fn from_column(values: Vec<f64>) -> Self {
        let n = values.len();
        Tensor {
            data: values,
            shape: vec![n, 1],
            device: StorageDevice::CPU,
        }
    }

    /// Creates a `[N, D]` tensor from a list of rows, all of width `D`.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, DerivError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DerivError::ShapeMismatch {
                    expected: vec![width],
                    actual: vec![row.len()],
                    operation: format!("Tensor::from_rows (row {})", i),
                });
            }
            data.extend_from_slice(row);
        }
        Tensor::new(data, vec![rows.len(), width])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Size of the batch dimension.
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns. A rank-1 tensor counts as a single column.
    pub fn cols(&self) -> usize {
        if self.shape.len() == 2 {
            self.shape[1]
        } else {
            1
        }
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    /// Returns a copy of this tensor tagged with `device`.
    pub fn to_device(&self, device: StorageDevice) -> Tensor {
        Tensor {
            data: self.data.clone(),
            shape: self.shape.clone(),
            device,
        }
    }

    /// Raw row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns row `i` as a slice of length `cols()`.
    pub fn row(&self, i: usize) -> Result<&[f64], DerivError> {
        if i >= self.rows() {
            return Err(DerivError::IndexOutOfBounds {
                index: vec![i],
                shape: self.shape.clone(),
            });
        }
        let width = self.cols();
        Ok(&self.data[i * width..(i + 1) * width])
    }

    /// Extracts column `j` as a rank-1 tensor of length `rows()`.
    pub fn column(&self, j: usize) -> Result<Tensor, DerivError> {
        let width = self.cols();
        if j >= width {
            return Err(DerivError::IndexOutOfBounds {
                index: vec![0, j],
                shape: self.shape.clone(),
            });
        }
        let values = self.data.iter().skip(j).step_by(width).copied().collect::<Vec<_>>();
        Ok(Tensor {
            shape: vec![values.len()],
            data: values,
            device: self.device,
        })
    }

    /// Returns a copy with `sign * deltas[r]` added to column `col` of every row `r`.
    pub fn shift_column(&self, col: usize, deltas: &[f64], sign: f64) -> Result<Tensor, DerivError> {
        let width = self.cols();
        if col >= width {
            return Err(DerivError::IndexOutOfBounds {
                index: vec![0, col],
                shape: self.shape.clone(),
            });
        }
        if deltas.len() != self.rows() {
            return Err(DerivError::ShapeMismatch {
                expected: vec![self.rows()],
                actual: vec![deltas.len()],
                operation: "shift_column".to_string(),
            });
        }
        let mut shifted = self.clone();
        for (r, delta) in deltas.iter().enumerate() {
            shifted.data[r * width + col] += sign * delta;
        }
        Ok(shifted)
    }

    /// Concatenates tensors along the batch dimension.
    ///
    /// All tensors must share rank, column count and device.
    pub fn cat_rows(tensors: &[&Tensor]) -> Result<Tensor, DerivError> {
        let first = match tensors.first() {
            Some(t) => *t,
            None => {
                return Err(DerivError::ShapeMismatch {
                    expected: vec![1],
                    actual: vec![0],
                    operation: "cat_rows (empty list)".to_string(),
                })
            }
        };
        let mut data = Vec::with_capacity(tensors.iter().map(|t| t.numel()).sum());
        let mut rows = 0;
        for t in tensors {
            if t.device != first.device {
                return Err(DerivError::DeviceMismatch {
                    expected: first.device,
                    actual: t.device,
                    operation: "cat_rows".to_string(),
                });
            }
            if t.rank() != first.rank() || t.cols() != first.cols() {
                return Err(DerivError::ShapeMismatch {
                    expected: first.shape.clone(),
                    actual: t.shape.clone(),
                    operation: "cat_rows".to_string(),
                });
            }
            data.extend_from_slice(&t.data);
            rows += t.rows();
        }
        let mut shape = first.shape.clone();
        shape[0] = rows;
        Ok(Tensor {
            data,
            shape,
            device: first.device,
        })
    }

    /// Splits the batch dimension into consecutive chunks of the given sizes.
    pub fn split_rows(&self, sizes: &[usize]) -> Result<Vec<Tensor>, DerivError> {
        let total: usize = sizes.iter().sum();
        if total != self.rows() {
            return Err(DerivError::ShapeMismatch {
                expected: vec![total],
                actual: vec![self.rows()],
                operation: "split_rows".to_string(),
            });
        }
        let width = self.cols();
        let mut start = 0;
        let mut chunks = Vec::with_capacity(sizes.len());
        for &size in sizes {
            let mut shape = self.shape.clone();
            shape[0] = size;
            chunks.push(Tensor {
                data: self.data[start * width..(start + size) * width].to_vec(),
                shape,
                device: self.device,
            });
            start += size;
        }
        Ok(chunks)
    }

    /// Gathers the given rows (repetitions allowed) into a new tensor.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Tensor, DerivError> {
        let width = self.cols();
        let mut data = Vec::with_capacity(indices.len() * width);
        for &i in indices {
            data.extend_from_slice(self.row(i)?);
        }
        let mut shape = self.shape.clone();
        shape[0] = indices.len();
        Ok(Tensor {
            data,
            shape,
            device: self.device,
        })
    }
}

// --- Tests ---
#[cfg(test)]
#[path = "tensor_test.rs"]
mod tests;
