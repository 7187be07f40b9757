// pinnderiv-core/src/tensor_test.rs

use super::*;

#[test]
fn test_new_rejects_bad_length() {
    let result = Tensor::new(vec![1.0, 2.0, 3.0], vec![2, 2]);
    match result {
        Err(DerivError::TensorCreationError { data_len, shape }) => {
            assert_eq!(data_len, 3);
            assert_eq!(shape, vec![2, 2]);
        }
        other => panic!("Expected TensorCreationError, got {:?}", other),
    }
}

#[test]
fn test_new_rejects_rank_three() {
    assert!(Tensor::new(vec![0.0; 8], vec![2, 2, 2]).is_err());
}

#[test]
fn test_column_and_row() -> Result<(), DerivError> {
    let t = Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])?;
    assert_eq!(t.shape(), &[3, 2]);
    assert_eq!(t.column(1)?.data(), &[2.0, 4.0, 6.0]);
    assert_eq!(t.column(1)?.shape(), &[3]);
    assert_eq!(t.row(2)?, &[5.0, 6.0]);
    assert!(matches!(t.column(2), Err(DerivError::IndexOutOfBounds { .. })));
    Ok(())
}

#[test]
fn test_shift_column_per_row() -> Result<(), DerivError> {
    let t = Tensor::from_rows(&[vec![0.0, 1.0], vec![0.0, 1.0]])?;
    let shifted = t.shift_column(1, &[0.5, 0.25], -1.0)?;
    assert_eq!(shifted.data(), &[0.0, 0.5, 0.0, 0.75]);
    // The original is untouched
    assert_eq!(t.data(), &[0.0, 1.0, 0.0, 1.0]);
    Ok(())
}

#[test]
fn test_cat_then_split_rows() -> Result<(), DerivError> {
    let a = Tensor::from_column(vec![1.0, 2.0]);
    let b = Tensor::from_column(vec![3.0]);
    let cat = Tensor::cat_rows(&[&a, &b])?;
    assert_eq!(cat.shape(), &[3, 1]);
    let parts = cat.split_rows(&[2, 1])?;
    assert_eq!(parts[0], a);
    assert_eq!(parts[1], b);
    assert!(cat.split_rows(&[1, 1]).is_err());
    Ok(())
}

#[test]
fn test_cat_rows_device_mismatch() {
    let a = Tensor::from_column(vec![1.0]);
    let b = Tensor::from_column(vec![1.0]).to_device(StorageDevice::GPU);
    let result = Tensor::cat_rows(&[&a, &b]);
    assert!(matches!(result, Err(DerivError::DeviceMismatch { .. })));
}

#[test]
fn test_select_rows_with_repeats() -> Result<(), DerivError> {
    let t = Tensor::from_column(vec![10.0, 20.0, 30.0]);
    let picked = t.select_rows(&[2, 0, 2])?;
    assert_eq!(picked.data(), &[30.0, 10.0, 30.0]);
    assert!(t.select_rows(&[3]).is_err());
    Ok(())
}
