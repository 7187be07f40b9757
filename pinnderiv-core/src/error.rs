use crate::device::StorageDevice;
use thiserror::Error;

/// Custom error type for the pinnderiv framework.
///
/// Variants fall into a few families: malformed derivative specifications
/// (raised when derivatives are declared), configuration errors (raised when
/// an engine is built), unsupported operations (raised when a derivative
/// cannot be evaluated by the selected engine) and shape/device
/// consistency errors.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum DerivError {
    // --- Specification errors ---
    #[error("Malformed derivative '{spec}': {reason}")]
    MalformedDerivative { spec: String, reason: String },

    #[error("Variable '{name}' is not a declared {kind} variable")]
    UnknownVariable { name: String, kind: String },

    #[error("Variable '{name}' is declared more than once as {kind} variable")]
    DuplicateVariable { name: String, kind: String },

    #[error("Invalid variable name '{0}': names must be non-empty and must not contain '_'")]
    InvalidVariableName(String),

    #[error("Derivative '{0}' has order 0 and has no previous derivative")]
    NoPreviousDerivative(String),

    #[error("Derivative '{0}' not found in the registry")]
    DerivativeNotFound(String),

    // --- Configuration errors ---
    #[error("Engine is for inputs of dimension {expected}. Got {actual} step sizes instead")]
    StepCountMismatch { expected: usize, actual: usize },

    #[error("Invalid step size {value} for input dimension {dim} (row {row:?}): steps must be finite and positive")]
    InvalidStep {
        dim: usize,
        row: Option<usize>,
        value: f64,
    },

    #[error("Invalid sampling bounds ({low}, {high}) for dimension {dim}")]
    InvalidBounds { dim: usize, low: f64, high: f64 },

    #[error("Unknown derivative engine '{0}', expected 'AD' or 'FD'")]
    UnknownEngine(String),

    #[error("Autodiff engine selected but no autodiff capability was provided")]
    MissingAutodiff,

    #[error("Input and output variables must be set before {0}")]
    VariablesNotSet(String),

    #[error("No derivative engine has been selected")]
    EngineNotSet,

    // --- Unsupported operations ---
    #[error("Unsupported derivative '{spec}': {reason}")]
    UnsupportedDerivative { spec: String, reason: String },

    // --- Shape and consistency errors ---
    #[error("The number of input variables provided {declared} does not match the input size of the network: {reason}")]
    InputWidthMismatch { declared: usize, reason: String },

    #[error("The output of the network of size {network} does not match the number of output variables given {declared}")]
    OutputWidthMismatch { network: usize, declared: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Device mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: StorageDevice,
        actual: StorageDevice,
        operation: String,
    },

    // --- Grouped data ---
    #[error("A target group is required to differentiate grouped input")]
    MissingTargetGroup,

    #[error("Group '{0}' does not exist in the input data")]
    UnknownGroup(String),

    #[error("Engine did not produce derivative '{0}'")]
    MissingDerivative(String),
}
