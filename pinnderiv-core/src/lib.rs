//! Derivative extraction from neural networks for physics-informed training.
//!
//! Derivatives are requested by name (`"u_xx"`), collected in a
//! [`DerivRegistry`] together with their lower-order prerequisites, and
//! evaluated either by an external autodiff capability or by central finite
//! differences. [`DeGetter`] ties the pieces together.

pub mod device;
pub mod engines;
pub mod error;
pub mod getter;
pub mod grouped;
pub mod nn;
pub mod registry;
pub mod symbols;
pub mod tensor;

// Re-export the main types so they are reachable as `pinnderiv_core::Tensor` etc.
pub use device::StorageDevice;
pub use engines::{
    AdEngine, AutodiffCapability, CalcOptions, DerivEngine, DerivMap, DerivMethod, Engine, EngineInput,
    FdConfig, FdEngine, GroupedDerivs, StepLimiter, ALL_GROUP,
};
pub use error::DerivError;
pub use getter::DeGetter;
pub use grouped::{GroupSpan, GroupedData};
pub use nn::{FnNetwork, Network};
pub use registry::DerivRegistry;
pub use symbols::{Deriv, VarKind, Variable, VariableSet};
pub use tensor::Tensor;
