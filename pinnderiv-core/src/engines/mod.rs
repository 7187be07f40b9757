// src/engines/mod.rs

//! Derivative engines.
//!
//! An engine turns a network, a [`DerivRegistry`] snapshot and an input batch
//! into a mapping from derivative name to tensor. Two engines ship with the
//! crate: [`AdEngine`], which delegates to an external autodiff capability,
//! and [`FdEngine`], which uses central finite differences. Both honour the
//! same index-tuple convention, so a getter can swap one for the other
//! without touching its registry.

pub mod ad;
pub mod fd;

pub use ad::{AdEngine, AutodiffCapability};
pub use fd::{FdConfig, FdEngine, StepLimiter};

use crate::error::DerivError;
use crate::grouped::GroupedData;
use crate::nn::Network;
use crate::registry::DerivRegistry;
use crate::tensor::Tensor;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

/// Group key used when an ungrouped batch is evaluated without a target group.
pub const ALL_GROUP: &str = "all";

/// Derivative name (`"u"`, `"u_x"`, ...) -> tensor of shape `[N]`.
pub type DerivMap = BTreeMap<String, Tensor>;

/// Group name -> derivatives of that group.
pub type GroupedDerivs = BTreeMap<String, DerivMap>;

/// Input accepted by [`Engine::calculate`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    /// A single `[N, D]` batch, differentiated as a whole.
    Batch(Tensor),
    /// Named batches; which ones are differentiated depends on the target group.
    Groups(GroupedData),
}

impl From<Tensor> for EngineInput {
    fn from(x: Tensor) -> Self {
        EngineInput::Batch(x)
    }
}

impl From<GroupedData> for EngineInput {
    fn from(x: GroupedData) -> Self {
        EngineInput::Groups(x)
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalcOptions {
    /// Group to differentiate. For an ungrouped batch it only names the output key.
    pub target_group: Option<String>,
}

impl CalcOptions {
    pub fn target(group: &str) -> Self {
        CalcOptions {
            target_group: Some(group.to_string()),
        }
    }
}

/// Common contract of every derivative engine.
pub trait Engine: Debug + Send + Sync {
    /// Computes every registered output and derivative for `x`.
    ///
    /// The result always has the group structure described on [`GroupedDerivs`]:
    /// an ungrouped batch lands under the target group name (or [`ALL_GROUP`]),
    /// grouped input keeps its groups.
    fn calculate(&self, x: &EngineInput, options: &CalcOptions) -> Result<GroupedDerivs, DerivError>;

    /// Short engine identifier for logs.
    fn name(&self) -> &'static str;
}

/// How a getter should obtain derivatives.
#[derive(Debug, Clone)]
pub enum DerivMethod {
    /// Back-propagation through the getter's autodiff capability.
    Autodiff,
    /// Central finite differences.
    FiniteDifference(FdConfig),
    /// A pre-built engine, used as is.
    Custom(Arc<dyn Engine>),
}

impl FromStr for DerivMethod {
    type Err = DerivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AD" => Ok(DerivMethod::Autodiff),
            "FD" => Ok(DerivMethod::FiniteDifference(FdConfig::default())),
            _ => Err(DerivError::UnknownEngine(s.to_string())),
        }
    }
}

/// The closed set of engines a getter can hold.
#[derive(Debug, Clone)]
pub enum DerivEngine {
    Autodiff(AdEngine),
    FiniteDifference(FdEngine),
    Custom(Arc<dyn Engine>),
}

impl Engine for DerivEngine {
    fn calculate(&self, x: &EngineInput, options: &CalcOptions) -> Result<GroupedDerivs, DerivError> {
        match self {
            DerivEngine::Autodiff(engine) => engine.calculate(x, options),
            DerivEngine::FiniteDifference(engine) => engine.calculate(x, options),
            DerivEngine::Custom(engine) => engine.calculate(x, options),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DerivEngine::Autodiff(engine) => engine.name(),
            DerivEngine::FiniteDifference(engine) => engine.name(),
            DerivEngine::Custom(engine) => engine.name(),
        }
    }
}

/// Splits a network output `[N, M]` into one `[N]` tensor per output variable.
pub(crate) fn outputs_by_name(registry: &DerivRegistry, y: &Tensor) -> Result<DerivMap, DerivError> {
    let outputs = registry.output_vars();
    if y.rank() != 2 || y.cols() != outputs.len() {
        return Err(DerivError::OutputWidthMismatch {
            network: y.cols(),
            declared: outputs.len(),
        });
    }
    let mut map = DerivMap::new();
    for (j, var) in outputs.iter().enumerate() {
        map.insert(var.name().to_string(), y.column(j)?);
    }
    Ok(map)
}

/// Plain forward evaluation of every group, without derivatives.
pub(crate) fn net_pass(
    net: &dyn Network,
    registry: &DerivRegistry,
    groups: &GroupedData,
) -> Result<GroupedDerivs, DerivError> {
    let mut out = GroupedDerivs::new();
    for (name, batch) in groups.iter() {
        let y = net.forward(batch)?;
        out.insert(name.to_string(), outputs_by_name(registry, &y)?);
    }
    Ok(out)
}

/// Resolves the group to differentiate for grouped input.
pub(crate) fn resolve_target<'a>(
    groups: &'a GroupedData,
    target: Option<&str>,
) -> Result<Option<(&'a str, &'a Tensor)>, DerivError> {
    match target {
        None => Ok(None),
        Some(name) => groups
            .iter()
            .find(|(n, _)| *n == name)
            .map(Some)
            .ok_or_else(|| DerivError::UnknownGroup(name.to_string())),
    }
}
