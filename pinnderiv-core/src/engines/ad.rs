// src/engines/ad.rs

use super::{net_pass, outputs_by_name, resolve_target, CalcOptions, DerivMap, Engine, EngineInput, GroupedDerivs, ALL_GROUP};
use crate::error::DerivError;
use crate::grouped::GroupSpan;
use crate::nn::Network;
use crate::registry::DerivRegistry;
use crate::tensor::Tensor;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// External automatic-differentiation capability.
///
/// Given the network, the registry and a batch `[N, D]`, returns one tensor of
/// length `N` per registered index tuple of order >= 1 (order-0 entries may be
/// included too). Implementations typically back-propagate through the
/// network's computation graph; this crate does not provide one.
pub trait AutodiffCapability: Debug + Send + Sync {
    fn derivatives(
        &self,
        net: &dyn Network,
        registry: &DerivRegistry,
        x: &Tensor,
    ) -> Result<HashMap<Vec<usize>, Tensor>, DerivError>;
}

/// Engine backed by an [`AutodiffCapability`].
///
/// For grouped input without a target group, all groups are merged,
/// differentiated in one call and split back by their recorded row spans.
#[derive(Debug, Clone)]
pub struct AdEngine {
    net: Arc<dyn Network>,
    registry: DerivRegistry,
    autodiff: Arc<dyn AutodiffCapability>,
}

impl AdEngine {
    pub fn new(net: Arc<dyn Network>, registry: &DerivRegistry, autodiff: Arc<dyn AutodiffCapability>) -> Self {
        AdEngine {
            net,
            registry: registry.clone(),
            autodiff,
        }
    }

    /// Outputs and derivatives of a single batch.
    pub fn differentiate(&self, x: &Tensor) -> Result<DerivMap, DerivError> {
        let y = self.net.forward(x)?;
        let mut result = outputs_by_name(&self.registry, &y)?;
        let mut grads = self.autodiff.derivatives(self.net.as_ref(), &self.registry, x)?;
        for (deriv, idx) in self.registry.derivatives() {
            let tensor = grads
                .remove(idx)
                .ok_or_else(|| DerivError::MissingDerivative(deriv.name()))?;
            if tensor.rows() != x.rows() || tensor.numel() != x.rows() {
                return Err(DerivError::ShapeMismatch {
                    expected: vec![x.rows()],
                    actual: tensor.shape().to_vec(),
                    operation: format!("autodiff output for {}", deriv),
                });
            }
            // Column tensors are flattened so every engine returns `[N]`.
            let flat = Tensor::new(tensor.data().to_vec(), vec![x.rows()])?.to_device(tensor.device());
            result.insert(deriv.name(), flat);
        }
        Ok(result)
    }
}

impl Engine for AdEngine {
    fn calculate(&self, x: &EngineInput, options: &CalcOptions) -> Result<GroupedDerivs, DerivError> {
        let target = options.target_group.as_deref();
        match x {
            EngineInput::Batch(batch) => {
                let mut out = GroupedDerivs::new();
                out.insert(target.unwrap_or(ALL_GROUP).to_string(), self.differentiate(batch)?);
                Ok(out)
            }
            EngineInput::Groups(groups) => match resolve_target(groups, target)? {
                Some((name, batch)) => {
                    let mut out = net_pass(self.net.as_ref(), &self.registry, groups)?;
                    let derivs = self.differentiate(batch)?;
                    out.entry(name.to_string()).or_default().extend(derivs);
                    Ok(out)
                }
                None => {
                    let (merged, spans) = groups.merge()?;
                    let all = self.differentiate(&merged)?;
                    let mut out = GroupedDerivs::new();
                    for (deriv_name, tensor) in all {
                        for (span, part) in spans.iter().zip(GroupSpan::split(&spans, &tensor)?) {
                            out.entry(span.name.clone()).or_default().insert(deriv_name.clone(), part);
                        }
                    }
                    Ok(out)
                }
            },
        }
    }

    fn name(&self) -> &'static str {
        "AD"
    }
}
