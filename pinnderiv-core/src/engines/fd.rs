// src/engines/fd.rs

use super::{net_pass, outputs_by_name, resolve_target, CalcOptions, DerivMap, Engine, EngineInput, GroupedDerivs, ALL_GROUP};
use crate::error::DerivError;
use crate::nn::Network;
use crate::registry::DerivRegistry;
use crate::symbols::Deriv;
use crate::tensor::Tensor;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Base step used for every input dimension when none is configured.
pub const DEFAULT_STEP: f64 = 1e-3;

/// Maps a batch `[N, D]` to a per-row upper bound `[N]` on the step size,
/// typically a signed distance to the domain boundary.
pub type StepLimiter = Arc<dyn Fn(&Tensor) -> Result<Tensor, DerivError> + Send + Sync>;

/// Configuration of a [`FdEngine`].
#[derive(Clone, Default)]
pub struct FdConfig {
    /// Base step per input dimension. `None` means [`DEFAULT_STEP`] everywhere.
    pub dxs: Option<Vec<f64>>,
    /// Optional spatial bound on the step size. `None` means unbounded.
    pub step_limiter: Option<StepLimiter>,
    /// Group differentiated when the call options do not name one.
    pub target_group: Option<String>,
}

impl FdConfig {
    pub fn with_steps(mut self, dxs: Vec<f64>) -> Self {
        self.dxs = Some(dxs);
        self
    }

    pub fn with_step_limiter<F>(mut self, limiter: F) -> Self
    where
        F: Fn(&Tensor) -> Result<Tensor, DerivError> + Send + Sync + 'static,
    {
        self.step_limiter = Some(Arc::new(limiter));
        self
    }

    pub fn with_target_group(mut self, group: &str) -> Self {
        self.target_group = Some(group.to_string());
        self
    }
}

impl fmt::Debug for FdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdConfig")
            .field("dxs", &self.dxs)
            .field("step_limiter", &self.step_limiter.as_ref().map(|_| "<fn>"))
            .field("target_group", &self.target_group)
            .finish()
    }
}

/// Perturbed copies of a batch, one `(minus, plus)` pair per input dimension,
/// together with the per-row steps used for each dimension.
#[derive(Debug, Clone)]
pub struct Stencil {
    pub pairs: Vec<(Tensor, Tensor)>,
    pub steps: Vec<Vec<f64>>,
}

/// Network outputs on a stencil: the unperturbed evaluation plus one
/// `(minus, plus)` evaluation per input dimension.
struct StencilOutputs {
    center: Tensor,
    adjacent: Vec<(Tensor, Tensor)>,
}

/// Finite-difference engine.
///
/// Supports first and second non-mixed derivatives via the three-point
/// central stencils
///
/// ```text
/// u'  ~ (u(x+h) - u(x-h)) / 2h
/// u'' ~ (u(x-h) - 2u(x) + u(x+h)) / h^2
/// ```
///
/// The step along dimension `i` at a point `p` is `min(dx_i, limiter(p))`.
#[derive(Clone)]
pub struct FdEngine {
    net: Arc<dyn Network>,
    registry: DerivRegistry,
    dxs: Vec<f64>,
    step_limiter: Option<StepLimiter>,
    target_group: Option<String>,
}

impl fmt::Debug for FdEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdEngine")
            .field("net", &self.net)
            .field("derivatives", &self.registry.derivatives().map(|(d, _)| d.name()).collect::<Vec<_>>())
            .field("dxs", &self.dxs)
            .field("target_group", &self.target_group)
            .finish()
    }
}

impl FdEngine {
    /// Builds the engine from a registry snapshot.
    ///
    /// # Errors
    /// * `StepCountMismatch` if the number of steps differs from the number of inputs.
    /// * `InvalidStep` if a base step is not finite and positive.
    /// * `UnsupportedDerivative` if the registry holds a mixed or order > 2 derivative.
    pub fn new(net: Arc<dyn Network>, registry: &DerivRegistry, config: FdConfig) -> Result<Self, DerivError> {
        let dims = registry.input_vars().len();
        let dxs = config.dxs.unwrap_or_else(|| vec![DEFAULT_STEP; dims]);
        if dxs.len() != dims {
            return Err(DerivError::StepCountMismatch {
                expected: dims,
                actual: dxs.len(),
            });
        }
        for (dim, &dx) in dxs.iter().enumerate() {
            if !(dx.is_finite() && dx > 0.0) {
                return Err(DerivError::InvalidStep { dim, row: None, value: dx });
            }
        }
        for (deriv, _) in registry.derivatives() {
            check_supported(deriv)?;
        }
        debug!("FD engine built with steps {:?} over {} derivatives", dxs, registry.derivatives().count());
        Ok(FdEngine {
            net,
            registry: registry.clone(),
            dxs,
            step_limiter: config.step_limiter,
            target_group: config.target_group,
        })
    }

    pub fn dxs(&self) -> &[f64] {
        &self.dxs
    }

    /// Per-row steps actually used for each input dimension: `steps[i][r]`.
    pub fn effective_steps(&self, x: &Tensor) -> Result<Vec<Vec<f64>>, DerivError> {
        let bound = self.step_bound(x)?;
        // f64::min drops NaN, so a NaN bound must be caught before clipping.
        if let Some((row, &value)) = bound.iter().enumerate().find(|(_, b)| b.is_nan()) {
            return Err(DerivError::InvalidStep { dim: 0, row: Some(row), value });
        }
        let mut steps = Vec::with_capacity(self.dxs.len());
        for (dim, &dx) in self.dxs.iter().enumerate() {
            let h: Vec<f64> = bound.iter().map(|&b| b.min(dx)).collect();
            if let Some((row, &value)) = h.iter().enumerate().find(|(_, v)| !(v.is_finite() && **v > 0.0)) {
                return Err(DerivError::InvalidStep { dim, row: Some(row), value });
            }
            steps.push(h);
        }
        Ok(steps)
    }

    /// Builds the `(x - h_i e_i, x + h_i e_i)` pairs for every input dimension `i`.
    pub fn generate_stencil(&self, x: &Tensor) -> Result<Stencil, DerivError> {
        if x.rank() != 2 || x.cols() != self.dxs.len() {
            return Err(DerivError::DimensionMismatch {
                expected: self.dxs.len(),
                actual: x.cols(),
            });
        }
        let steps = self.effective_steps(x)?;
        let mut pairs = Vec::with_capacity(steps.len());
        for (dim, h) in steps.iter().enumerate() {
            pairs.push((x.shift_column(dim, h, -1.0)?, x.shift_column(dim, h, 1.0)?));
        }
        Ok(Stencil { pairs, steps })
    }

    /// Outputs and derivatives of a single batch.
    pub fn finite_diff(&self, x: &Tensor) -> Result<DerivMap, DerivError> {
        let stencil = self.generate_stencil(x)?;
        let outputs = self.evaluate_stencil(x, &stencil)?;
        let mut result = outputs_by_name(&self.registry, &outputs.center)?;
        result.extend(self.get_derivs(&outputs, &stencil.steps)?);
        Ok(result)
    }

    /// Runs the centre batch and all perturbed batches through the network in one pass.
    fn evaluate_stencil(&self, x: &Tensor, stencil: &Stencil) -> Result<StencilOutputs, DerivError> {
        let n = x.rows();
        let mut batches: Vec<&Tensor> = Vec::with_capacity(2 * stencil.pairs.len() + 1);
        batches.push(x);
        for (minus, plus) in &stencil.pairs {
            batches.push(minus);
            batches.push(plus);
        }
        let xs = Tensor::cat_rows(&batches)?;
        let u = self.net.forward(&xs)?;
        if u.rank() != 2 || u.rows() != xs.rows() {
            return Err(DerivError::ShapeMismatch {
                expected: vec![xs.rows(), self.registry.output_vars().len()],
                actual: u.shape().to_vec(),
                operation: "FdEngine forward pass".to_string(),
            });
        }

        // Chunk 0 is the centre, then (minus, plus) for each dimension in order.
        let mut chunks = u.split_rows(&vec![n; batches.len()])?;
        let rest = chunks.split_off(1);
        let center = chunks.remove(0);
        let mut rest = rest.into_iter();
        let mut adjacent = Vec::with_capacity(stencil.pairs.len());
        while let (Some(minus), Some(plus)) = (rest.next(), rest.next()) {
            adjacent.push((minus, plus));
        }
        Ok(StencilOutputs { center, adjacent })
    }

    fn get_derivs(&self, outputs: &StencilOutputs, steps: &[Vec<f64>]) -> Result<DerivMap, DerivError> {
        let mut group = DerivMap::new();
        for (deriv, idx) in self.registry.derivatives() {
            check_supported(deriv)?;
            // i: output column, j: input column
            let i = idx[0];
            let j = idx[1];
            let (minus, plus) = &outputs.adjacent[j];
            let u1 = minus.column(i)?;
            let u2 = outputs.center.column(i)?;
            let u3 = plus.column(i)?;
            let h = &steps[j];

            let values = match deriv.order() {
                1 => first_derivative(u1.data(), u3.data(), h),
                _ => second_derivative(u1.data(), u2.data(), u3.data(), h),
            };
            let tensor = Tensor::new(values, vec![h.len()])?.to_device(outputs.center.device());
            group.insert(deriv.name(), tensor);
        }
        Ok(group)
    }

    fn step_bound(&self, x: &Tensor) -> Result<Vec<f64>, DerivError> {
        let limiter = match &self.step_limiter {
            Some(limiter) => limiter,
            None => return Ok(vec![f64::INFINITY; x.rows()]),
        };
        let bound = limiter(x)?;
        if bound.device() != x.device() {
            return Err(DerivError::DeviceMismatch {
                expected: x.device(),
                actual: bound.device(),
                operation: "step limiter".to_string(),
            });
        }
        if bound.rows() != x.rows() || bound.cols() != 1 {
            return Err(DerivError::ShapeMismatch {
                expected: vec![x.rows()],
                actual: bound.shape().to_vec(),
                operation: "step limiter".to_string(),
            });
        }
        Ok(bound.into_vec())
    }
}

impl Engine for FdEngine {
    fn calculate(&self, x: &EngineInput, options: &CalcOptions) -> Result<GroupedDerivs, DerivError> {
        let target = options.target_group.as_deref().or(self.target_group.as_deref());
        match x {
            EngineInput::Batch(batch) => {
                let key = target.unwrap_or(ALL_GROUP).to_string();
                let mut out = GroupedDerivs::new();
                out.insert(key, self.finite_diff(batch)?);
                Ok(out)
            }
            EngineInput::Groups(groups) => {
                let (name, batch) = resolve_target(groups, target)?.ok_or(DerivError::MissingTargetGroup)?;
                let mut out = net_pass(self.net.as_ref(), &self.registry, groups)?;
                let derivs = self.finite_diff(batch)?;
                out.entry(name.to_string()).or_default().extend(derivs);
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "FD"
    }
}

fn check_supported(deriv: &Deriv) -> Result<(), DerivError> {
    if deriv.order() > 2 {
        return Err(DerivError::UnsupportedDerivative {
            spec: deriv.name(),
            reason: format!("order {} requested, only up to second order is supported", deriv.order()),
        });
    }
    if deriv.is_mixed() {
        return Err(DerivError::UnsupportedDerivative {
            spec: deriv.name(),
            reason: "mixed derivatives are not supported".to_string(),
        });
    }
    Ok(())
}

/// Central first difference over a three-point stencil `u1 = u(x-h)`, `u3 = u(x+h)`.
fn first_derivative(u1: &[f64], u3: &[f64], h: &[f64]) -> Vec<f64> {
    u1.iter()
        .zip(u3)
        .zip(h)
        .map(|((a, c), h)| (c - a) / (2.0 * h))
        .collect()
}

/// Central second difference over `u1 = u(x-h)`, `u2 = u(x)`, `u3 = u(x+h)`.
fn second_derivative(u1: &[f64], u2: &[f64], u3: &[f64], h: &[f64]) -> Vec<f64> {
    u1.iter()
        .zip(u2)
        .zip(u3)
        .zip(h)
        .map(|(((a, b), c), h)| (a - 2.0 * b + c) / (h * h))
        .collect()
}

#[cfg(test)]
#[path = "fd_test.rs"]
mod tests;
