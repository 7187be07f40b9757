// src/getter.rs

use crate::engines::{
    AdEngine, AutodiffCapability, CalcOptions, DerivEngine, DerivMethod, Engine, EngineInput, FdEngine,
    GroupedDerivs,
};
use crate::error::DerivError;
use crate::nn::Network;
use crate::registry::DerivRegistry;
use crate::symbols::{Deriv, VarKind, VariableSet};
use crate::tensor::Tensor;
use log::{debug, info, warn};
use std::sync::Arc;

/// Extracts named derivatives of a network's outputs with respect to its inputs.
///
/// Typical use:
///
/// ```
/// use pinnderiv_core::{DeGetter, FnNetwork, Tensor, CalcOptions, DerivMethod};
/// use std::sync::Arc;
///
/// let net = Arc::new(FnNetwork::new(1, 1, |p| vec![p[0].sin()]));
/// let mut getter = DeGetter::new(net);
/// getter.set_vars(&["t"], &["u"]).unwrap();
/// getter.set_derivatives(&["u_t", "u_tt"]).unwrap();
/// getter.set_deriv_method("FD".parse::<DerivMethod>().unwrap()).unwrap();
///
/// let out = getter.calculate(Tensor::from_column(vec![0.0, 0.5]), &CalcOptions::default()).unwrap();
/// let residual = out["all"]["u_tt"].data()[1] + out["all"]["u"].data()[1];
/// assert!(residual.abs() < 1e-5);
/// ```
///
/// The getter owns its registry and engine. Engines receive a snapshot of the
/// registry, so declaring new derivatives rebuilds the engine. Mutating
/// methods take `&mut self`; sharing a getter across threads while
/// registering derivatives needs external synchronization.
#[derive(Debug)]
pub struct DeGetter {
    net: Arc<dyn Network>,
    autodiff: Option<Arc<dyn AutodiffCapability>>,
    registry: Option<DerivRegistry>,
    method: Option<DerivMethod>,
    engine: Option<DerivEngine>,
}

impl DeGetter {
    pub fn new(net: Arc<dyn Network>) -> Self {
        DeGetter {
            net,
            autodiff: None,
            registry: None,
            method: None,
            engine: None,
        }
    }

    /// Provides the autodiff capability used by [`DerivMethod::Autodiff`].
    pub fn with_autodiff(mut self, autodiff: Arc<dyn AutodiffCapability>) -> Self {
        self.autodiff = Some(autodiff);
        self
    }

    /// Declares input and output variables and checks them against the network
    /// with a zero-valued probe batch.
    ///
    /// # Errors
    /// * `InvalidVariableName` / `DuplicateVariable` for bad declarations.
    /// * `InputWidthMismatch` if the network rejects a batch of the declared width.
    /// * `OutputWidthMismatch` if the network output width differs from the outputs declared.
    pub fn set_vars<S: AsRef<str>>(&mut self, input_vars: &[S], output_vars: &[S]) -> Result<(), DerivError> {
        let (inputs, outputs) = Self::declare(input_vars, output_vars)?;
        self.check_network(&inputs, &outputs)?;
        self.install_vars(inputs, outputs)
    }

    /// Like [`DeGetter::set_vars`] without probing the network.
    pub fn set_vars_unchecked<S: AsRef<str>>(&mut self, input_vars: &[S], output_vars: &[S]) -> Result<(), DerivError> {
        let (inputs, outputs) = Self::declare(input_vars, output_vars)?;
        self.install_vars(inputs, outputs)
    }

    /// Parses and registers derivative requests such as `"u_xx"`.
    ///
    /// All requests are validated before anything is registered. On success
    /// the current engine is rebuilt from the new registry; if no method was
    /// chosen yet, autodiff is selected when a capability is available.
    pub fn set_derivatives<S: AsRef<str>>(&mut self, derivatives: &[S]) -> Result<(), DerivError> {
        let current = self
            .registry
            .as_ref()
            .ok_or_else(|| DerivError::VariablesNotSet("setting derivatives".to_string()))?;

        let parsed = derivatives
            .iter()
            .map(|d| Deriv::parse(d.as_ref(), current.input_vars(), current.output_vars()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut registry = current.clone();
        for deriv in &parsed {
            registry.register(deriv)?;
            if let Some(stored) = registry.entry_for(deriv) {
                if stored.name() != deriv.name() {
                    debug!("{} is already registered as {}, results use that name", deriv, stored);
                }
            }
        }

        let method = match (&self.method, &self.autodiff) {
            (Some(method), _) => Some(method.clone()),
            (None, Some(_)) => Some(DerivMethod::Autodiff),
            (None, None) => {
                debug!("No autodiff capability, engine selection deferred");
                None
            }
        };
        let engine = match &method {
            Some(method) => Some(self.build_engine(method, &registry)?),
            None => None,
        };

        self.registry = Some(registry);
        self.method = method;
        self.engine = engine;
        Ok(())
    }

    /// Selects the derivative engine, forwarding its configuration.
    pub fn set_deriv_method(&mut self, method: DerivMethod) -> Result<(), DerivError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| DerivError::VariablesNotSet("selecting a derivative method".to_string()))?;
        let engine = self.build_engine(&method, registry)?;
        info!("Derivative engine set to {}", engine.name());
        self.method = Some(method);
        self.engine = Some(engine);
        Ok(())
    }

    /// Selects the engine by name: `"AD"` or `"FD"` (with default configuration).
    pub fn set_deriv_method_by_name(&mut self, name: &str) -> Result<(), DerivError> {
        self.set_deriv_method(name.parse()?)
    }

    /// Evaluates every registered output and derivative through the selected engine.
    pub fn calculate<X: Into<EngineInput>>(&self, x: X, options: &CalcOptions) -> Result<GroupedDerivs, DerivError> {
        let engine = self.engine.as_ref().ok_or(DerivError::EngineNotSet)?;
        engine.calculate(&x.into(), options)
    }

    pub fn registry(&self) -> Option<&DerivRegistry> {
        self.registry.as_ref()
    }

    pub fn input_vars(&self) -> Option<&VariableSet> {
        self.registry.as_ref().map(|r| r.input_vars())
    }

    pub fn output_vars(&self) -> Option<&VariableSet> {
        self.registry.as_ref().map(|r| r.output_vars())
    }

    /// Name of the selected engine (`"AD"`, `"FD"` or a custom name).
    pub fn engine_name(&self) -> Option<&'static str> {
        self.engine.as_ref().map(|e| e.name())
    }

    fn declare<S: AsRef<str>>(input_vars: &[S], output_vars: &[S]) -> Result<(VariableSet, VariableSet), DerivError> {
        Ok((
            VariableSet::new(VarKind::Input, input_vars)?,
            VariableSet::new(VarKind::Output, output_vars)?,
        ))
    }

    /// Replaces the registry with a fresh one holding only the outputs.
    fn install_vars(&mut self, inputs: VariableSet, outputs: VariableSet) -> Result<(), DerivError> {
        let registry = DerivRegistry::new(inputs, outputs);
        self.engine = match &self.method {
            Some(method) => Some(self.build_engine(method, &registry)?),
            None => None,
        };
        self.registry = Some(registry);
        Ok(())
    }

    fn check_network(&self, inputs: &VariableSet, outputs: &VariableSet) -> Result<(), DerivError> {
        let probe = Tensor::zeros(&[1, inputs.len()])?.to_device(self.net.device());
        let y = match self.net.forward(&probe) {
            Ok(y) => y,
            Err(e) => {
                warn!(
                    "The number of input vars provided {} does not match the input size of the network",
                    inputs.len()
                );
                return Err(DerivError::InputWidthMismatch {
                    declared: inputs.len(),
                    reason: e.to_string(),
                });
            }
        };
        if y.rank() != 2 || y.cols() != outputs.len() {
            warn!(
                "The output of the network of size {} does not match the number of output variables given {}",
                y.cols(),
                outputs.len()
            );
            return Err(DerivError::OutputWidthMismatch {
                network: y.cols(),
                declared: outputs.len(),
            });
        }
        Ok(())
    }

    fn build_engine(&self, method: &DerivMethod, registry: &DerivRegistry) -> Result<DerivEngine, DerivError> {
        match method {
            DerivMethod::Autodiff => {
                let autodiff = self.autodiff.clone().ok_or(DerivError::MissingAutodiff)?;
                Ok(DerivEngine::Autodiff(AdEngine::new(self.net.clone(), registry, autodiff)))
            }
            DerivMethod::FiniteDifference(config) => Ok(DerivEngine::FiniteDifference(FdEngine::new(
                self.net.clone(),
                registry,
                config.clone(),
            )?)),
            DerivMethod::Custom(engine) => Ok(DerivEngine::Custom(engine.clone())),
        }
    }
}

#[cfg(test)]
#[path = "getter_test.rs"]
mod tests;
