// src/registry.rs

use crate::error::DerivError;
use crate::symbols::{Deriv, VariableSet};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Ordered mapping from derivative specification to its index tuple.
///
/// The index tuple of a derivative is `(output_idx, input_idx_1, ..., input_idx_k)`:
/// the output column followed by one input column per differentiation, in
/// written order. Every engine reads this tuple the same way, which is what
/// makes engines interchangeable.
///
/// Every output variable is registered with its order-0 entry `(output_idx,)`
/// on construction. Registering a derivative of order `k` also registers all of
/// its prerequisites of order `k-1` down to 0, so the registry is always
/// closed under [`Deriv::previous`].
///
/// Engines receive a clone of the registry when they are built and never see
/// later registrations. Registration takes `&mut self`; registering while
/// another thread evaluates through the same owner requires external
/// synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivRegistry {
    inputs: VariableSet,
    outputs: VariableSet,
    entries: Vec<(Deriv, Vec<usize>)>,
    lookup: HashMap<Deriv, usize>,
}

impl DerivRegistry {
    /// Creates a registry holding the order-0 entry of every output variable.
    pub fn new(inputs: VariableSet, outputs: VariableSet) -> Self {
        let mut registry = DerivRegistry {
            inputs,
            outputs,
            entries: Vec::new(),
            lookup: HashMap::new(),
        };
        let bare: Vec<Deriv> = registry.outputs.iter().cloned().map(Deriv::output_only).collect();
        for deriv in bare {
            // Output indices are positions in `outputs`, so this cannot fail.
            if let Ok(index) = registry.compute_index(&deriv) {
                registry.insert(deriv, index);
            }
        }
        registry
    }

    pub fn input_vars(&self) -> &VariableSet {
        &self.inputs
    }

    pub fn output_vars(&self) -> &VariableSet {
        &self.outputs
    }

    /// Parses `spec` and registers it with its prerequisites.
    pub fn register_str(&mut self, spec: &str) -> Result<(), DerivError> {
        let deriv = Deriv::parse(spec, &self.inputs, &self.outputs)?;
        self.register(&deriv)
    }

    /// Registers `deriv` and every lower-order prerequisite that is missing.
    ///
    /// Idempotent: registering an already present specification adds nothing.
    pub fn register(&mut self, deriv: &Deriv) -> Result<(), DerivError> {
        // Walk the previous-chain down to order 0 first, then insert from the
        // bottom up so prerequisites always precede their dependents.
        let mut chain = Vec::with_capacity(deriv.order() + 1);
        let mut visited = HashSet::new();
        let mut current = deriv.clone();
        loop {
            if !visited.insert(current.name()) {
                break;
            }
            let is_root = current.order() == 0;
            chain.push(current.clone());
            if is_root {
                break;
            }
            current = current.previous()?;
        }

        // Resolve every index before mutating so a bad variable leaves the registry untouched.
        let mut pending = Vec::with_capacity(chain.len());
        for d in chain.into_iter().rev() {
            if !self.lookup.contains_key(&d) {
                let index = self.compute_index(&d)?;
                pending.push((d, index));
            }
        }
        for (d, index) in pending {
            if !self.lookup.contains_key(&d) {
                debug!("Registering derivative {} -> {:?}", d, index);
                self.insert(d, index);
            }
        }
        Ok(())
    }

    /// Index tuple of `deriv`.
    ///
    /// # Errors
    /// `DerivativeNotFound` if it has not been registered.
    pub fn index_for(&self, deriv: &Deriv) -> Result<&[usize], DerivError> {
        self.lookup
            .get(deriv)
            .map(|&pos| self.entries[pos].1.as_slice())
            .ok_or_else(|| DerivError::DerivativeNotFound(deriv.name()))
    }

    /// The registered entry equal to `deriv`. Its name may differ from
    /// `deriv.name()` when the inputs were written in another order.
    pub fn entry_for(&self, deriv: &Deriv) -> Option<&Deriv> {
        self.lookup.get(deriv).map(|&pos| &self.entries[pos].0)
    }

    /// Index tuple of the entry whose display name is `name` (e.g. `"u_xx"` or `"u"`).
    pub fn index_of(&self, name: &str) -> Result<&[usize], DerivError> {
        self.entries
            .iter()
            .find(|(d, _)| d.name() == name)
            .map(|(_, idx)| idx.as_slice())
            .ok_or_else(|| DerivError::DerivativeNotFound(name.to_string()))
    }

    /// Returns the order-(k-1) prerequisite of `deriv`; fails on order 0.
    pub fn decompose(&self, deriv: &Deriv) -> Result<Deriv, DerivError> {
        deriv.previous()
    }

    pub fn contains(&self, deriv: &Deriv) -> bool {
        self.lookup.contains_key(deriv)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Deriv, &[usize])> {
        self.entries.iter().map(|(d, idx)| (d, idx.as_slice()))
    }

    /// Entries of order 1 and above, i.e. those that need differentiation.
    pub fn derivatives(&self) -> impl Iterator<Item = (&Deriv, &[usize])> {
        self.iter().filter(|(d, _)| d.order() > 0)
    }

    fn compute_index(&self, deriv: &Deriv) -> Result<Vec<usize>, DerivError> {
        let mut index = Vec::with_capacity(deriv.order() + 1);
        index.push(self.outputs.index_of(deriv.output().name())?);
        for var in deriv.inputs() {
            index.push(self.inputs.index_of(var.name())?);
        }
        Ok(index)
    }

    fn insert(&mut self, deriv: Deriv, index: Vec<usize>) {
        self.lookup.insert(deriv.clone(), self.entries.len());
        self.entries.push((deriv, index));
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
