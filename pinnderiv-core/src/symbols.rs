// src/symbols.rs

//! Variables and derivative specifications.
//!
//! A derivative request such as `"u_xx"` names an output variable (`u`), a
//! separator and the ordered sequence of input variables to differentiate
//! with respect to (`x`, `x`). Parsed requests become [`Deriv`] values, which
//! can be walked back to their lower-order prerequisites with
//! [`Deriv::previous`].

use crate::error::DerivError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator between the output variable and the input variables.
pub const SEPARATOR: char = '_';

/// A named scalar input or output dimension of the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    /// Creates a variable, rejecting empty names and names containing the separator.
    pub fn new(name: &str) -> Result<Self, DerivError> {
        if name.is_empty() || name.contains(SEPARATOR) {
            return Err(DerivError::InvalidVariableName(name.to_string()));
        }
        Ok(Variable(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a [`VariableSet`] holds network inputs or outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Input,
    Output,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Input => f.write_str("input"),
            VarKind::Output => f.write_str("output"),
        }
    }
}

/// Ordered, duplicate-free set of variables with a name -> column index map.
///
/// The position of a variable is the column it occupies in the network's
/// input (or output) tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSet {
    kind: VarKind,
    vars: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableSet {
    pub fn new<S: AsRef<str>>(kind: VarKind, names: &[S]) -> Result<Self, DerivError> {
        let mut vars = Vec::with_capacity(names.len());
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let var = Variable::new(name.as_ref())?;
            if index.insert(var.name().to_string(), i).is_some() {
                return Err(DerivError::DuplicateVariable {
                    name: var.name().to_string(),
                    kind: kind.to_string(),
                });
            }
            vars.push(var);
        }
        Ok(VariableSet { kind, vars, index })
    }

    pub fn kind(&self) -> VarKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column index of `name`.
    pub fn index_of(&self, name: &str) -> Result<usize, DerivError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| DerivError::UnknownVariable {
                name: name.to_string(),
                kind: self.kind.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Result<&Variable, DerivError> {
        self.index_of(name).map(|i| &self.vars[i])
    }

    /// Splits `text` into declared variable names.
    ///
    /// Longer names are tried first at each position; when a choice leads to
    /// a dead end the next shorter match is tried. With single-character
    /// names this is a per-character lookup.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Variable>, DerivError> {
        let mut by_length: Vec<&Variable> = self.vars.iter().collect();
        by_length.sort_by(|a, b| b.name().len().cmp(&a.name().len()));

        // Frames are (byte position, next candidate to try there).
        let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
        let mut chosen: Vec<&Variable> = Vec::new();
        // Positions from which no split of the remainder exists.
        let mut dead: HashSet<usize> = HashSet::new();
        let mut furthest = 0;

        while let Some(frame) = stack.last_mut() {
            let pos = frame.0;
            if pos == text.len() {
                return Ok(chosen.into_iter().cloned().collect());
            }
            furthest = furthest.max(pos);
            let rest = &text[pos..];
            let found = if dead.contains(&pos) {
                None
            } else {
                by_length
                    .iter()
                    .enumerate()
                    .skip(frame.1)
                    .find(|(_, v)| rest.starts_with(v.name()))
                    .map(|(i, v)| (i, *v))
            };
            match found {
                Some((i, var)) => {
                    frame.1 = i + 1;
                    chosen.push(var);
                    stack.push((pos + var.name().len(), 0));
                }
                None => {
                    dead.insert(pos);
                    stack.pop();
                    chosen.pop();
                }
            }
        }

        let unknown = text[furthest..].chars().next().map(String::from).unwrap_or_default();
        Err(DerivError::UnknownVariable {
            name: unknown,
            kind: self.kind.to_string(),
        })
    }
}

/// Canonical description of a requested partial derivative.
///
/// `inputs` keeps the written order, which determines the display name and
/// the order in which [`Deriv::previous`] peels variables off. Equality and
/// hashing treat `inputs` as a multiset, so `u_xy` and `u_yx` denote the same
/// derivative. An empty `inputs` list is the bare output variable (order 0).
#[derive(Debug, Clone)]
pub struct Deriv {
    output: Variable,
    inputs: Vec<Variable>,
}

impl Deriv {
    pub fn new(output: Variable, inputs: Vec<Variable>) -> Self {
        Deriv { output, inputs }
    }

    /// The order-0 specification: the network output itself.
    pub fn output_only(output: Variable) -> Self {
        Deriv {
            output,
            inputs: Vec::new(),
        }
    }

    /// Parses `"OUTPUT_INPUTS"` against the declared variables.
    ///
    /// The string must contain the separator exactly once, the left part must
    /// be a declared output and the right part a non-empty sequence of
    /// declared inputs.
    pub fn parse(spec: &str, inputs: &VariableSet, outputs: &VariableSet) -> Result<Self, DerivError> {
        let malformed = |reason: &str| DerivError::MalformedDerivative {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let separators = spec.matches(SEPARATOR).count();
        if separators == 0 {
            return Err(malformed("missing '_' between output and input variables"));
        }
        if separators > 1 {
            return Err(malformed("'_' must appear exactly once"));
        }
        let (output_name, input_names) = spec
            .split_once(SEPARATOR)
            .ok_or_else(|| malformed("missing '_' between output and input variables"))?;
        if input_names.is_empty() {
            return Err(malformed("no input variables after '_'"));
        }

        let output = outputs.get(output_name)?.clone();
        let input_vars = inputs.tokenize(input_names)?;
        Ok(Deriv::new(output, input_vars))
    }

    pub fn output(&self) -> &Variable {
        &self.output
    }

    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    pub fn order(&self) -> usize {
        self.inputs.len()
    }

    /// True when more than one distinct input variable is involved.
    pub fn is_mixed(&self) -> bool {
        self.inputs.windows(2).any(|w| w[0] != w[1])
    }

    /// Display name, e.g. `u_xx`, or `u` for order 0.
    pub fn name(&self) -> String {
        if self.inputs.is_empty() {
            return self.output.name().to_string();
        }
        let mut name = String::from(self.output.name());
        name.push(SEPARATOR);
        for var in &self.inputs {
            name.push_str(var.name());
        }
        name
    }

    /// The order-(k-1) specification obtained by dropping the last input variable.
    ///
    /// # Errors
    /// `NoPreviousDerivative` for an order-0 specification.
    pub fn previous(&self) -> Result<Deriv, DerivError> {
        if self.inputs.is_empty() {
            return Err(DerivError::NoPreviousDerivative(self.name()));
        }
        Ok(Deriv {
            output: self.output.clone(),
            inputs: self.inputs[..self.inputs.len() - 1].to_vec(),
        })
    }

    fn sorted_inputs(&self) -> Vec<&Variable> {
        let mut sorted: Vec<&Variable> = self.inputs.iter().collect();
        sorted.sort();
        sorted
    }
}

impl PartialEq for Deriv {
    fn eq(&self, other: &Self) -> bool {
        self.output == other.output && self.sorted_inputs() == other.sorted_inputs()
    }
}

impl Eq for Deriv {}

impl Hash for Deriv {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.output.hash(state);
        self.sorted_inputs().hash(state);
    }
}

impl fmt::Display for Deriv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
#[path = "symbols_test.rs"]
mod tests;
