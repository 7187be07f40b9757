// src/grouped.rs

use crate::device::StorageDevice;
use crate::error::DerivError;
use crate::tensor::Tensor;

/// Named batches of collocation points, e.g. `"wall"`, `"inlet"`, `"interior"`.
///
/// Groups keep their insertion order, which is also the order used by
/// [`GroupedData::merge`]. All groups must share the same column count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedData {
    groups: Vec<(String, Tensor)>,
}

/// Row range occupied by one group inside a merged batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpan {
    pub name: String,
    pub start: usize,
    pub len: usize,
}

impl GroupedData {
    pub fn new() -> Self {
        GroupedData::default()
    }

    /// Inserts or replaces a group.
    ///
    /// # Errors
    /// `ShapeMismatch` if `batch` is not rank 2 or its width differs from the
    /// groups already present.
    pub fn insert(&mut self, name: &str, batch: Tensor) -> Result<(), DerivError> {
        let width = self
            .groups
            .iter()
            .find(|(n, _)| n != name)
            .map(|(_, t)| t.cols());
        if batch.rank() != 2 || width.is_some_and(|w| w != batch.cols()) {
            return Err(DerivError::ShapeMismatch {
                expected: vec![batch.rows(), width.unwrap_or_else(|| batch.cols())],
                actual: batch.shape().to_vec(),
                operation: format!("GroupedData::insert ('{}')", name),
            });
        }
        match self.groups.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = batch,
            None => self.groups.push((name.to_string(), batch)),
        }
        Ok(())
    }

    /// Builder-style [`GroupedData::insert`].
    pub fn with_group(mut self, name: &str, batch: Tensor) -> Result<Self, DerivError> {
        self.insert(name, batch)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.groups.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Returns a copy with every group tagged with `device`.
    pub fn to_device(&self, device: StorageDevice) -> GroupedData {
        GroupedData {
            groups: self
                .groups
                .iter()
                .map(|(n, t)| (n.clone(), t.to_device(device)))
                .collect(),
        }
    }

    /// Concatenates all groups into one batch and records where each group landed.
    pub fn merge(&self) -> Result<(Tensor, Vec<GroupSpan>), DerivError> {
        let mut spans = Vec::with_capacity(self.groups.len());
        let mut start = 0;
        for (name, batch) in &self.groups {
            spans.push(GroupSpan {
                name: name.clone(),
                start,
                len: batch.rows(),
            });
            start += batch.rows();
        }
        let tensors: Vec<&Tensor> = self.groups.iter().map(|(_, t)| t).collect();
        let merged = Tensor::cat_rows(&tensors)?;
        Ok((merged, spans))
    }
}

impl GroupSpan {
    /// Splits a tensor computed on a merged batch back into one tensor per span.
    pub fn split(spans: &[GroupSpan], merged: &Tensor) -> Result<Vec<Tensor>, DerivError> {
        let sizes: Vec<usize> = spans.iter().map(|s| s.len).collect();
        merged.split_rows(&sizes)
    }
}
