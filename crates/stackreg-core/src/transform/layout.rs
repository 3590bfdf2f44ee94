//! Partition of a stacked parameter vector into per-element ranges.

use std::ops::Range;
use crate::error::{Result, TransformError};
use super::derivative::NonZeroIndices;

/// Per-element parameter counts and their prefix-sum offsets.
///
/// Element `i` owns the contiguous range
/// `offset(i)..offset(i) + count(i)` of the stacked parameter vector, with
/// `offset(0) = 0` and `offset(i + 1) = offset(i) + count(i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    counts: Vec<usize>,
    offsets: Vec<usize>,
    total: usize,
}

impl ParameterLayout {
    /// Build the layout from per-element parameter counts.
    pub fn new(counts: Vec<usize>) -> Self {
        let mut offsets = Vec::with_capacity(counts.len());
        let mut total = 0;
        for &count in &counts {
            offsets.push(total);
            total += count;
        }
        Self { counts, offsets, total }
    }

    /// Check the layout against a separately declared parameter total.
    pub fn validate(&self, declared_total: usize) -> Result<()> {
        if self.total != declared_total {
            return Err(TransformError::invalid_configuration(format!(
                "element parameter counts {:?} sum to {}, but {} parameters were declared",
                self.counts, self.total, declared_total
            )));
        }
        Ok(())
    }

    pub fn number_of_elements(&self) -> usize {
        self.counts.len()
    }

    /// Total number of stacked parameters.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, element: usize) -> usize {
        self.counts[element]
    }

    pub fn offset(&self, element: usize) -> usize {
        self.offsets[element]
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Global parameter range owned by `element`.
    pub fn range(&self, element: usize) -> Range<usize> {
        self.offsets[element]..self.offsets[element] + self.counts[element]
    }

    /// Element owning a global parameter index.
    pub fn element_of(&self, global: usize) -> Option<usize> {
        if global >= self.total {
            return None;
        }
        // Last element whose offset is <= global; empty elements are skipped
        // because their range is empty.
        let candidate = self.offsets.partition_point(|&o| o <= global) - 1;
        (0..=candidate).rev().find(|&e| self.range(e).contains(&global))
    }

    /// Map element-local parameter indices to stacked indices.
    ///
    /// `global = local + offset(element)`. Fails when a local index lies
    /// outside the element's range or the element does not exist.
    pub fn to_global(&self, element: usize, mut local: NonZeroIndices) -> Result<NonZeroIndices> {
        let Some(&count) = self.counts.get(element) else {
            return Err(TransformError::IndexOutOfRange {
                index: element as i64,
                count: self.counts.len(),
            });
        };
        let offset = self.offsets[element];
        for index in local.iter_mut() {
            if *index >= count {
                return Err(TransformError::dimension_mismatch(format!(
                    "local parameter index {} exceeds the {} parameters of element {}",
                    index, count, element
                )));
            }
            *index += offset;
        }
        Ok(local)
    }

    /// Split a stacked parameter vector into per-element slices.
    pub fn split<'a>(&self, parameters: &'a [f64]) -> Result<Vec<&'a [f64]>> {
        if parameters.len() != self.total {
            return Err(TransformError::ParameterCountMismatch {
                expected: self.total,
                actual: parameters.len(),
            });
        }
        Ok((0..self.counts.len()).map(|e| &parameters[self.range(e)]).collect())
    }

    /// Concatenate per-element vectors in stack order.
    pub fn join<P: AsRef<[f64]>>(&self, parts: &[P]) -> Result<Vec<f64>> {
        if parts.len() != self.counts.len() {
            return Err(TransformError::dimension_mismatch(format!(
                "expected {} element vectors, got {}",
                self.counts.len(),
                parts.len()
            )));
        }
        let mut joined = Vec::with_capacity(self.total);
        for (element, part) in parts.iter().enumerate() {
            let part = part.as_ref();
            if part.len() != self.counts[element] {
                return Err(TransformError::ParameterCountMismatch {
                    expected: self.counts[element],
                    actual: part.len(),
                });
            }
            joined.extend_from_slice(part);
        }
        Ok(joined)
    }
}
