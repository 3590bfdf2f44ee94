//! Point type for representing spatial coordinates.
//!
//! Points represent positions in physical space.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};
use super::Vector;

/// A point in D-dimensional space.
///
/// Thin wrapper around nalgebra's Point. Transforms consume points by
/// reference and return new points; the core never mutates a caller's point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// Create a point at the origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Create a point whose `i`-th coordinate is `f(i)`.
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Self::new(std::array::from_fn(f))
    }

    /// Create a new point from a slice of coordinates.
    ///
    /// Returns `None` when the slice length differs from `D`.
    pub fn from_slice(coords: &[f64]) -> Option<Self> {
        if coords.len() != D {
            return None;
        }
        Some(Self::from_fn(|i| coords[i]))
    }

    /// Convert point to a vector of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.coords.iter().copied().collect()
    }

    /// Coordinates as a fixed-size array.
    pub fn to_array(&self) -> [f64; D] {
        std::array::from_fn(|i| self.0.coords[i])
    }

    /// Keep the leading `R` coordinates.
    ///
    /// `R` must not exceed `D`.
    pub fn leading<const R: usize>(&self) -> Point<R> {
        debug_assert!(R <= D);
        Point::<R>::from_fn(|i| self.0.coords[i])
    }

    /// Embed an `R`-dimensional point into `D` dimensions, filling the
    /// trailing coordinates from `self`.
    pub fn with_leading<const R: usize>(&self, leading: &Point<R>) -> Self {
        debug_assert!(R <= D);
        Self::from_fn(|i| if i < R { leading[i] } else { self.0.coords[i] })
    }

    /// The last coordinate.
    pub fn last(&self) -> f64 {
        self.0.coords[D - 1]
    }

    /// True when every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.coords.iter().all(|c| c.is_finite())
    }

    /// Get the inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}
