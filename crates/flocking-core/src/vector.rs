//! Fixed-dimension vectors for agent positions and velocities.
//!
//! A [`Vector`] carries 2 or 3 components; the dimension is chosen once per
//! run and every vector in that run shares it. Storage is a fixed 3-slot
//! array so vectors stay `Copy` and allocation-free; unused slots are zero.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};
use thiserror::Error;

pub const MIN_DIMENSIONS: usize = 2;
pub const MAX_DIMENSIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("vector must have 2 or 3 components, got {0}")]
pub struct DimensionError(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct Vector {
    coords: [f64; MAX_DIMENSIONS],
    dims: usize,
}

impl Vector {
    /// Zero vector with `dims` components. `dims` must be 2 or 3.
    pub fn zeros(dims: usize) -> Self {
        debug_assert!((MIN_DIMENSIONS..=MAX_DIMENSIONS).contains(&dims));
        Self {
            coords: [0.0; MAX_DIMENSIONS],
            dims,
        }
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            coords: [x, y, 0.0],
            dims: 2,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            coords: [x, y, z],
            dims: 3,
        }
    }

    pub fn from_slice(components: &[f64]) -> Result<Self, DimensionError> {
        let dims = components.len();
        if !(MIN_DIMENSIONS..=MAX_DIMENSIONS).contains(&dims) {
            return Err(DimensionError(dims));
        }
        let mut coords = [0.0; MAX_DIMENSIONS];
        coords[..dims].copy_from_slice(components);
        Ok(Self { coords, dims })
    }

    /// Build a vector of `dims` components from a per-axis function.
    pub fn from_fn(dims: usize, mut f: impl FnMut(usize) -> f64) -> Self {
        let mut v = Self::zeros(dims);
        for axis in 0..dims {
            v.coords[axis] = f(axis);
        }
        v
    }

    /// Unit vector pointing along planar heading `theta` (radians, measured
    /// from +x toward +y). Any third axis is zero.
    pub fn from_heading(theta: f64, dims: usize) -> Self {
        let (sin, cos) = theta.sin_cos();
        let mut v = Self::zeros(dims);
        v.coords[0] = cos;
        v.coords[1] = sin;
        v
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.coords[..self.dims]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }

    /// Components padded to three axes, used as an R*-tree point.
    pub fn to_point(self) -> [f64; MAX_DIMENSIONS] {
        self.coords
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Scale to unit length. The zero vector is returned unchanged so a
    /// momentarily stationary agent stays stationary.
    pub fn normalize(self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            self
        } else {
            self / norm
        }
    }

    pub fn distance_squared(&self, other: &Self) -> f64 {
        (*self - *other).norm_squared()
    }

    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|c| c == 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(f64::is_finite)
    }

    /// Planar heading `atan2(y, x)` in (-π, π].
    pub fn heading(&self) -> f64 {
        self.coords[1].atan2(self.coords[0])
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Circular mean of a set of angles via cos/sin summation, in (-π, π].
///
/// Returns `None` for an empty set. Antipodal inputs have no well-defined
/// mean; the result is then whatever `atan2` makes of the rounding residue.
pub fn circular_mean(angles: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sum_cos = 0.0;
    let mut sum_sin = 0.0;
    let mut count = 0usize;
    for theta in angles {
        let (sin, cos) = theta.sin_cos();
        sum_cos += cos;
        sum_sin += sin;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some((sum_sin / n).atan2(sum_cos / n))
}

impl Default for Vector {
    fn default() -> Self {
        Self::zeros(MIN_DIMENSIONS)
    }
}

impl From<Vector> for Vec<f64> {
    fn from(v: Vector) -> Self {
        v.as_slice().to_vec()
    }
}

impl TryFrom<Vec<f64>> for Vector {
    type Error = DimensionError;

    fn try_from(components: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&components)
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.as_slice()[axis]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, axis: usize) -> &mut f64 {
        &mut self.coords[..self.dims][axis]
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        debug_assert_eq!(self.dims, rhs.dims);
        for axis in 0..self.dims {
            self.coords[axis] += rhs.coords[axis];
        }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Self) {
        debug_assert_eq!(self.dims, rhs.dims);
        for axis in 0..self.dims {
            self.coords[axis] -= rhs.coords[axis];
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(mut self, rhs: f64) -> Self {
        self *= rhs;
        self
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, rhs: f64) {
        for axis in 0..self.dims {
            self.coords[axis] *= rhs;
        }
    }
}

impl Div<f64> for Vector {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::from_fn(self.dims, |axis| self.coords[axis] / rhs)
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        self * -1.0
    }
}
