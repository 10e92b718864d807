//! World geometry: extent, dimensionality, and edge topology.

use crate::config::{BoundaryMode, SimConfig};
use crate::vector::Vector;

/// Bounded space the agents move in. Owns no agents; it only answers
/// geometric questions about positions under the active topology.
#[derive(Clone, Debug, PartialEq)]
pub struct Space {
    dimensions: usize,
    extent: f64,
    boundary_mode: BoundaryMode,
}

impl Space {
    pub fn new(dimensions: usize, extent: f64, boundary_mode: BoundaryMode) -> Self {
        debug_assert!(extent.is_finite() && extent > 0.0);
        Self {
            dimensions,
            extent,
            boundary_mode,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.dimensions, config.world_size, config.boundary())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub fn boundary_mode(&self) -> BoundaryMode {
        self.boundary_mode
    }

    pub fn is_periodic(&self) -> bool {
        self.boundary_mode == BoundaryMode::Periodic
    }

    /// Vector from `from` to `to`. Under periodic topology each axis takes the
    /// shortest wrap (minimum image), so the result never exceeds half the
    /// extent per axis.
    pub fn displacement(&self, from: &Vector, to: &Vector) -> Vector {
        let delta = *to - *from;
        match self.boundary_mode {
            BoundaryMode::Reflective => delta,
            BoundaryMode::Periodic => {
                Vector::from_fn(delta.dims(), |axis| wrapped_delta(delta[axis], self.extent))
            }
        }
    }

    pub fn distance_squared(&self, a: &Vector, b: &Vector) -> f64 {
        self.displacement(a, b).norm_squared()
    }

    pub fn distance(&self, a: &Vector, b: &Vector) -> f64 {
        self.distance_squared(a, b).sqrt()
    }

    /// Whether every coordinate lies in `[0, extent)`.
    pub fn contains(&self, position: &Vector) -> bool {
        position.iter().all(|c| (0.0..self.extent).contains(&c))
    }

    /// Apply the edge policy to a freshly moved position. Periodic topology
    /// wraps every axis into `[0, extent)`; reflective topology leaves the
    /// position untouched (agents may leave the box).
    pub fn apply_boundary(&self, position: &mut Vector) {
        if self.boundary_mode == BoundaryMode::Reflective {
            return;
        }
        for axis in 0..position.dims() {
            position[axis] = wrap_coordinate(position[axis], self.extent);
        }
    }
}

/// Shortest signed offset equivalent to `delta` on a ring of length `extent`.
pub(crate) fn wrapped_delta(delta: f64, extent: f64) -> f64 {
    (delta + extent / 2.0).rem_euclid(extent) - extent / 2.0
}

/// Fold a coordinate into `[0, extent)` by whole-extent shifts.
///
/// Shifting is repeated until the value settles because adding `extent` to a
/// tiny negative number can round to exactly `extent`.
pub(crate) fn wrap_coordinate(mut coord: f64, extent: f64) -> f64 {
    if !coord.is_finite() {
        return coord;
    }
    if coord.abs() > 4.0 * extent {
        coord = coord.rem_euclid(extent);
    }
    loop {
        if coord >= extent {
            coord -= extent;
        } else if coord < 0.0 {
            coord += extent;
        } else {
            return coord;
        }
    }
}
