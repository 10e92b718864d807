use super::{Behavior, Neighborhood};
use crate::agent::PendingUpdate;
use crate::config::{BoidsParams, ModelKind};
use crate::vector::Vector;
use rand_chacha::ChaCha12Rng;

/// Reynolds-style flocking: cohesion, separation, alignment and a soft
/// border push, summed onto the current velocity and renormalized.
#[derive(Clone, Debug)]
pub struct BoidsRules {
    params: BoidsParams,
}

impl BoidsRules {
    pub fn new(params: BoidsParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BoidsParams {
        &self.params
    }

    /// Constant push away from any edge closer than `border_distance`.
    /// Never applied on a torus, where edges are not walls.
    fn border_push(&self, position: &Vector, neighborhood: &Neighborhood<'_>) -> Vector {
        let space = neighborhood.space();
        let mut push = Vector::zeros(position.dims());
        if space.is_periodic() {
            return push;
        }
        let near = self.params.border_distance;
        let far = space.extent() - self.params.border_distance;
        for axis in 0..position.dims() {
            if position[axis] < near {
                push[axis] += self.params.border_strength;
            } else if position[axis] > far {
                push[axis] -= self.params.border_strength;
            }
        }
        push
    }
}

impl Behavior for BoidsRules {
    fn kind(&self) -> ModelKind {
        ModelKind::Boids
    }

    fn primary_radius(&self) -> f64 {
        self.params.outer_radius
    }

    fn compute_update(
        &self,
        idx: usize,
        neighborhood: &Neighborhood<'_>,
        _rng: &mut ChaCha12Rng,
    ) -> PendingUpdate {
        let me = neighborhood.agent(idx);
        let space = neighborhood.space();
        let dims = me.position.dims();
        let inner_sq = self.params.inner_radius * self.params.inner_radius;

        let mut count = 0usize;
        let mut offset_sum = Vector::zeros(dims);
        let mut velocity_sum = Vector::zeros(dims);
        let mut separation = Vector::zeros(dims);

        // Inner neighbors are a subset of outer ones since inner <= outer.
        for other in neighborhood.within(idx, self.params.outer_radius) {
            let offset = space.displacement(&me.position, &other.position);
            count += 1;
            offset_sum += offset;
            velocity_sum += other.velocity;
            if offset.norm_squared() <= inner_sq {
                separation -= offset;
            }
        }

        let mut steer = me.velocity;
        if count > 0 {
            let n = count as f64;
            // Mean offset to the neighbors is the (minimum-image) centroid minus self.
            steer += offset_sum / n * self.params.cohesion_strength;
            steer += (velocity_sum / n - me.velocity) * self.params.alignment_strength;
        }
        steer += separation * self.params.separation_strength;
        steer += self.border_push(&me.position, neighborhood);

        PendingUpdate::Velocity(steer.normalize())
    }
}
