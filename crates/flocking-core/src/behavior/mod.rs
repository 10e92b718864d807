//! Steering rules. Each model turns a read-only view of the previous step
//! into one [`PendingUpdate`] per agent.

mod boids;
mod vicsek;

pub use boids::BoidsRules;
pub use vicsek::VicsekRules;

use crate::agent::{Agent, PendingUpdate};
use crate::config::{ModelKind, ModelParams};
use crate::space::Space;
use crate::spatial::SpatialIndex;
use rand_chacha::ChaCha12Rng;

/// Read-only view of the committed state every agent sees during one step.
#[derive(Clone, Copy)]
pub struct Neighborhood<'a> {
    agents: &'a [Agent],
    index: &'a dyn SpatialIndex,
    space: &'a Space,
}

impl<'a> Neighborhood<'a> {
    pub fn new(agents: &'a [Agent], index: &'a dyn SpatialIndex, space: &'a Space) -> Self {
        Self {
            agents,
            index,
            space,
        }
    }

    pub fn agent(&self, idx: usize) -> &'a Agent {
        &self.agents[idx]
    }

    /// Neighbors of `idx` within `radius`, self excluded, in ascending id
    /// order. Sums over them then do not depend on how agents are stored.
    pub fn within(&self, idx: usize, radius: f64) -> impl Iterator<Item = &'a Agent> + 'a {
        let agents = self.agents;
        let mut found = self.index.neighbors_within(idx, radius);
        found.sort_unstable_by_key(|&n| agents[n].id);
        found.into_iter().map(move |n| &agents[n])
    }

    pub fn space(&self) -> &'a Space {
        self.space
    }
}

/// A flocking model's per-agent update rule.
///
/// `compute_update` must depend only on `neighborhood` and `rng`; it runs
/// concurrently for every agent of a step.
pub trait Behavior: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Radius used for neighbor-count metrics.
    fn primary_radius(&self) -> f64;

    fn compute_update(
        &self,
        idx: usize,
        neighborhood: &Neighborhood<'_>,
        rng: &mut ChaCha12Rng,
    ) -> PendingUpdate;
}

pub fn from_params(params: &ModelParams) -> Box<dyn Behavior> {
    match params {
        ModelParams::Boids(p) => Box::new(BoidsRules::new(p.clone())),
        ModelParams::Vicsek(p) => Box::new(VicsekRules::new(p.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoidsParams, VicsekParams};

    #[test]
    fn from_params_selects_model() {
        let boids = from_params(&ModelParams::Boids(BoidsParams::default()));
        assert_eq!(boids.kind(), ModelKind::Boids);
        assert_eq!(boids.primary_radius(), 10.0);

        let vicsek = from_params(&ModelParams::Vicsek(VicsekParams::default()));
        assert_eq!(vicsek.kind(), ModelKind::Vicsek);
        assert_eq!(vicsek.primary_radius(), 1.0);
    }
}
