use crate::agent::PendingUpdate;
use crate::behavior::Neighborhood;
use crate::rng::derive_agent_rng;
use crate::spatial::SpatialIndex;
use rayon::prelude::*;

use super::super::Flock;

impl Flock {
    /// Compute every agent's next state from the committed snapshot.
    ///
    /// Reads only `self`, so the fan-out over agents shares nothing mutable.
    /// Each agent draws from its own `(seed, step, id)` stream, which keeps
    /// results identical with and without parallelism.
    pub(in crate::simulation) fn step_update_phase(
        &self,
        index: &dyn SpatialIndex,
        step: usize,
        out: &mut Vec<PendingUpdate>,
    ) {
        let hood = Neighborhood::new(&self.agents, index, &self.space);
        let behavior = self.behavior.as_ref();
        let agents = &self.agents;
        let seed = self.config.seed;

        let compute = |idx: usize| {
            let mut rng = derive_agent_rng(seed, step, agents[idx].id);
            behavior.compute_update(idx, &hood, &mut rng)
        };

        out.clear();
        if self.config.parallel {
            (0..agents.len())
                .into_par_iter()
                .map(compute)
                .collect_into_vec(out);
        } else {
            out.extend((0..agents.len()).map(compute));
        }
    }
}
