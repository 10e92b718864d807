use crate::agent::PendingUpdate;

use super::super::{Flock, SimulationError};

impl Flock {
    /// Apply all pending updates, move, then enforce the edge policy.
    ///
    /// The next step is built in `staged` and swapped in only if every agent
    /// stays finite; on a fault the committed agents are left untouched.
    pub(in crate::simulation) fn step_commit_phase(
        &mut self,
        pending: &[PendingUpdate],
        step: usize,
    ) -> Result<(), SimulationError> {
        debug_assert_eq!(pending.len(), self.agents.len());
        self.staged.clear();
        for (agent, update) in self.agents.iter().zip(pending) {
            let mut next = agent.clone();
            next.commit(*update);
            next.advance();
            self.space.apply_boundary(&mut next.position);
            if !next.is_finite() {
                return Err(SimulationError::NumericFault {
                    agent_id: next.id,
                    step,
                });
            }
            self.staged.push(next);
        }
        std::mem::swap(&mut self.agents, &mut self.staged);
        Ok(())
    }
}
