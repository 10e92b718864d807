use super::{Behavior, Neighborhood};
use crate::agent::PendingUpdate;
use crate::config::{ModelKind, VicsekParams};
use crate::vector::{circular_mean, wrap_angle};
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::iter;

/// Vicsek alignment: adopt the circular mean heading of self and neighbors,
/// perturbed by uniform noise of width `noise_strength`.
#[derive(Clone, Debug)]
pub struct VicsekRules {
    params: VicsekParams,
}

impl VicsekRules {
    pub fn new(params: VicsekParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &VicsekParams {
        &self.params
    }
}

impl Behavior for VicsekRules {
    fn kind(&self) -> ModelKind {
        ModelKind::Vicsek
    }

    fn primary_radius(&self) -> f64 {
        self.params.interaction_radius
    }

    fn compute_update(
        &self,
        idx: usize,
        neighborhood: &Neighborhood<'_>,
        rng: &mut ChaCha12Rng,
    ) -> PendingUpdate {
        let me = neighborhood.agent(idx);
        let headings = iter::once(me.heading).chain(
            neighborhood
                .within(idx, self.params.interaction_radius)
                .map(|other| other.heading),
        );
        // Self is always included, so the mean exists.
        let mean = circular_mean(headings).unwrap_or(me.heading);
        // Drawn even at zero strength so the stream position never depends on params.
        let noise = (rng.random::<f64>() - 0.5) * self.params.noise_strength;
        PendingUpdate::Heading(wrap_angle(mean + noise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::config::BoundaryMode;
    use crate::rng::create_rng;
    use crate::space::Space;
    use crate::spatial::LinearScanIndex;
    use crate::vector::Vector;
    use std::f64::consts::{PI, TAU};

    fn rules(noise_strength: f64) -> VicsekRules {
        VicsekRules::new(VicsekParams {
            interaction_radius: 1.0,
            noise_strength,
        })
    }

    fn heading_of(update: PendingUpdate) -> f64 {
        match update {
            PendingUpdate::Heading(theta) => theta,
            PendingUpdate::Velocity(_) => panic!("vicsek must produce a heading update"),
        }
    }

    fn compute(rules: &VicsekRules, agents: &[Agent], space: &Space, seed: u64) -> Vec<f64> {
        let index = LinearScanIndex::new(agents, space);
        let hood = Neighborhood::new(agents, &index, space);
        let mut rng = create_rng(seed);
        (0..agents.len())
            .map(|i| heading_of(rules.compute_update(i, &hood, &mut rng)))
            .collect()
    }

    fn torus() -> Space {
        Space::new(2, 10.0, BoundaryMode::Periodic)
    }

    #[test]
    fn antipodal_pair_averages_to_perpendicular() {
        let agents = vec![
            Agent::with_heading(0, Vector::xy(5.0, 5.0), 0.0),
            Agent::with_heading(1, Vector::xy(5.5, 5.0), PI),
        ];
        for theta in compute(&rules(0.0), &agents, &torus(), 1) {
            assert!((theta.sin().abs() - 1.0).abs() < 1e-9, "got {theta}");
        }
    }

    #[test]
    fn mean_heading_wraps_through_zero() {
        let agents = vec![
            Agent::with_heading(0, Vector::xy(5.0, 5.0), 350f64.to_radians()),
            Agent::with_heading(1, Vector::xy(5.5, 5.0), 10f64.to_radians()),
        ];
        for theta in compute(&rules(0.0), &agents, &torus(), 1) {
            let off = theta.min(TAU - theta);
            assert!(off < 1e-9, "expected ~0, got {theta}");
        }
    }

    #[test]
    fn neighbors_are_found_across_the_wrap() {
        let agents = vec![
            Agent::with_heading(0, Vector::xy(0.2, 5.0), 0.0),
            Agent::with_heading(1, Vector::xy(9.8, 5.0), PI / 2.0),
        ];
        let got = compute(&rules(0.0), &agents, &torus(), 1);
        assert!((got[0] - PI / 4.0).abs() < 1e-12);
        assert!((got[1] - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn isolated_agent_keeps_heading_without_noise() {
        let agents = vec![
            Agent::with_heading(0, Vector::xy(1.0, 1.0), 2.0),
            Agent::with_heading(1, Vector::xy(6.0, 6.0), 4.0),
        ];
        let got = compute(&rules(0.0), &agents, &torus(), 1);
        assert!((got[0] - 2.0).abs() < 1e-12);
        assert!((got[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn noise_is_bounded_and_seeded() {
        let agents = vec![Agent::with_heading(0, Vector::xy(1.0, 1.0), PI)];
        let strength = 0.8;
        let a = compute(&rules(strength), &agents, &torus(), 42);
        let b = compute(&rules(strength), &agents, &torus(), 42);
        assert_eq!(a, b);
        assert!((a[0] - PI).abs() <= strength / 2.0 + 1e-12);
        assert!((0.0..TAU).contains(&a[0]));
    }
}
