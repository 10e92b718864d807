use crate::agent::Agent;
use crate::space::Space;
use crate::spatial::SpatialIndex;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// Flock-level aggregates at one committed step.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    /// Norm of the mean unit direction, 0 (disordered) to 1 (all aligned).
    pub polarization: f64,
    pub mean_speed: f64,
    /// Mean neighbor count at the model's primary radius.
    pub mean_neighbor_count: f64,
    /// Agents with any coordinate outside `[0, extent)`.
    pub out_of_bounds: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub id: u32,
    pub position: Vector,
    pub velocity: Vector,
    pub heading: f64,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            velocity: agent.velocity,
            heading: agent.heading,
        }
    }
}

/// Read-only copy of every agent, taken after a step commits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SnapshotFrame {
    pub step: usize,
    pub agents: Vec<AgentSnapshot>,
}

impl SnapshotFrame {
    pub fn capture(step: usize, agents: &[Agent]) -> Self {
        Self {
            step,
            agents: agents.iter().map(AgentSnapshot::from).collect(),
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub samples: Vec<StepMetrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<SnapshotFrame>,
    pub final_polarization: f64,
}

/// Receives a frame after every committed step.
pub trait Observer {
    fn observe(&mut self, frame: &SnapshotFrame);
}

impl<F> Observer for F
where
    F: FnMut(&SnapshotFrame),
{
    fn observe(&mut self, frame: &SnapshotFrame) {
        self(frame)
    }
}

/// Order parameter: length of the mean unit direction. Stationary agents
/// contribute a zero direction.
pub fn polarization(agents: &[Agent]) -> f64 {
    let Some(first) = agents.first() else {
        return 0.0;
    };
    let mut sum = Vector::zeros(first.velocity.dims());
    for agent in agents {
        sum += agent.velocity.normalize();
    }
    (sum / agents.len() as f64).norm()
}

pub fn collect_step_metrics(
    step: usize,
    agents: &[Agent],
    space: &Space,
    index: &dyn SpatialIndex,
    neighbor_radius: f64,
) -> StepMetrics {
    let denom = agents.len().max(1) as f64;
    let speed_sum: f64 = agents.iter().map(|a| a.velocity.norm()).sum();
    let neighbor_sum: usize = (0..agents.len())
        .map(|idx| index.count_within(idx, neighbor_radius))
        .sum();
    let out_of_bounds = agents
        .iter()
        .filter(|a| !space.contains(&a.position))
        .count();

    StepMetrics {
        step,
        polarization: polarization(agents),
        mean_speed: speed_sum / denom,
        mean_neighbor_count: neighbor_sum as f64 / denom,
        out_of_bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryMode;
    use crate::spatial::LinearScanIndex;

    #[test]
    fn polarization_of_aligned_flock_is_one() {
        let agents: Vec<Agent> = (0..5)
            .map(|i| Agent::new(i, Vector::xy(i as f64, 0.0), Vector::xy(0.0, 2.0)))
            .collect();
        assert!((polarization(&agents) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn polarization_of_opposed_pair_is_zero() {
        let agents = vec![
            Agent::new(0, Vector::xy(0.0, 0.0), Vector::xy(1.0, 0.0)),
            Agent::new(1, Vector::xy(1.0, 0.0), Vector::xy(-1.0, 0.0)),
        ];
        assert_eq!(polarization(&agents), 0.0);
        assert_eq!(polarization(&[]), 0.0);
    }

    #[test]
    fn collect_counts_neighbors_and_escapes() {
        let agents = vec![
            Agent::new(0, Vector::xy(1.0, 1.0), Vector::xy(1.0, 0.0)),
            Agent::new(1, Vector::xy(2.0, 1.0), Vector::xy(1.0, 0.0)),
            Agent::new(2, Vector::xy(11.0, 1.0), Vector::zeros(2)),
        ];
        let space = Space::new(2, 10.0, BoundaryMode::Reflective);
        let index = LinearScanIndex::new(&agents, &space);
        let m = collect_step_metrics(7, &agents, &space, &index, 1.5);
        assert_eq!(m.step, 7);
        assert_eq!(m.out_of_bounds, 1);
        assert!((m.mean_neighbor_count - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.mean_speed - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.polarization - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn closures_are_observers() {
        let agents = vec![Agent::new(3, Vector::xy(1.0, 1.0), Vector::xy(1.0, 0.0))];
        let mut seen = Vec::new();
        let mut observer = |frame: &SnapshotFrame| seen.push((frame.step, frame.agents[0].id));
        observer.observe(&SnapshotFrame::capture(4, &agents));
        assert_eq!(seen, vec![(4, 3)]);
    }

    #[test]
    fn summary_omits_empty_snapshots() {
        let summary = RunSummary {
            schema_version: 1,
            steps: 2,
            sample_every: 1,
            samples: vec![StepMetrics::default()],
            snapshots: Vec::new(),
            final_polarization: 0.5,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("snapshots"));

        let legacy = r#"{"steps":2,"sample_every":1,"samples":[],"final_polarization":0.0}"#;
        let parsed: RunSummary = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.schema_version, 1);
        assert!(parsed.snapshots.is_empty());
    }
}
