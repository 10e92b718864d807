use crate::agent::Agent;
use crate::config::IndexKind;
use crate::space::Space;
use crate::vector::MAX_DIMENSIONS;
use rstar::{RTree, RTreeObject, AABB};

/// Radius queries against the committed positions of one step.
///
/// Implementations must agree exactly on membership: an agent is a neighbor
/// when its distance under the space's topology is `<= radius`. The querying
/// agent is never part of its own neighborhood. Results are agent indices
/// (positions in the snapshot slice) in ascending order so downstream sums are
/// reproducible.
pub trait SpatialIndex: Sync {
    fn neighbors_within(&self, agent_idx: usize, radius: f64) -> Vec<usize>;

    /// Count neighbors without collecting them.
    fn count_within(&self, agent_idx: usize, radius: f64) -> usize {
        self.neighbors_within(agent_idx, radius).len()
    }
}

/// Reference index: scans every agent for every query.
pub struct LinearScanIndex<'a> {
    agents: &'a [Agent],
    space: &'a Space,
}

impl<'a> LinearScanIndex<'a> {
    pub fn new(agents: &'a [Agent], space: &'a Space) -> Self {
        Self { agents, space }
    }
}

impl SpatialIndex for LinearScanIndex<'_> {
    fn neighbors_within(&self, agent_idx: usize, radius: f64) -> Vec<usize> {
        let center = &self.agents[agent_idx].position;
        let r_sq = radius * radius;
        self.agents
            .iter()
            .enumerate()
            .filter(|&(idx, other)| {
                idx != agent_idx && self.space.distance_squared(center, &other.position) <= r_sq
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Lightweight position-only struct for spatial indexing to avoid cloning full agents.
#[derive(Clone, Debug)]
pub struct AgentLocation {
    pub index: usize,
    pub position: [f64; MAX_DIMENSIONS],
}

impl RTreeObject for AgentLocation {
    type Envelope = AABB<[f64; MAX_DIMENSIONS]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// R*-tree over the snapshot, bulk-loaded once per step (O(n log n)).
///
/// Under periodic topology a query near an edge is repeated with the query
/// window translated by ±extent on each affected axis; every candidate is
/// then filtered with the space's own distance so membership matches
/// [`LinearScanIndex`] exactly.
pub struct RTreeIndex<'a> {
    tree: RTree<AgentLocation>,
    agents: &'a [Agent],
    space: &'a Space,
}

impl<'a> RTreeIndex<'a> {
    pub fn new(agents: &'a [Agent], space: &'a Space) -> Self {
        let locations: Vec<AgentLocation> = agents
            .iter()
            .enumerate()
            .map(|(index, a)| AgentLocation {
                index,
                position: a.position.to_point(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(locations),
            agents,
            space,
        }
    }

    fn for_each_candidate(&self, center: [f64; MAX_DIMENSIONS], radius: f64, mut visitor: impl FnMut(usize)) {
        // Slack keeps boundary-distance points inside the window despite
        // rounding in the translated center; the exact filter runs afterwards.
        let reach = radius + radius.abs() * 1e-9 + 1e-9;
        let dims = self.space.dimensions();

        let mut offsets = [[0.0f64; 3]; MAX_DIMENSIONS];
        let mut lens = [1usize; MAX_DIMENSIONS];
        if self.space.is_periodic() {
            for axis in 0..dims {
                let (axis_offsets, len) = wrap_offsets(center[axis], reach, self.space.extent());
                offsets[axis] = axis_offsets;
                lens[axis] = len;
            }
        }

        for &xoff in &offsets[0][..lens[0]] {
            for &yoff in &offsets[1][..lens[1]] {
                for &zoff in &offsets[2][..lens[2]] {
                    let translated = [center[0] + xoff, center[1] + yoff, center[2] + zoff];
                    let envelope = AABB::from_corners(
                        [translated[0] - reach, translated[1] - reach, translated[2] - reach],
                        [translated[0] + reach, translated[1] + reach, translated[2] + reach],
                    );
                    for loc in self.tree.locate_in_envelope(&envelope) {
                        visitor(loc.index);
                    }
                }
            }
        }
    }
}

impl SpatialIndex for RTreeIndex<'_> {
    fn neighbors_within(&self, agent_idx: usize, radius: f64) -> Vec<usize> {
        let center = &self.agents[agent_idx].position;
        let r_sq = radius * radius;
        let mut result = Vec::new();
        self.for_each_candidate(center.to_point(), radius, |idx| {
            if idx != agent_idx
                && self
                    .space
                    .distance_squared(center, &self.agents[idx].position)
                    <= r_sq
            {
                result.push(idx);
            }
        });
        // Translated windows overlap when the radius spans half the world.
        result.sort_unstable();
        result.dedup();
        result
    }
}

/// Owned choice of index for one step, so callers can hold either behind
/// `&dyn SpatialIndex`.
pub enum StepIndex<'a> {
    Linear(LinearScanIndex<'a>),
    RTree(RTreeIndex<'a>),
}

impl<'a> StepIndex<'a> {
    pub fn build(kind: IndexKind, agents: &'a [Agent], space: &'a Space) -> Self {
        match kind {
            IndexKind::Linear => StepIndex::Linear(LinearScanIndex::new(agents, space)),
            IndexKind::Rtree => StepIndex::RTree(RTreeIndex::new(agents, space)),
        }
    }

    pub fn as_dyn(&self) -> &dyn SpatialIndex {
        match self {
            StepIndex::Linear(index) => index,
            StepIndex::RTree(index) => index,
        }
    }
}

fn wrap_offsets(coord: f64, radius: f64, world_size: f64) -> ([f64; 3], usize) {
    let mut offsets = [0.0; 3];
    let mut len = 1usize;
    if coord < radius {
        offsets[len] = world_size;
        len += 1;
    }
    if coord + radius >= world_size {
        offsets[len] = -world_size;
        len += 1;
    }
    (offsets, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryMode;
    use crate::vector::Vector;
    use proptest::prelude::*;

    fn make_agent(id: u32, x: f64, y: f64) -> Agent {
        Agent::new(id, Vector::xy(x, y), Vector::xy(1.0, 0.0))
    }

    fn periodic(extent: f64) -> Space {
        Space::new(2, extent, BoundaryMode::Periodic)
    }

    fn reflective(extent: f64) -> Space {
        Space::new(2, extent, BoundaryMode::Reflective)
    }

    #[test]
    fn query_finds_agents_within_radius() {
        let agents = vec![
            make_agent(0, 5.0, 5.0),
            make_agent(1, 6.0, 5.0),   // distance 1.0
            make_agent(2, 50.0, 50.0), // far away
        ];
        let space = reflective(100.0);
        let index = RTreeIndex::new(&agents, &space);
        assert_eq!(index.neighbors_within(0, 2.0), vec![1]);
        assert_eq!(index.neighbors_within(2, 2.0), Vec::<usize>::new());
    }

    #[test]
    fn query_is_inclusive_at_radius() {
        let agents = vec![make_agent(0, 0.0, 0.0), make_agent(1, 3.0, 4.0)];
        let space = reflective(100.0);
        assert_eq!(LinearScanIndex::new(&agents, &space).neighbors_within(0, 5.0), vec![1]);
        assert_eq!(RTreeIndex::new(&agents, &space).neighbors_within(0, 5.0), vec![1]);
    }

    #[test]
    fn query_excludes_self_even_when_coincident() {
        let agents = vec![make_agent(0, 5.0, 5.0), make_agent(1, 5.0, 5.0)];
        let space = reflective(10.0);
        let index = LinearScanIndex::new(&agents, &space);
        assert_eq!(index.neighbors_within(0, 1.0), vec![1]);
        assert_eq!(index.neighbors_within(1, 1.0), vec![0]);
    }

    #[test]
    fn count_within_wraps_toroidally_across_world_edges() {
        // Assuming a world size of 100, x=99.8 and x=0.5 are only 0.7 apart.
        let agents = vec![make_agent(0, 0.5, 50.0), make_agent(1, 99.8, 50.0)];
        let space = periodic(100.0);
        assert_eq!(RTreeIndex::new(&agents, &space).count_within(0, 1.0), 1);
        assert_eq!(LinearScanIndex::new(&agents, &space).count_within(0, 1.0), 1);
    }

    #[test]
    fn reflective_space_does_not_wrap() {
        let agents = vec![make_agent(0, 0.5, 50.0), make_agent(1, 99.8, 50.0)];
        let space = reflective(100.0);
        assert_eq!(RTreeIndex::new(&agents, &space).count_within(0, 1.0), 0);
    }

    #[test]
    fn query_wraps_toroidally_at_corner() {
        let agents = vec![make_agent(0, 0.2, 0.2), make_agent(1, 99.8, 99.8)];
        let space = periodic(100.0);
        assert_eq!(RTreeIndex::new(&agents, &space).neighbors_within(0, 1.0), vec![1]);
    }

    #[test]
    fn query_returns_sorted_unique_indices_for_huge_radius() {
        let agents = vec![
            make_agent(10, 0.2, 5.0),
            make_agent(2, 9.9, 5.0),
            make_agent(7, 4.0, 5.0),
            make_agent(3, 6.0, 1.0),
        ];
        let space = periodic(10.0);
        let index = RTreeIndex::new(&agents, &space);
        assert_eq!(index.neighbors_within(0, 8.0), vec![1, 2, 3]);
    }

    #[test]
    fn three_dimensional_periodic_query_wraps_on_z() {
        let agents = vec![
            Agent::new(0, Vector::xyz(5.0, 5.0, 0.1), Vector::xyz(1.0, 0.0, 0.0)),
            Agent::new(1, Vector::xyz(5.0, 5.0, 9.9), Vector::xyz(1.0, 0.0, 0.0)),
        ];
        let space = Space::new(3, 10.0, BoundaryMode::Periodic);
        assert_eq!(RTreeIndex::new(&agents, &space).neighbors_within(0, 0.5), vec![1]);
    }

    #[test]
    fn step_index_dispatches_to_selected_kind() {
        let agents = vec![make_agent(0, 1.0, 1.0), make_agent(1, 1.5, 1.0)];
        let space = reflective(10.0);
        for kind in [IndexKind::Linear, IndexKind::Rtree] {
            let index = StepIndex::build(kind, &agents, &space);
            assert_eq!(index.as_dyn().neighbors_within(0, 1.0), vec![1]);
        }
    }

    fn arb_positions(extent: f64) -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((0.0..extent, 0.0..extent), 1..60)
    }

    proptest! {
        #[test]
        fn rtree_matches_linear_scan_periodic(
            positions in arb_positions(20.0),
            radius in 0.1f64..12.0,
        ) {
            let agents: Vec<Agent> = positions
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| make_agent(i as u32, x, y))
                .collect();
            let space = periodic(20.0);
            let linear = LinearScanIndex::new(&agents, &space);
            let tree = RTreeIndex::new(&agents, &space);
            for idx in 0..agents.len() {
                prop_assert_eq!(linear.neighbors_within(idx, radius), tree.neighbors_within(idx, radius));
            }
        }

        #[test]
        fn rtree_matches_linear_scan_reflective(
            positions in prop::collection::vec((-5.0f64..25.0, -5.0f64..25.0), 1..60),
            radius in 0.1f64..12.0,
        ) {
            let agents: Vec<Agent> = positions
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| make_agent(i as u32, x, y))
                .collect();
            let space = reflective(20.0);
            let linear = LinearScanIndex::new(&agents, &space);
            let tree = RTreeIndex::new(&agents, &space);
            for idx in 0..agents.len() {
                prop_assert_eq!(linear.neighbors_within(idx, radius), tree.neighbors_within(idx, radius));
            }
        }
    }
}
