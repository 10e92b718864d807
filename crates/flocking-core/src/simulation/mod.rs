//! The flock simulation and its lifecycle.
//!
//! A [`Simulation`] starts uninitialized, is set up once from a validated
//! [`SimConfig`], then advances one synchronous step at a time until its
//! step budget is spent. Every step runs in two phases: all agents compute a
//! [`PendingUpdate`] from the committed snapshot (optionally in parallel),
//! then every update is committed and agents move.

use crate::agent::{Agent, PendingUpdate};
use crate::behavior::{self, Behavior};
use crate::config::{ConfigError, ModelKind, SimConfig};
use crate::constants::MAX_SNAPSHOT_FRAMES;
use crate::metrics::{self, Observer, RunSummary, SnapshotFrame, StepMetrics};
use crate::rng::create_rng;
use crate::space::Space;
use crate::spatial::StepIndex;
use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    /// Set up, no step taken yet.
    Ready,
    Running,
    /// Step budget spent.
    Finished,
    /// A step produced a non-finite value. Agents keep the last finite step.
    Faulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("simulation has not been set up")]
    NotSetUp,
    #[error("simulation is already set up; create a new one to change parameters")]
    AlreadySetUp,
    #[error("step budget of {steps} steps is exhausted")]
    StepBudgetExhausted { steps: usize },
    #[error("simulation aborted after a numeric fault")]
    Faulted,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("invalid state: {0}")]
    InvalidState(#[from] StateError),
    #[error("agent {agent_id} reached a non-finite state at step {step}")]
    NumericFault { agent_id: u32, step: usize },
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
    #[error("snapshot count ({actual}) exceeds supported maximum ({max})")]
    TooManySnapshots { max: usize, actual: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepTimings {
    pub index_build_us: u64,
    pub update_us: u64,
    pub commit_us: u64,
    pub total_us: u64,
}

/// Everything that exists once the simulation is set up.
pub(crate) struct Flock {
    config: SimConfig,
    space: Space,
    behavior: Box<dyn Behavior>,
    agents: Vec<Agent>,
    // Reused between steps to avoid reallocating.
    pending: Vec<PendingUpdate>,
    // Next-step agents; swapped with `agents` once the whole step is finite.
    staged: Vec<Agent>,
}

pub struct Simulation {
    state: SimulationState,
    flock: Option<Flock>,
    step_index: usize,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            state: SimulationState::Uninitialized,
            flock: None,
            step_index: 0,
        }
    }

    /// Construct and set up in one go.
    pub fn from_config(config: SimConfig) -> Result<Self, SimulationError> {
        let mut sim = Self::new();
        sim.setup(config)?;
        Ok(sim)
    }

    /// Validate `config`, build the space and draw the initial population
    /// from the seeded generator in id order.
    ///
    /// Setup happens at most once; a second call is rejected with
    /// [`StateError::AlreadySetUp`] and leaves the simulation untouched.
    pub fn setup(&mut self, config: SimConfig) -> Result<(), SimulationError> {
        self.ensure_uninitialized()?;
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let agents: Vec<Agent> = (0..config.population)
            .map(|id| Agent::random(id as u32, config.dimensions, config.world_size, &mut rng))
            .collect();
        self.install(config, agents);
        Ok(())
    }

    /// Set up with caller-supplied agents instead of a random draw.
    pub fn setup_with_agents(
        &mut self,
        config: SimConfig,
        agents: Vec<Agent>,
    ) -> Result<(), SimulationError> {
        self.ensure_uninitialized()?;
        config.validate()?;
        validate_agents(&config, &agents)?;
        self.install(config, agents);
        Ok(())
    }

    fn ensure_uninitialized(&self) -> Result<(), StateError> {
        match self.state {
            SimulationState::Uninitialized => Ok(()),
            _ => Err(StateError::AlreadySetUp),
        }
    }

    fn install(&mut self, config: SimConfig, agents: Vec<Agent>) {
        let space = Space::from_config(&config);
        let behavior = behavior::from_params(&config.model);
        info!(
            model = %behavior.kind(),
            population = agents.len(),
            dimensions = config.dimensions,
            boundary = ?space.boundary_mode(),
            index = ?config.spatial_index,
            steps = config.steps,
            seed = config.seed,
            "simulation set up"
        );
        self.flock = Some(Flock {
            pending: Vec::with_capacity(agents.len()),
            staged: Vec::with_capacity(agents.len()),
            config,
            space,
            behavior,
            agents,
        });
        self.step_index = 0;
        self.state = SimulationState::Ready;
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Number of committed steps.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn config(&self) -> Option<&SimConfig> {
        self.flock.as_ref().map(|f| &f.config)
    }

    pub fn space(&self) -> Option<&Space> {
        self.flock.as_ref().map(|f| &f.space)
    }

    /// Committed agents; empty before setup.
    pub fn agents(&self) -> &[Agent] {
        self.flock.as_ref().map_or(&[], |f| f.agents.as_slice())
    }

    /// Read-only copy of the committed state.
    pub fn snapshot(&self) -> SnapshotFrame {
        SnapshotFrame::capture(self.step_index, self.agents())
    }

    /// Remaining step budget.
    pub fn steps_remaining(&self) -> usize {
        self.config()
            .map_or(0, |c| c.steps.saturating_sub(self.step_index))
    }

    fn check_steppable(&self) -> Result<(), StateError> {
        match self.state {
            SimulationState::Ready | SimulationState::Running => Ok(()),
            SimulationState::Uninitialized => Err(StateError::NotSetUp),
            SimulationState::Finished => Err(StateError::StepBudgetExhausted {
                steps: self.step_index,
            }),
            SimulationState::Faulted => Err(StateError::Faulted),
        }
    }

    /// Advance every agent by one synchronous step.
    pub fn step(&mut self) -> Result<StepTimings, SimulationError> {
        self.check_steppable()?;
        let Some(flock) = self.flock.as_mut() else {
            return Err(StateError::NotSetUp.into());
        };
        self.state = SimulationState::Running;
        let step = self.step_index + 1;
        let total_start = Instant::now();

        let mut pending = std::mem::take(&mut flock.pending);
        let (index_build_us, update_us) = {
            let t0 = Instant::now();
            let index = StepIndex::build(flock.config.spatial_index, &flock.agents, &flock.space);
            let index_build_us = t0.elapsed().as_micros() as u64;

            let t1 = Instant::now();
            flock.step_update_phase(index.as_dyn(), step, &mut pending);
            (index_build_us, t1.elapsed().as_micros() as u64)
        };

        let t2 = Instant::now();
        let committed = flock.step_commit_phase(&pending, step);
        let commit_us = t2.elapsed().as_micros() as u64;
        flock.pending = pending;

        if let Err(err) = committed {
            error!(%err, step, "numeric fault; aborting run");
            self.state = SimulationState::Faulted;
            return Err(err);
        }

        self.step_index = step;
        if self.step_index >= flock.config.steps {
            self.state = SimulationState::Finished;
        }

        let timings = StepTimings {
            index_build_us,
            update_us,
            commit_us,
            total_us: total_start.elapsed().as_micros() as u64,
        };
        debug!(
            step,
            index_build_us = timings.index_build_us,
            update_us = timings.update_us,
            commit_us = timings.commit_us,
            total_us = timings.total_us,
            "step committed"
        );
        Ok(timings)
    }

    /// Flock metrics on the committed state.
    pub fn metrics(&self) -> Option<StepMetrics> {
        let flock = self.flock.as_ref()?;
        let index = StepIndex::build(flock.config.spatial_index, &flock.agents, &flock.space);
        Some(metrics::collect_step_metrics(
            self.step_index,
            &flock.agents,
            &flock.space,
            index.as_dyn(),
            flock.behavior.primary_radius(),
        ))
    }

    /// Run the remaining step budget, sampling metrics every `sample_every`
    /// steps and at the final step.
    pub fn run(&mut self, sample_every: usize) -> Result<RunSummary, SimulationError> {
        self.drive(sample_every, &[], None)
    }

    /// Like [`Simulation::run`], also keeping full snapshots at the given
    /// step numbers. Steps outside the remaining budget are ignored.
    pub fn run_with_snapshots(
        &mut self,
        sample_every: usize,
        snapshot_steps: &[usize],
    ) -> Result<RunSummary, SimulationError> {
        if snapshot_steps.len() > MAX_SNAPSHOT_FRAMES {
            return Err(SimulationError::TooManySnapshots {
                max: MAX_SNAPSHOT_FRAMES,
                actual: snapshot_steps.len(),
            });
        }
        self.drive(sample_every, snapshot_steps, None)
    }

    /// Like [`Simulation::run`], handing a frame to `observer` after every
    /// committed step.
    pub fn run_observed(
        &mut self,
        sample_every: usize,
        observer: &mut dyn Observer,
    ) -> Result<RunSummary, SimulationError> {
        self.drive(sample_every, &[], Some(observer))
    }

    fn drive(
        &mut self,
        sample_every: usize,
        snapshot_steps: &[usize],
        mut observer: Option<&mut dyn Observer>,
    ) -> Result<RunSummary, SimulationError> {
        if sample_every == 0 {
            return Err(SimulationError::InvalidSampleEvery);
        }
        self.check_steppable()?;

        let budget = self.config().map_or(0, |c| c.steps);
        let wanted: HashSet<usize> = snapshot_steps.iter().copied().collect();
        let mut samples = Vec::with_capacity(self.steps_remaining() / sample_every + 1);
        let mut snapshots = Vec::new();

        while self.state != SimulationState::Finished {
            self.step()?;
            let step = self.step_index;
            if step % sample_every == 0 || step == budget {
                if let Some(m) = self.metrics() {
                    samples.push(m);
                }
            }
            if wanted.contains(&step) {
                snapshots.push(self.snapshot());
            }
            if let Some(observer) = observer.as_deref_mut() {
                observer.observe(&self.snapshot());
            }
        }

        let final_polarization = metrics::polarization(self.agents());
        let out_of_bounds = samples.last().map_or(0, |m| m.out_of_bounds);
        info!(
            steps = self.step_index,
            samples = samples.len(),
            final_polarization,
            "run finished"
        );
        if out_of_bounds > 0 && self.model_kind() == Some(ModelKind::Boids) {
            warn!(
                out_of_bounds,
                "agents ended outside the world extent; the border push is soft"
            );
        }

        Ok(RunSummary {
            schema_version: 1,
            steps: self.step_index,
            sample_every,
            samples,
            snapshots,
            final_polarization,
        })
    }

    fn model_kind(&self) -> Option<ModelKind> {
        self.flock.as_ref().map(|f| f.behavior.kind())
    }
}

fn validate_agents(config: &SimConfig, agents: &[Agent]) -> Result<(), ConfigError> {
    if agents.len() != config.population {
        return Err(ConfigError::AgentCountMismatch {
            expected: config.population,
            actual: agents.len(),
        });
    }
    let space = Space::from_config(config);
    let periodic = space.is_periodic();
    let mut seen = HashSet::with_capacity(agents.len());
    for agent in agents {
        if agent.position.dims() != config.dimensions || agent.velocity.dims() != config.dimensions
        {
            return Err(ConfigError::AgentDimensionMismatch { id: agent.id });
        }
        if !seen.insert(agent.id) {
            return Err(ConfigError::DuplicateAgentId { id: agent.id });
        }
        if !agent.is_finite() {
            return Err(ConfigError::NonFiniteAgentState { id: agent.id });
        }
        // Wrapped queries only look one extent past each edge.
        if periodic && !space.contains(&agent.position) {
            return Err(ConfigError::AgentOutsideTorus { id: agent.id });
        }
    }
    Ok(())
}

mod phases;
