pub mod agent;
pub mod behavior;
pub mod config;
pub mod constants;
pub mod metrics;
pub mod rng;
pub mod simulation;
pub mod space;
pub mod spatial;
pub mod vector;

pub use agent::{Agent, PendingUpdate};
pub use config::{
    BoidsParams, BoundaryMode, ConfigError, IndexKind, ModelKind, ModelParams, SimConfig,
    VicsekParams,
};
pub use metrics::{AgentSnapshot, Observer, RunSummary, SnapshotFrame, StepMetrics};
pub use simulation::{Simulation, SimulationError, SimulationState, StateError, StepTimings};
pub use space::Space;
pub use vector::Vector;
