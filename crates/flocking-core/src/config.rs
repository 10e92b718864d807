use serde::{Deserialize, Serialize};

/// How the edges of the world behave.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Open box: Euclidean distances, positions are never wrapped or clamped.
    /// Containment relies on the (soft) Boids border force.
    Reflective,
    /// Torus: minimum-image distances, positions wrapped into `[0, extent)`.
    Periodic,
}

/// Neighbor index implementation used for radius queries.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Brute-force scan over every agent per query.
    Linear,
    /// R*-tree bulk-loaded from committed positions each step.
    #[default]
    Rtree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    Boids,
    Vicsek,
}

impl ModelKind {
    /// Topology the model was designed for.
    pub fn native_boundary(self) -> BoundaryMode {
        match self {
            ModelKind::Boids => BoundaryMode::Reflective,
            ModelKind::Vicsek => BoundaryMode::Periodic,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Boids => write!(f, "boids"),
            ModelKind::Vicsek => write!(f, "vicsek"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoidsParams {
    /// Radius inside which neighbors push the agent away (separation).
    pub inner_radius: f64,
    /// Radius inside which neighbors attract and align the agent.
    pub outer_radius: f64,
    /// Distance from an edge at which the border push kicks in.
    pub border_distance: f64,
    /// Weight of the pull toward the neighbor centroid.
    pub cohesion_strength: f64,
    /// Weight of the push away from close neighbors.
    pub separation_strength: f64,
    /// Weight of the pull toward the mean neighbor velocity.
    pub alignment_strength: f64,
    /// Constant per-axis push applied near an edge.
    pub border_strength: f64,
}

impl Default for BoidsParams {
    fn default() -> Self {
        Self {
            inner_radius: 3.0,
            outer_radius: 10.0,
            border_distance: 10.0,
            cohesion_strength: 0.005,
            separation_strength: 0.1,
            alignment_strength: 0.3,
            border_strength: 0.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VicsekParams {
    /// Radius of the alignment neighborhood.
    pub interaction_radius: f64,
    /// Width of the uniform heading noise, in radians.
    pub noise_strength: f64,
}

impl Default for VicsekParams {
    fn default() -> Self {
        Self {
            interaction_radius: 1.0,
            noise_strength: 0.3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParams {
    Boids(BoidsParams),
    Vicsek(VicsekParams),
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams::Boids(BoidsParams::default())
    }
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Boids(_) => ModelKind::Boids,
            ModelParams::Vicsek(_) => ModelKind::Vicsek,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    /// Extent of the world along every axis, in world units.
    pub world_size: f64,
    /// Number of spatial axes (2 or 3).
    pub dimensions: usize,
    /// Number of agents.
    pub population: usize,
    /// Step budget for the run.
    pub steps: usize,
    /// Edge behavior. `None` selects the model's native topology.
    pub boundary_mode: Option<BoundaryMode>,
    /// Neighbor index implementation.
    pub spatial_index: IndexKind,
    /// Fan the per-agent update computation out over the rayon pool.
    pub parallel: bool,
    /// Steering model and its coefficients.
    pub model: ModelParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 123,
            world_size: 50.0,
            dimensions: 3,
            population: 200,
            steps: 200,
            boundary_mode: None,
            spatial_index: IndexKind::Rtree,
            parallel: true,
            model: ModelParams::Boids(BoidsParams::default()),
        }
    }
}

impl SimConfig {
    pub const MAX_WORLD_SIZE: f64 = crate::constants::MAX_WORLD_SIZE;

    pub const MAX_POPULATION: usize = crate::constants::MAX_POPULATION;

    pub const MAX_STEPS: usize = crate::constants::MAX_STEPS;

    /// Default Boids configuration (3D flock of 200).
    pub fn boids() -> Self {
        Self::default()
    }

    /// Default Vicsek configuration (2D torus of 400).
    pub fn vicsek() -> Self {
        Self {
            dimensions: 2,
            population: 400,
            model: ModelParams::Vicsek(VicsekParams::default()),
            ..Self::default()
        }
    }

    /// Effective edge behavior after applying the model default.
    pub fn boundary(&self) -> BoundaryMode {
        self.boundary_mode
            .unwrap_or_else(|| self.model.kind().native_boundary())
    }
}

macro_rules! define_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for ConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_config_error! {
    InvalidWorldSize => "world_size must be positive and finite";
    WorldSizeTooLarge { max: f64, actual: f64 } => "world_size ({actual}) exceeds supported maximum ({max})";
    InvalidDimensions { actual: usize } => "dimensions must be 2 or 3, got {actual}";
    InvalidPopulation => "population must be greater than 0";
    TooManyAgents { max: usize, actual: usize } => "Too many agents: {} > max {}", actual, max;
    InvalidSteps => "steps must be greater than 0";
    TooManySteps { max: usize, actual: usize } => "steps ({actual}) exceed supported maximum ({max})";
    InvalidInnerRadius => "inner_radius must be positive and finite";
    InvalidOuterRadius => "outer_radius must be positive and finite";
    InvalidRadiusOrder => "inner_radius must not exceed outer_radius";
    InvalidBorderDistance => "border_distance must be finite and non-negative";
    InvalidCohesionStrength => "cohesion_strength must be finite and non-negative";
    InvalidSeparationStrength => "separation_strength must be finite and non-negative";
    InvalidAlignmentStrength => "alignment_strength must be finite and non-negative";
    InvalidBorderStrength => "border_strength must be finite and non-negative";
    InvalidInteractionRadius => "interaction_radius must be positive and finite";
    InvalidNoiseStrength => "noise_strength must be finite and non-negative";
    AgentCountMismatch { expected: usize, actual: usize } => "agents.len() ({actual}) must match population ({expected})";
    AgentDimensionMismatch { id: u32 } => "agent {id} does not match the configured dimensions";
    DuplicateAgentId { id: u32 } => "agent id {id} is used more than once";
    NonFiniteAgentState { id: u32 } => "agent {id} has a non-finite position, velocity or heading";
    AgentOutsideTorus { id: u32 } => "agent {id} lies outside [0, world_size) on a periodic world";
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_world()?;
        self.validate_population()?;
        match &self.model {
            ModelParams::Boids(params) => params.validate(),
            ModelParams::Vicsek(params) => params.validate(),
        }
    }

    fn validate_world(&self) -> Result<(), ConfigError> {
        if !(self.world_size.is_finite() && self.world_size > 0.0) {
            return Err(ConfigError::InvalidWorldSize);
        }
        if self.world_size > Self::MAX_WORLD_SIZE {
            return Err(ConfigError::WorldSizeTooLarge {
                max: Self::MAX_WORLD_SIZE,
                actual: self.world_size,
            });
        }
        if !(crate::vector::MIN_DIMENSIONS..=crate::vector::MAX_DIMENSIONS)
            .contains(&self.dimensions)
        {
            return Err(ConfigError::InvalidDimensions {
                actual: self.dimensions,
            });
        }
        Ok(())
    }

    fn validate_population(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::InvalidPopulation);
        }
        if self.population > Self::MAX_POPULATION {
            return Err(ConfigError::TooManyAgents {
                max: Self::MAX_POPULATION,
                actual: self.population,
            });
        }
        if self.steps == 0 {
            return Err(ConfigError::InvalidSteps);
        }
        if self.steps > Self::MAX_STEPS {
            return Err(ConfigError::TooManySteps {
                max: Self::MAX_STEPS,
                actual: self.steps,
            });
        }
        Ok(())
    }
}

impl BoidsParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.inner_radius.is_finite() && self.inner_radius > 0.0) {
            return Err(ConfigError::InvalidInnerRadius);
        }
        if !(self.outer_radius.is_finite() && self.outer_radius > 0.0) {
            return Err(ConfigError::InvalidOuterRadius);
        }
        if self.inner_radius > self.outer_radius {
            return Err(ConfigError::InvalidRadiusOrder);
        }
        if !(self.border_distance.is_finite() && self.border_distance >= 0.0) {
            return Err(ConfigError::InvalidBorderDistance);
        }
        if !(self.cohesion_strength.is_finite() && self.cohesion_strength >= 0.0) {
            return Err(ConfigError::InvalidCohesionStrength);
        }
        if !(self.separation_strength.is_finite() && self.separation_strength >= 0.0) {
            return Err(ConfigError::InvalidSeparationStrength);
        }
        if !(self.alignment_strength.is_finite() && self.alignment_strength >= 0.0) {
            return Err(ConfigError::InvalidAlignmentStrength);
        }
        if !(self.border_strength.is_finite() && self.border_strength >= 0.0) {
            return Err(ConfigError::InvalidBorderStrength);
        }
        Ok(())
    }
}

impl VicsekParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.interaction_radius.is_finite() && self.interaction_radius > 0.0) {
            return Err(ConfigError::InvalidInteractionRadius);
        }
        if !(self.noise_strength.is_finite() && self.noise_strength >= 0.0) {
            return Err(ConfigError::InvalidNoiseStrength);
        }
        Ok(())
    }
}
