use crate::vector::{wrap_angle, Vector};
use rand::Rng;

/// One simulated particle.
///
/// `velocity` and `heading` describe the same motion: Boids steer the
/// velocity and derive the heading from it, Vicsek steer the heading and
/// derive a unit velocity from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub id: u32,
    pub position: Vector,
    pub velocity: Vector,
    /// Planar heading in `[0, 2π)`.
    pub heading: f64,
}

/// Next-step state computed from the previous-step snapshot. Held aside until
/// every agent has computed its own, then committed in one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PendingUpdate {
    Velocity(Vector),
    Heading(f64),
}

impl Agent {
    /// Agent moving with `velocity`; the heading is derived from it.
    pub fn new(id: u32, position: Vector, velocity: Vector) -> Self {
        let heading = if velocity.is_zero() {
            0.0
        } else {
            wrap_angle(velocity.heading())
        };
        Self {
            id,
            position,
            velocity,
            heading,
        }
    }

    /// Unit-speed agent facing planar angle `theta`.
    pub fn with_heading(id: u32, position: Vector, theta: f64) -> Self {
        let heading = wrap_angle(theta);
        Self {
            id,
            position,
            velocity: Vector::from_heading(heading, position.dims()),
            heading,
        }
    }

    /// Draw a uniformly placed agent with a random unit direction.
    ///
    /// Positions are uniform in `[0, extent)` per axis; the direction is the
    /// normalized offset of a uniform point in the unit cube from its center.
    pub fn random(id: u32, dims: usize, extent: f64, rng: &mut impl Rng) -> Self {
        let position = Vector::from_fn(dims, |_| rng.random::<f64>() * extent);
        let velocity = Vector::from_fn(dims, |_| rng.random::<f64>() - 0.5).normalize();
        Self::new(id, position, velocity)
    }

    /// Apply a pending update, keeping velocity and heading consistent.
    pub fn commit(&mut self, update: PendingUpdate) {
        match update {
            PendingUpdate::Velocity(velocity) => {
                self.velocity = velocity;
                // A stationary agent keeps facing where it last moved.
                if !velocity.is_zero() {
                    self.heading = wrap_angle(velocity.heading());
                }
            }
            PendingUpdate::Heading(theta) => {
                self.heading = wrap_angle(theta);
                self.velocity = Vector::from_heading(self.heading, self.position.dims());
            }
        }
    }

    /// Advance one tick along the current velocity.
    pub fn advance(&mut self) {
        self.position += self.velocity;
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.heading.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use std::f64::consts::PI;

    #[test]
    fn new_derives_heading_from_velocity() {
        let agent = Agent::new(0, Vector::xy(1.0, 1.0), Vector::xy(0.0, -1.0));
        assert!((agent.heading - 1.5 * PI).abs() < 1e-12);

        let still = Agent::new(1, Vector::xy(1.0, 1.0), Vector::zeros(2));
        assert_eq!(still.heading, 0.0);
    }

    #[test]
    fn commit_heading_sets_unit_velocity() {
        let mut agent = Agent::with_heading(0, Vector::xyz(1.0, 2.0, 3.0), 0.0);
        agent.commit(PendingUpdate::Heading(PI / 2.0));
        assert!((agent.velocity[0]).abs() < 1e-12);
        assert!((agent.velocity[1] - 1.0).abs() < 1e-12);
        assert_eq!(agent.velocity[2], 0.0);
    }

    #[test]
    fn commit_zero_velocity_keeps_heading() {
        let mut agent = Agent::with_heading(0, Vector::xy(0.0, 0.0), PI);
        agent.commit(PendingUpdate::Velocity(Vector::zeros(2)));
        assert!(agent.velocity.is_zero());
        assert!((agent.heading - PI).abs() < 1e-12);
    }

    #[test]
    fn random_agents_are_in_bounds_with_unit_velocity() {
        let mut rng = create_rng(42);
        for id in 0..100 {
            let agent = Agent::random(id, 3, 50.0, &mut rng);
            assert!(agent.position.iter().all(|c| (0.0..50.0).contains(&c)));
            assert!((agent.velocity.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn advance_moves_by_velocity() {
        let mut agent = Agent::new(0, Vector::xy(4.0, 5.0), Vector::xy(1.0, 0.0));
        agent.advance();
        assert_eq!(agent.position, Vector::xy(5.0, 5.0));
    }
}
