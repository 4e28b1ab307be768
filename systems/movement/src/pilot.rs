//! Thrust-driven flight for the block carrier.

use glam::Vec2;
use rand::{seq::SliceRandom, Rng};

/// Directions the pilot is thrusting towards this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Thrust {
    /// Thrust towards the top of the screen.
    pub up: bool,
    /// Thrust towards the bottom of the screen.
    pub down: bool,
    /// Thrust towards the left edge.
    pub left: bool,
    /// Thrust towards the right edge.
    pub right: bool,
}

impl Thrust {
    /// No thrust at all.
    pub const NONE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// Choices the autopilot picks from: idle or a single direction.
    pub const AUTOPILOT_CHOICES: [Self; 5] = [
        Self::NONE,
        Self { up: true, ..Self::NONE },
        Self { down: true, ..Self::NONE },
        Self { left: true, ..Self::NONE },
        Self { right: true, ..Self::NONE },
    ];

    fn vector(self) -> Vec2 {
        let axis = |negative: bool, positive: bool| {
            f32::from(u8::from(positive)) - f32::from(u8::from(negative))
        };
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Flight constants of the pilot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PilotTuning {
    /// Velocity gained per tick of thrust on each axis.
    pub acceleration: f32,
    /// Downward velocity gained every tick.
    pub gravity: f32,
    /// Quadratic drag coefficient.
    pub drag: f32,
    /// Sprite size; the pilot is clamped so the sprite stays on screen.
    pub size: Vec2,
    /// Height above a dropped block the ceiling is raised to.
    pub ceiling_clearance: f32,
}

impl Default for PilotTuning {
    fn default() -> Self {
        Self {
            acceleration: 0.8,
            gravity: 0.06,
            drag: 0.02,
            size: Vec2::new(16.0, 16.0),
            ceiling_clearance: 80.0,
        }
    }
}

/// Block carrier flying over the city.
#[derive(Clone, Debug, PartialEq)]
pub struct Pilot {
    position: Vec2,
    velocity: Vec2,
    viewport: Vec2,
    maximum_altitude: f32,
    tuning: PilotTuning,
}

impl Pilot {
    /// Creates a pilot at rest with its sprite's upper-left corner at `position`.
    #[must_use]
    pub fn new(position: Vec2, viewport: Vec2, tuning: PilotTuning) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            viewport,
            maximum_altitude: 0.0,
            tuning,
        }
    }

    /// Upper-left corner of the pilot sprite.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity in screen units per tick.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Centre of the pilot sprite; pick-up and drop probes are offset from it.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.tuning.size / 2.0
    }

    /// How far above the top of the screen the pilot may climb.
    #[must_use]
    pub const fn maximum_altitude(&self) -> f32 {
        self.maximum_altitude
    }

    /// Applies one tick of thrust, gravity and drag, then clamps to the flight area.
    pub fn step(&mut self, thrust: Thrust) {
        let tuning = self.tuning;
        self.velocity += thrust.vector() * tuning.acceleration;
        self.velocity.y += tuning.gravity;
        self.position += self.velocity;
        self.velocity /= 1.0 + tuning.drag * self.velocity.length_squared();

        let floor = self.viewport.y - tuning.size.y;
        if self.position.y > floor {
            self.position.y = floor;
            self.velocity.y = 0.0;
        }
        if self.position.y < -self.maximum_altitude {
            self.position.y = -self.maximum_altitude;
            self.velocity.y = 0.0;
        }
        let right_edge = self.viewport.x - tuning.size.x;
        if self.position.x > right_edge {
            self.position.x = right_edge;
            self.velocity.x = 0.0;
        }
        if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = 0.0;
        }
    }

    /// Lets the pilot climb above a block just dropped with its sprite top at `block_y`.
    pub fn raise_ceiling(&mut self, block_y: f32) {
        self.maximum_altitude = self
            .maximum_altitude
            .max(self.tuning.ceiling_clearance - block_y);
    }
}

/// Random thrust source that changes its mind at a fixed interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Autopilot {
    interval: u32,
    elapsed: u32,
    thrust: Thrust,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(30)
    }
}

impl Autopilot {
    /// Creates an autopilot choosing a new thrust every `interval` ticks.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self {
            interval,
            elapsed: 0,
            thrust: Thrust::NONE,
        }
    }

    /// Thrust for the next tick.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Thrust {
        if self.elapsed % self.interval.max(1) == 0 {
            self.thrust = Thrust::AUTOPILOT_CHOICES
                .choose(rng)
                .copied()
                .unwrap_or(Thrust::NONE);
        }
        self.elapsed = self.elapsed.wrapping_add(1);
        self.thrust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pilot_at(position: Vec2) -> Pilot {
        Pilot::new(position, Vec2::new(240.0, 320.0), PilotTuning::default())
    }

    #[test]
    fn gravity_pulls_an_idle_pilot_down() {
        let mut pilot = pilot_at(Vec2::new(100.0, 100.0));
        pilot.step(Thrust::NONE);
        assert!(pilot.position().y > 100.0);
        assert_eq!(pilot.position().x, 100.0);
    }

    #[test]
    fn drag_bounds_the_speed() {
        let open_sky = Vec2::splat(1.0e6);
        let mut pilot = Pilot::new(Vec2::splat(1000.0), open_sky, PilotTuning::default());
        let right = Thrust {
            right: true,
            ..Thrust::NONE
        };
        for _ in 0..200 {
            pilot.step(right);
        }
        assert!(pilot.velocity().length() < 8.0);
    }

    #[test]
    fn pilot_stays_inside_the_viewport() {
        let mut pilot = pilot_at(Vec2::new(230.0, 310.0));
        let down_right = Thrust {
            down: true,
            right: true,
            ..Thrust::NONE
        };
        for _ in 0..20 {
            pilot.step(down_right);
        }
        assert_eq!(pilot.position(), Vec2::new(224.0, 304.0));
        assert_eq!(pilot.velocity(), Vec2::ZERO);
    }

    #[test]
    fn ceiling_rises_with_dropped_blocks() {
        let mut pilot = pilot_at(Vec2::new(100.0, 2.0));
        let up = Thrust {
            up: true,
            ..Thrust::NONE
        };
        for _ in 0..10 {
            pilot.step(up);
        }
        assert_eq!(pilot.position().y, 0.0);

        pilot.raise_ceiling(50.0);
        assert_eq!(pilot.maximum_altitude(), 30.0);
        pilot.raise_ceiling(70.0);
        assert_eq!(pilot.maximum_altitude(), 30.0);
        for _ in 0..40 {
            pilot.step(up);
        }
        assert_eq!(pilot.position().y, -30.0);
    }

    #[test]
    fn autopilot_holds_thrust_for_its_interval() {
        let mut autopilot = Autopilot::new(30);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let first = autopilot.next(&mut rng);
        for _ in 1..30 {
            assert_eq!(autopilot.next(&mut rng), first);
        }
        assert!(Thrust::AUTOPILOT_CHOICES.contains(&autopilot.next(&mut rng)));
    }
}
