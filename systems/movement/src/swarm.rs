//! Invaders drifting down the navigation field towards the goal lots.

use glam::{UVec2, Vec2};
use rand::Rng;
use skyline_core::{Heading, STEP_X, STEP_Y};
use skyline_world::{query, City};

/// Knobs controlling how invaders spawn and how fast they drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwarmTuning {
    /// Horizontal and vertical radii of the spawn ellipse.
    pub spawn_radius: Vec2,
    /// Upper bound of the random per-tick step scale.
    pub step_scale: f32,
    /// Invaders added every tick.
    pub spawn_per_tick: u32,
}

impl Default for SwarmTuning {
    fn default() -> Self {
        Self {
            spawn_radius: Vec2::new(120.0, 60.0),
            step_scale: 0.1,
            spawn_per_tick: 1,
        }
    }
}

/// A single point-like agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Invader {
    position: Vec2,
    previous: Vec2,
}

impl Invader {
    /// Creates an invader resting at `position`.
    #[must_use]
    pub const fn new(position: Vec2) -> Self {
        Self {
            position,
            previous: position,
        }
    }

    /// Current screen position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Position before the latest step, used to draw a short trail.
    #[must_use]
    pub const fn previous(&self) -> Vec2 {
        self.previous
    }

    // Returns false once the invader has nowhere left to go.
    fn advance<R: Rng + ?Sized>(&mut self, city: &City, step_scale: f32, rng: &mut R) -> bool {
        self.previous = self.position;
        let tile = city.projection().screen_to_tile(self.position);
        let heading = query::heading_at(city, tile);
        if heading == Heading::Hold {
            return false;
        }

        let (dc, dr) = heading.offset();
        let scale = step_scale * rng.gen::<f32>();
        let step = Vec2::new(
            (dr * STEP_X - dc * STEP_Y) as f32,
            ((dr * STEP_X).div_euclid(2) + (dc * STEP_Y).div_euclid(2)) as f32,
        );
        self.position += step * scale;
        true
    }
}

/// Every live invader together with its spawn parameters.
#[derive(Clone, Debug)]
pub struct Swarm {
    origin: Vec2,
    tuning: SwarmTuning,
    spawning: bool,
    invaders: Vec<Invader>,
}

impl Swarm {
    /// Creates an empty swarm spawning around `origin`.
    #[must_use]
    pub fn new(origin: Vec2, tuning: SwarmTuning) -> Self {
        Self {
            origin,
            tuning,
            spawning: true,
            invaders: Vec::new(),
        }
    }

    /// Spawn centre used for a city drawn in `viewport`.
    #[must_use]
    pub fn spawn_origin(viewport: UVec2, y_offset_base: i32) -> Vec2 {
        Vec2::new(viewport.x as f32 * 0.5, (150 + y_offset_base) as f32)
    }

    /// Enables or pauses spawning; live invaders keep moving either way.
    pub fn set_spawning(&mut self, spawning: bool) {
        self.spawning = spawning;
    }

    /// Live invaders in spawn order.
    #[must_use]
    pub fn invaders(&self) -> &[Invader] {
        &self.invaders
    }

    /// Adds one invader at a random point on the spawn ellipse.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let angle = rng.gen::<f32>() * std::f32::consts::TAU;
        let offset = Vec2::new(angle.cos(), angle.sin()) * self.tuning.spawn_radius;
        self.invaders.push(Invader::new(self.origin + offset));
    }

    /// Advances every invader one tick, culls the ones that stopped, then spawns.
    pub fn step<R: Rng + ?Sized>(&mut self, city: &City, rng: &mut R) {
        let step_scale = self.tuning.step_scale;
        self.invaders
            .retain_mut(|invader| invader.advance(city, step_scale, &mut *rng));

        if self.spawning {
            for _ in 0..self.tuning.spawn_per_tick {
                self.spawn(rng);
            }
        }
    }
}
