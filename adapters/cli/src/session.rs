//! Headless play session: intro countdown, timed building, final tally.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use anyhow::{Context, Result};
use glam::Vec2;
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skyline_core::Event;
use skyline_system_builder::{Builder, DropTarget, StagingArea};
use skyline_system_movement::{Autopilot, Pilot, PilotTuning, Swarm};
use skyline_world::{query, BlockCatalog, City};

use crate::config::{SessionConfig, TICKS_PER_SECOND};

/// Where the pilot starts, as the upper-left corner of its sprite.
const PILOT_START: Vec2 = Vec2::new(100.0, 100.0);

/// Distance the camera keeps between the pilot and the viewport edges.
const CAMERA_MARGIN: f32 = 40.0;

/// Score thresholds and their titles, best first.
const RANKS: [(&str, i64); 7] = [
    ("Grandmaster", 5000),
    ("Master", 2000),
    ("Expert", 1000),
    ("Veteran", 500),
    ("Learner", 250),
    ("Novice", 125),
    ("Asleep", 0),
];

/// Screens shown before play starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IntroStage {
    Message,
    Countdown(u8),
    Go,
}

impl IntroStage {
    const fn ticks(self) -> u32 {
        match self {
            Self::Message => 2 * TICKS_PER_SECOND,
            Self::Countdown(_) | Self::Go => TICKS_PER_SECOND,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Intro { stage: IntroStage, remaining: u32 },
    Play { remaining: u32 },
    TimesUp { remaining: u32 },
    Finished,
}

/// Counts of every builder event raised during the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct EventTally {
    pub(crate) placed: u32,
    pub(crate) failed_place: u32,
    pub(crate) picked_up: u32,
    pub(crate) failed_pickup: u32,
}

impl EventTally {
    fn record(&mut self, event: Event) {
        let counter = match event {
            Event::Placed => &mut self.placed,
            Event::FailedPlace => &mut self.failed_place,
            Event::PickedUp => &mut self.picked_up,
            Event::FailedPickup => &mut self.failed_pickup,
        };
        *counter += 1;
    }
}

/// Outcome of a finished session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SessionReport {
    pub(crate) ticks: u32,
    pub(crate) score: i64,
    pub(crate) rank: Option<&'static str>,
    pub(crate) highest_building: u32,
    pub(crate) blocks: usize,
    pub(crate) invaders: usize,
    pub(crate) events: EventTally,
    pub(crate) fingerprint: u64,
}

/// A single game from intro to final tally, driven by the autopilot.
pub(crate) struct Session {
    phase: Phase,
    tick: u32,
    max_ticks: u32,
    time_limit: u32,
    action_interval: u32,
    invaders_enabled: bool,
    viewport: Vec2,
    rng: ChaCha8Rng,
    catalog: BlockCatalog,
    city: City,
    staging: Option<StagingArea>,
    builder: Builder,
    pilot: Pilot,
    autopilot: Autopilot,
    swarm: Swarm,
    camera_altitude: f32,
    events: EventTally,
}

impl Session {
    /// Builds a fresh city, shelf and swarm from the configuration.
    pub(crate) fn new(config: &SessionConfig) -> Result<Self> {
        let layout = config.city_layout()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let catalog = BlockCatalog::standard();
        let city = City::load(&layout, &config.load_settings(), &catalog, &mut rng)
            .context("failed to seed the city")?;

        let time_limit = config.time_limit.saturating_mul(TICKS_PER_SECOND);
        let (phase, staging) = if config.demo {
            (Phase::Play { remaining: time_limit }, None)
        } else {
            let stage = IntroStage::Message;
            (
                Phase::Intro {
                    stage,
                    remaining: stage.ticks(),
                },
                Some(StagingArea::new(config.staging_layout())),
            )
        };

        let swarm_origin = Swarm::spawn_origin(config.viewport(), config.y_offset_base);
        Ok(Self {
            phase,
            tick: 0,
            max_ticks: config.max_ticks,
            time_limit,
            action_interval: config.action_interval.max(1),
            invaders_enabled: config.invaders.enabled,
            viewport: config.viewport_size(),
            rng,
            catalog,
            city,
            staging,
            builder: Builder::new(config.pickup_radius),
            pilot: Pilot::new(PILOT_START, config.viewport_size(), PilotTuning::default()),
            autopilot: Autopilot::default(),
            swarm: Swarm::new(swarm_origin, config.swarm_tuning()),
            camera_altitude: 0.0,
            events: EventTally::default(),
        })
    }

    /// Runs until the tally is shown or the tick budget runs out.
    pub(crate) fn run(mut self) -> SessionReport {
        while self.phase != Phase::Finished && self.tick < self.max_ticks {
            self.step();
        }
        self.report()
    }

    fn step(&mut self) {
        self.phase = match self.phase {
            Phase::Intro { stage, remaining } if remaining > 1 => Phase::Intro {
                stage,
                remaining: remaining - 1,
            },
            Phase::Intro { stage, .. } => self.after_intro(stage),
            Phase::Play { remaining } => {
                self.simulate();
                if remaining > 1 {
                    Phase::Play {
                        remaining: remaining - 1,
                    }
                } else {
                    info!("time's up at tick {}, score {}", self.tick, self.city.score());
                    Phase::TimesUp {
                        remaining: TICKS_PER_SECOND,
                    }
                }
            }
            Phase::TimesUp { remaining } if remaining > 1 => Phase::TimesUp {
                remaining: remaining - 1,
            },
            Phase::TimesUp { .. } | Phase::Finished => Phase::Finished,
        };
        self.tick += 1;
    }

    fn after_intro(&self, stage: IntroStage) -> Phase {
        let next = match stage {
            IntroStage::Message => IntroStage::Countdown(3),
            IntroStage::Countdown(count) if count > 1 => IntroStage::Countdown(count - 1),
            IntroStage::Countdown(_) => IntroStage::Go,
            IntroStage::Go => {
                info!("play starts at tick {}", self.tick);
                return Phase::Play {
                    remaining: self.time_limit,
                };
            }
        };
        debug!("intro {next:?}");
        Phase::Intro {
            stage: next,
            remaining: next.ticks(),
        }
    }

    fn simulate(&mut self) {
        let thrust = self.autopilot.next(&mut self.rng);
        self.pilot.step(thrust);

        if let Some(staging) = self.staging.as_mut() {
            let y = self.pilot.position().y;
            if y + self.camera_altitude < CAMERA_MARGIN {
                self.camera_altitude = CAMERA_MARGIN - y;
            }
            if y + self.camera_altitude > self.viewport.y - CAMERA_MARGIN {
                self.camera_altitude = (self.viewport.y - CAMERA_MARGIN - y).max(0.0);
            }
            staging.set_camera_altitude(self.camera_altitude);
            staging.refill(&self.catalog, &mut self.rng);
        }

        if self.tick % self.action_interval == 0 {
            self.act();
        }

        if self.invaders_enabled {
            self.swarm.step(&self.city, &mut self.rng);
        }
    }

    fn act(&mut self) {
        let mut events = Vec::new();
        let landed = self.builder.act(
            &mut self.city,
            self.staging.as_mut(),
            self.pilot.center(),
            &mut events,
        );
        if let Some(DropTarget::City {
            anchor,
            base_altitude,
        }) = landed
        {
            let block_y = self
                .city
                .projection()
                .tile_to_screen(anchor, base_altitude as i32)
                .y;
            self.pilot.raise_ceiling(block_y as f32);
        }

        for event in events {
            debug!("tick {}: {event:?}", self.tick);
            self.events.record(event);
        }
    }

    fn report(&self) -> SessionReport {
        let score = self.city.score();
        SessionReport {
            ticks: self.tick,
            score,
            rank: rank(score),
            highest_building: self.city.highest_building(),
            blocks: query::block_count(&self.city),
            invaders: self.swarm.invaders().len(),
            events: self.events,
            fingerprint: self.fingerprint(),
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for tile in query::tiles(&self.city) {
            tile.coord().hash(&mut hasher);
            for level in tile.levels() {
                level.entry.hash(&mut hasher);
                level.block.template().family().hash(&mut hasher);
                level.block.template().variant().hash(&mut hasher);
            }
        }
        self.pilot.position().x.to_bits().hash(&mut hasher);
        self.pilot.position().y.to_bits().hash(&mut hasher);
        for invader in self.swarm.invaders() {
            invader.position().x.to_bits().hash(&mut hasher);
            invader.position().y.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Title earned by a final score; negative scores earn none.
pub(crate) fn rank(score: i64) -> Option<&'static str> {
    RANKS
        .iter()
        .find(|(_, threshold)| score >= *threshold)
        .map(|(title, _)| *title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config(seed: u64) -> SessionConfig {
        SessionConfig {
            seed,
            time_limit: 4,
            action_interval: 5,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn phases_run_intro_play_and_tally() {
        let report = Session::new(&SessionConfig {
            time_limit: 1,
            ..short_config(1)
        })
        .expect("session builds")
        .run();
        // Intro 2s + 3 countdown seconds + go, one second of play, one of tally.
        assert_eq!(report.ticks, (2 + 3 + 1 + 1 + 1) * TICKS_PER_SECOND);
    }

    #[test]
    fn demo_skips_intro_and_shelf() {
        let config = SessionConfig {
            demo: true,
            time_limit: 1,
            ..short_config(1)
        };
        let session = Session::new(&config).expect("session builds");
        assert!(session.staging.is_none());
        assert_eq!(session.run().ticks, 2 * TICKS_PER_SECOND);
    }

    #[test]
    fn tick_budget_stops_the_session() {
        let config = SessionConfig {
            max_ticks: 10,
            ..short_config(1)
        };
        let report = Session::new(&config).expect("session builds").run();
        assert_eq!(report.ticks, 10);
        assert_eq!(report.events, EventTally::default());
    }

    #[test]
    fn huge_time_limit_saturates_instead_of_overflowing() {
        let config = SessionConfig {
            time_limit: 200_000_000,
            max_ticks: 300,
            ..short_config(3)
        };
        let session = Session::new(&config).expect("session builds");
        assert_eq!(session.time_limit, u32::MAX);
        assert_eq!(session.run().ticks, 300);
    }

    #[test]
    fn deterministic_replay_produces_identical_reports() {
        let first = Session::new(&short_config(42)).expect("session builds").run();
        let second = Session::new(&short_config(42)).expect("session builds").run();
        assert_eq!(first, second, "replay diverged between runs");

        let mut hasher = DefaultHasher::new();
        first.hash(&mut hasher);
        let mut again = DefaultHasher::new();
        second.hash(&mut again);
        assert_eq!(hasher.finish(), again.finish());
    }

    #[test]
    fn seeded_city_starts_at_zero_score() {
        let session = Session::new(&short_config(9)).expect("session builds");
        assert_eq!(session.city.score(), 0);
        assert!(session.city.highest_building() <= 7);
    }

    #[test]
    fn ranks_follow_the_score_table() {
        assert_eq!(rank(6000), Some("Grandmaster"));
        assert_eq!(rank(2000), Some("Master"));
        assert_eq!(rank(124), Some("Asleep"));
        assert_eq!(rank(0), Some("Asleep"));
        assert_eq!(rank(-3), None);
    }

    #[test]
    fn event_tally_counts_each_kind() {
        let mut tally = EventTally::default();
        for event in [Event::Placed, Event::Placed, Event::FailedPickup] {
            tally.record(event);
        }
        assert_eq!(tally.placed, 2);
        assert_eq!(tally.failed_pickup, 1);
        assert_eq!(tally.picked_up, 0);
    }
}
