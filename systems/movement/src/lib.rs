#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mobile agents: the invader swarm following the navigation field and the
//! thrust-driven pilot that carries blocks.

mod pilot;
mod swarm;

pub use pilot::{Autopilot, Pilot, PilotTuning, Thrust};
pub use swarm::{Invader, Swarm, SwarmTuning};
