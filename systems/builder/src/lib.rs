#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pick-up and drop-off resolution for the block-carrying builder.
//!
//! The spatial queries scan the city and the staging shelf for the candidate
//! nearest to a screen point; [`Builder::act`] turns the winning candidate
//! into a single city or staging mutation and reports it as an [`Event`].

use glam::Vec2;
use log::debug;
use skyline_core::{BlockId, Event, TileCoord};
use skyline_world::{query, Block, City};

mod staging;

pub use staging::{StagingArea, StagingLayout};

/// Default search radius, in screen units, for both pick-up and drop-off.
pub const SEARCH_RADIUS: f32 = 40.0;

/// Vertical offset from the carrier centre to the pick-up probe.
pub const PICKUP_PROBE_OFFSET: f32 = 10.0;

/// Vertical offset from the carrier centre to the drop-off probe.
pub const DROP_PROBE_OFFSET: f32 = 12.0;

/// Collection a pick-up candidate lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupSpot {
    /// Topmost block on a city tile; lifting it requires [`City::remove`].
    City {
        /// Block on top of the tile.
        block: BlockId,
        /// Tile whose stack the block tops.
        tile: TileCoord,
    },
    /// Block waiting on the staging shelf.
    Staging {
        /// Shelf slot holding the block.
        slot: usize,
    },
}

/// Where a carried block would be set down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropTarget {
    /// Anchor on a city tile at its current stack height.
    City {
        /// Tile receiving the anchor part.
        anchor: TileCoord,
        /// Altitude the anchor part would occupy.
        base_altitude: u32,
    },
    /// Back into the shelf slot the block was taken from.
    Staging {
        /// Reserved shelf slot.
        slot: usize,
    },
}

/// Closest drop-off candidate together with its validity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropSpot {
    /// Whether the block can actually be set down here.
    pub valid: bool,
    /// Candidate location.
    pub target: DropTarget,
}

/// Finds the block nearest to `point` that could be lifted.
///
/// City tiles are scanned row-major before the staging shelf; equidistant
/// candidates resolve to the one scanned last.
#[must_use]
pub fn closest_pickup_spot(
    city: &City,
    staging: Option<&StagingArea>,
    point: Vec2,
    radius: f32,
) -> Option<PickupSpot> {
    let mut closest = None;
    let mut closest_distance = radius;
    let mut consider = |spot: PickupSpot, candidate: Vec2| {
        let distance = candidate.distance(point);
        if distance <= closest_distance {
            closest = Some(spot);
            closest_distance = distance;
        }
    };

    let projection = city.projection();
    for tile in query::tiles(city) {
        let coord = tile.coord();
        let Some(block) = query::top_block(city, coord) else {
            continue;
        };
        let height = city.stack_height(coord).unwrap_or(0);
        consider(
            PickupSpot::City { block, tile: coord },
            projection.tile_center(coord, height as i32 - 1),
        );
    }

    if let Some(staging) = staging {
        for (slot, _) in staging.blocks() {
            consider(PickupSpot::Staging { slot }, staging.slot_center(slot));
        }
    }

    closest
}

/// Finds where `block` would be set down if dropped near `point`.
///
/// A valid candidate always beats an invalid one; among equally valid
/// candidates the nearer wins. The reserved staging slot is always a valid
/// candidate while the block is carried from the shelf.
#[must_use]
pub fn closest_drop_spot(
    city: &City,
    staging: Option<&StagingArea>,
    point: Vec2,
    block: &Block,
    radius: f32,
) -> Option<DropSpot> {
    let mut closest: Option<(DropSpot, f32)> = None;
    let projection = city.projection();

    for tile in query::tiles(city) {
        let anchor = tile.coord();
        let Some(base_altitude) = city.stack_height(anchor) else {
            continue;
        };
        let distance = projection
            .tile_center(anchor, base_altitude as i32)
            .distance(point);
        if distance > radius {
            continue;
        }

        let valid = city.valid_drop_spot(anchor, base_altitude, block);
        let replaces = match closest {
            None => true,
            Some((best, best_distance)) => {
                (valid && !best.valid) || (valid == best.valid && distance <= best_distance)
            }
        };
        if replaces {
            closest = Some((
                DropSpot {
                    valid,
                    target: DropTarget::City {
                        anchor,
                        base_altitude,
                    },
                },
                distance,
            ));
        }
    }

    if let Some(staging) = staging {
        if let Some(slot) = staging.carried_slot() {
            let distance = staging.slot_center(slot).distance(point);
            let replaces = distance <= radius
                && match closest {
                    None => true,
                    Some((best, best_distance)) => !best.valid || distance < best_distance,
                };
            if replaces {
                closest = Some((
                    DropSpot {
                        valid: true,
                        target: DropTarget::Staging { slot },
                    },
                    distance,
                ));
            }
        }
    }

    closest.map(|(spot, _)| spot)
}

/// Carrier that lifts one block at a time and sets it down elsewhere.
#[derive(Clone, Debug)]
pub struct Builder {
    radius: f32,
    carrying: Option<Block>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(SEARCH_RADIUS)
    }
}

impl Builder {
    /// Creates an empty-handed builder searching within `radius`.
    #[must_use]
    pub const fn new(radius: f32) -> Self {
        Self {
            radius,
            carrying: None,
        }
    }

    /// Block currently carried, if any.
    #[must_use]
    pub const fn carrying(&self) -> Option<&Block> {
        self.carrying.as_ref()
    }

    /// Drop-off spot the carried block would land on, for indicator rendering.
    #[must_use]
    pub fn drop_preview(
        &self,
        city: &City,
        staging: Option<&StagingArea>,
        center: Vec2,
    ) -> Option<DropSpot> {
        let block = self.carrying.as_ref()?;
        closest_drop_spot(city, staging, drop_probe(center), block, self.radius)
    }

    /// Block an empty-handed action would lift, for indicator rendering.
    #[must_use]
    pub fn pickup_preview(
        &self,
        city: &City,
        staging: Option<&StagingArea>,
        center: Vec2,
    ) -> Option<PickupSpot> {
        if self.carrying.is_some() {
            return None;
        }
        closest_pickup_spot(city, staging, pickup_probe(center), self.radius)
    }

    /// Resolves one action edge at the carrier centre.
    ///
    /// Drops the carried block if there is one, otherwise tries to pick one
    /// up. Returns where the block landed when a drop succeeded.
    pub fn act(
        &mut self,
        city: &mut City,
        mut staging: Option<&mut StagingArea>,
        center: Vec2,
        out: &mut Vec<Event>,
    ) -> Option<DropTarget> {
        match self.carrying.take() {
            Some(block) => {
                let spot = closest_drop_spot(
                    city,
                    staging.as_deref(),
                    drop_probe(center),
                    &block,
                    self.radius,
                );
                let landed = match spot {
                    Some(DropSpot {
                        valid: true,
                        target,
                    }) => self.set_down(city, staging.as_deref_mut(), target, block),
                    _ => {
                        self.carrying = Some(block);
                        None
                    }
                };
                out.push(if landed.is_some() {
                    Event::Placed
                } else {
                    Event::FailedPlace
                });
                landed
            }
            None => {
                let Some(spot) = closest_pickup_spot(
                    city,
                    staging.as_deref(),
                    pickup_probe(center),
                    self.radius,
                ) else {
                    return None;
                };
                self.carrying = match spot {
                    PickupSpot::City { block, .. } => city.remove(block).ok(),
                    PickupSpot::Staging { slot } => {
                        staging.as_deref_mut().and_then(|staging| staging.take(slot))
                    }
                };
                debug!("pick-up at {spot:?}: lifted {}", self.carrying.is_some());
                out.push(if self.carrying.is_some() {
                    Event::PickedUp
                } else {
                    Event::FailedPickup
                });
                None
            }
        }
    }

    fn set_down(
        &mut self,
        city: &mut City,
        staging: Option<&mut StagingArea>,
        target: DropTarget,
        block: Block,
    ) -> Option<DropTarget> {
        match (target, staging) {
            (DropTarget::City { anchor, .. }, staging) => {
                let id = city.add(anchor, block);
                if let Some(staging) = staging {
                    staging.placed();
                }
                debug!("placed {id:?} at {anchor:?}");
                Some(target)
            }
            (DropTarget::Staging { .. }, Some(staging)) => match staging.return_block(block) {
                Ok(()) => Some(target),
                Err(block) => {
                    self.carrying = Some(block);
                    None
                }
            },
            (DropTarget::Staging { .. }, None) => {
                self.carrying = Some(block);
                None
            }
        }
    }
}

fn pickup_probe(center: Vec2) -> Vec2 {
    center + Vec2::new(0.0, PICKUP_PROBE_OFFSET)
}

fn drop_probe(center: Vec2) -> Vec2 {
    center + Vec2::new(0.0, DROP_PROBE_OFFSET)
}
