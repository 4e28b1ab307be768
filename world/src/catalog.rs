//! Immutable block shape templates and the palettes that draw from them.

use std::sync::Arc;

use rand::{seq::SliceRandom, Rng};
use skyline_core::{FootprintPart, TileKind};

use crate::{Block, CatalogError};

/// Family a block template belongs to; renderers pick sprites from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockFamily {
    /// Single-cell building storey.
    Tower,
    /// Single-cell landmark storey used on special lots.
    Beacon,
    /// Two cells at the same altitude joined by a bridge.
    Skybridge,
    /// Two cells one level apart joined by a ramp.
    Skyramp,
}

/// Shape descriptor shared by every block instance built from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    family: BlockFamily,
    variant: u16,
    parts: Vec<FootprintPart>,
}

impl BlockTemplate {
    /// Creates a template from its footprint.
    ///
    /// Only emptiness is rejected; overlapping or disconnected parts are legal
    /// and behave exactly as their offsets describe.
    pub fn new(
        family: BlockFamily,
        variant: u16,
        parts: Vec<FootprintPart>,
    ) -> Result<Self, CatalogError> {
        if parts.is_empty() {
            return Err(CatalogError::EmptyFootprint);
        }
        Ok(Self {
            family,
            variant,
            parts,
        })
    }

    /// Creates a template occupying only its anchor cell.
    #[must_use]
    pub fn single(family: BlockFamily, variant: u16) -> Self {
        Self {
            family,
            variant,
            parts: vec![FootprintPart::ANCHOR],
        }
    }

    /// Family the template belongs to.
    #[must_use]
    pub const fn family(&self) -> BlockFamily {
        self.family
    }

    /// Presentation variant within the family.
    #[must_use]
    pub const fn variant(&self) -> u16 {
        self.variant
    }

    /// Footprint parts in declaration order.
    #[must_use]
    pub fn parts(&self) -> &[FootprintPart] {
        &self.parts
    }

    /// Reports whether the template occupies exactly its anchor cell.
    #[must_use]
    pub fn is_single_cell(&self) -> bool {
        self.parts == [FootprintPart::ANCHOR]
    }
}

/// Registry of every template available for seeding and for the staging area.
#[derive(Clone, Debug, Default)]
pub struct BlockCatalog {
    towers: Vec<Arc<BlockTemplate>>,
    beacons: Vec<Arc<BlockTemplate>>,
    pool: Vec<Arc<BlockTemplate>>,
}

impl BlockCatalog {
    /// Creates a catalog from explicit palettes and a weighted staging pool.
    ///
    /// Repeating a template in `pool` raises its draw weight. Seeding palettes
    /// only retain single-cell templates.
    #[must_use]
    pub fn new(
        towers: Vec<Arc<BlockTemplate>>,
        beacons: Vec<Arc<BlockTemplate>>,
        pool: Vec<Arc<BlockTemplate>>,
    ) -> Self {
        let single = |templates: Vec<Arc<BlockTemplate>>| {
            templates
                .into_iter()
                .filter(|template| template.is_single_cell())
                .collect::<Vec<_>>()
        };
        Self {
            towers: single(towers),
            beacons: single(beacons),
            pool,
        }
    }

    /// The catalog shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        let mut towers = Vec::new();
        let mut variant = 0_u16;
        // Facade sets with their draw weights: one full set and two accent sets.
        for (facades, weight) in [(8_u16, 1_usize), (2, 4), (3, 4)] {
            let family: Vec<Arc<BlockTemplate>> = (0..facades * facades)
                .map(|offset| Arc::new(BlockTemplate::single(BlockFamily::Tower, variant + offset)))
                .collect();
            variant += facades * facades;
            for _ in 0..weight {
                towers.extend(family.iter().cloned());
            }
        }

        let beacons: Vec<Arc<BlockTemplate>> = (0..2)
            .map(|variant| Arc::new(BlockTemplate::single(BlockFamily::Beacon, variant)))
            .collect();

        let bridges = [
            (3, [FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 0)]),
            (3, [FootprintPart::ANCHOR, FootprintPart::new(0, -1, 0)]),
        ];
        let ramps = [
            (2, [FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 1)]),
            (1, [FootprintPart::ANCHOR, FootprintPart::new(1, 0, 1)]),
            (2, [FootprintPart::ANCHOR, FootprintPart::new(0, -1, 1)]),
            (1, [FootprintPart::new(0, 1, 1), FootprintPart::ANCHOR]),
        ];

        let mut pool = towers.clone();
        for _ in 0..4 {
            pool.extend(beacons.iter().cloned());
        }
        pool.extend(linked(BlockFamily::Skybridge, &bridges));
        pool.extend(linked(BlockFamily::Skyramp, &ramps));

        Self::new(towers, beacons, pool)
    }

    /// Seeding palette for a foundation kind; empty for unbuildable kinds.
    #[must_use]
    pub fn palette(&self, kind: TileKind) -> &[Arc<BlockTemplate>] {
        match kind {
            TileKind::Buildable => &self.towers,
            TileKind::Special => &self.beacons,
            TileKind::Empty | TileKind::RoadHorizontal | TileKind::RoadVertical => &[],
        }
    }

    /// Weighted pool the staging area draws fresh blocks from.
    #[must_use]
    pub fn pool(&self) -> &[Arc<BlockTemplate>] {
        &self.pool
    }

    /// Draws a fresh, unplaced block from the staging pool.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Block> {
        self.pool
            .choose(rng)
            .map(|template| Block::new(Arc::clone(template)))
    }
}

// Every linked shape comes in four facade pairings per connector sprite.
fn linked<const N: usize>(
    family: BlockFamily,
    shapes: &[(u16, [FootprintPart; N])],
) -> Vec<Arc<BlockTemplate>> {
    let mut templates = Vec::new();
    let mut variant = 0_u16;
    for (connectors, parts) in shapes {
        for _ in 0..connectors * 4 {
            templates.push(Arc::new(BlockTemplate {
                family,
                variant,
                parts: parts.to_vec(),
            }));
            variant += 1;
        }
    }
    templates
}
