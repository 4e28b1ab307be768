#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative city state for Skyline.
//!
//! The [`City`] owns a fixed grid of tiles, each carrying an ordered stack of
//! block parts from the ground up. Blocks are moved into the city by
//! [`City::add`] and moved back out by [`City::remove`]; validation is split
//! into [`City::valid_drop_spot`] so callers can probe many candidate spots
//! before committing a single mutation.

use std::{collections::BTreeMap, sync::Arc};

use glam::UVec2;
use log::{debug, info};
use rand::{seq::SliceRandom, Rng};
use skyline_core::{BlockId, Projection, TileCoord, TileKind};
use thiserror::Error;

mod catalog;
mod layout;
mod navigation;

pub use catalog::{BlockCatalog, BlockFamily, BlockTemplate};
pub use layout::Layout;
pub use navigation::{NavigationField, DISTANCE_HORIZON, UNREACHABLE};

/// Reasons a static layout cannot be turned into a city.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout contained no rows.
    #[error("layout is empty")]
    Empty,
    /// A row contained a different number of symbols than the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A symbol did not name any tile kind.
    #[error("undefined tile symbol {symbol:?} at column {column}, row {row}")]
    UnknownSymbol {
        /// The offending symbol.
        symbol: char,
        /// Zero-based column index.
        column: u32,
        /// Zero-based row index.
        row: u32,
    },
    /// A dense cell list did not match the declared dimensions.
    #[error("layout declares {expected} cells but {found} were provided")]
    CellCount {
        /// Cells implied by the dimensions.
        expected: u64,
        /// Cells actually provided.
        found: usize,
    },
    /// The requested window does not fit inside the source map.
    #[error("window of {columns}x{rows} at {origin:?} exceeds the map")]
    WindowOutOfRange {
        /// Upper-left tile of the window.
        origin: TileCoord,
        /// Requested window width.
        columns: u32,
        /// Requested window height.
        rows: u32,
    },
    /// A starting height exceeded the configured maximum.
    #[error("starting height {height} exceeds the maximum of {max_height}")]
    HeightAboveMaximum {
        /// Offending height.
        height: u32,
        /// Configured maximum starting height.
        max_height: u32,
    },
    /// A lot needs seeding but the catalog has no single-cell templates for it.
    #[error("catalog has no seeding palette for {0:?} lots")]
    EmptyPalette(TileKind),
}

/// Reasons a block template cannot be constructed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    /// A template must occupy at least one cell.
    #[error("block footprint must contain at least one part")]
    EmptyFootprint,
}

/// Reasons a block cannot be lifted out of the city.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemovalError {
    /// No block with the identifier is registered in the city.
    #[error("block {0:?} is not part of the city")]
    MissingBlock(BlockId),
    /// Something rests on top of one of the block's cells.
    #[error("block {block:?} is buried at {tile:?}")]
    Buried {
        /// Block targeted for removal.
        block: BlockId,
        /// First tile where the block is not the topmost entry.
        tile: TileCoord,
    },
}

/// Where a block currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Carried or staged; the block belongs to no tile stack.
    Unplaced,
    /// Registered in the city.
    Placed {
        /// Tile the block is registered under.
        anchor: TileCoord,
        /// Altitude of the anchor part.
        base_altitude: u32,
    },
}

/// A placeable instance of a shared [`BlockTemplate`].
#[derive(Clone, Debug)]
pub struct Block {
    template: Arc<BlockTemplate>,
    placement: Placement,
}

impl Block {
    /// Creates an unplaced block from a shared template.
    #[must_use]
    pub fn new(template: Arc<BlockTemplate>) -> Self {
        Self {
            template,
            placement: Placement::Unplaced,
        }
    }

    /// Template describing the block's footprint.
    #[must_use]
    pub fn template(&self) -> &Arc<BlockTemplate> {
        &self.template
    }

    /// Current placement state.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Reports whether the block is registered in a city.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        matches!(self.placement, Placement::Placed { .. })
    }
}

/// One level of a tile stack: which block occupies it and with which part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StackEntry {
    block: BlockId,
    part: usize,
}

impl StackEntry {
    /// Block occupying this level.
    #[must_use]
    pub const fn block(&self) -> BlockId {
        self.block
    }

    /// Index into the block template's footprint of the occupying part.
    #[must_use]
    pub const fn part(&self) -> usize {
        self.part
    }
}

/// A single cell of the city grid.
#[derive(Clone, Debug)]
pub struct Tile {
    coord: TileCoord,
    kind: TileKind,
    stack: Option<Vec<StackEntry>>,
}

impl Tile {
    fn new(coord: TileCoord, kind: TileKind) -> Self {
        Self {
            coord,
            kind,
            stack: kind.is_buildable().then(Vec::new),
        }
    }

    /// Coordinate of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Foundation kind laid by the layout.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Bottom-to-top stack, or `None` when blocks can never be placed here.
    #[must_use]
    pub fn stack(&self) -> Option<&[StackEntry]> {
        self.stack.as_deref()
    }

    /// Number of levels currently stacked on the tile.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.stack.as_ref().map_or(0, |stack| stack.len() as u32)
    }

    /// Topmost entry, if any.
    #[must_use]
    pub fn top(&self) -> Option<StackEntry> {
        self.stack.as_ref().and_then(|stack| stack.last().copied())
    }
}

/// Knobs that control how a layout is seeded with starting buildings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSettings {
    /// Upper bound for every seeded stack.
    pub max_height: u32,
    /// Height seeded on every special lot.
    pub special_height: u32,
    /// Starting building heights, each consumed at most once.
    pub building_presets: Vec<u32>,
    /// Viewport the projection centres the grid in.
    pub viewport: UVec2,
    /// Extra downward shift applied to the whole grid.
    pub y_offset_base: i32,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            max_height: 7,
            special_height: 7,
            building_presets: vec![5, 4, 4, 4, 3, 3, 3, 2, 2, 2, 1, 1],
            viewport: UVec2::new(240, 320),
            y_offset_base: 80,
        }
    }
}

/// The mutable city grid together with its projection and navigation field.
#[derive(Debug)]
pub struct City {
    columns: u32,
    rows: u32,
    tiles: Vec<Option<Tile>>,
    blocks: BTreeMap<BlockId, Block>,
    next_block_id: BlockId,
    projection: Projection,
    navigation: NavigationField,
    base_score: i64,
}

impl City {
    /// Builds a city from a static layout, seeding starting buildings from `rng`.
    pub fn load<R: Rng + ?Sized>(
        layout: &Layout,
        settings: &LoadSettings,
        catalog: &BlockCatalog,
        rng: &mut R,
    ) -> Result<Self, LayoutError> {
        let tallest = settings
            .building_presets
            .iter()
            .copied()
            .chain([settings.special_height])
            .max()
            .unwrap_or(0);
        if tallest > settings.max_height {
            return Err(LayoutError::HeightAboveMaximum {
                height: tallest,
                max_height: settings.max_height,
            });
        }

        let mut city = Self {
            columns: layout.columns(),
            rows: layout.rows(),
            tiles: layout
                .iter()
                .map(|(coord, kind)| (kind != TileKind::Empty).then(|| Tile::new(coord, kind)))
                .collect(),
            blocks: BTreeMap::new(),
            next_block_id: BlockId::new(0),
            projection: Projection::centered(
                layout.columns(),
                layout.rows(),
                settings.viewport,
                settings.y_offset_base,
            ),
            navigation: NavigationField::from_layout(layout),
            base_score: 0,
        };

        let mut presets = settings.building_presets.clone();
        for (coord, kind) in layout.iter() {
            let height = match kind {
                TileKind::Buildable => {
                    let roll: f64 = rng.gen();
                    if !presets.is_empty() && seeds_building(coord.row(), roll) {
                        presets.remove(rng.gen_range(0..presets.len()))
                    } else {
                        0
                    }
                }
                TileKind::Special => settings.special_height,
                TileKind::Empty | TileKind::RoadHorizontal | TileKind::RoadVertical => 0,
            };
            if height == 0 {
                continue;
            }

            let palette = catalog.palette(kind);
            for _ in 0..height {
                let template = palette.choose(rng).ok_or(LayoutError::EmptyPalette(kind))?;
                let _ = city.add(coord, Block::new(Arc::clone(template)));
            }
        }

        city.base_score = city.raw_score();
        info!(
            "loaded {}x{} city with {} seeded blocks, tallest stack {}",
            city.columns,
            city.rows,
            city.blocks.len(),
            city.highest_building()
        );
        Ok(city)
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Projection centring this grid on screen.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Navigation field derived from the static layout.
    #[must_use]
    pub const fn navigation(&self) -> &NavigationField {
        &self.navigation
    }

    /// Tile at the coordinate, or `None` for empty and off-map cells.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord)
            .and_then(|index| self.tiles.get(index))
            .and_then(Option::as_ref)
    }

    /// Stack height of a buildable tile, or `None` when nothing can be stacked there.
    #[must_use]
    pub fn stack_height(&self, coord: TileCoord) -> Option<u32> {
        self.tile(coord)
            .and_then(Tile::stack)
            .map(|stack| stack.len() as u32)
    }

    /// Block registered under the identifier.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Places `block` with its anchor on top of the anchor tile's stack.
    ///
    /// Callers must have confirmed the spot with [`City::valid_drop_spot`] at
    /// the anchor's current height; no revalidation happens here.
    pub fn add(&mut self, anchor: TileCoord, mut block: Block) -> BlockId {
        let base_altitude = self.stack_height(anchor).unwrap_or(0);
        debug_assert!(
            self.valid_drop_spot(anchor, base_altitude, &block),
            "add called on an invalid drop spot at {anchor:?}"
        );

        let id = self.next_block_id;
        self.next_block_id = BlockId::new(id.get().wrapping_add(1));
        for (part_index, part) in block.template.parts().iter().enumerate() {
            if let Some(stack) = self.stack_mut(part.tile_from(anchor)) {
                stack.push(StackEntry {
                    block: id,
                    part: part_index,
                });
            }
        }

        block.placement = Placement::Placed {
            anchor,
            base_altitude,
        };
        let _ = self.blocks.insert(id, block);
        id
    }

    /// Reports whether every part of `block` would land flush on top of its tile.
    #[must_use]
    pub fn valid_drop_spot(&self, anchor: TileCoord, base_altitude: u32, block: &Block) -> bool {
        block.template.parts().iter().all(|part| {
            let Some(altitude) = part.altitude_from(base_altitude) else {
                return false;
            };
            self.stack_height(part.tile_from(anchor)) == Some(altitude)
        })
    }

    /// Lifts a block out of the city if it is topmost in every cell it occupies.
    ///
    /// Fails without touching any stack when any cell has something above it.
    pub fn remove(&mut self, id: BlockId) -> Result<Block, RemovalError> {
        let block = self.blocks.get(&id).ok_or(RemovalError::MissingBlock(id))?;
        let Placement::Placed {
            anchor,
            base_altitude,
        } = block.placement
        else {
            return Err(RemovalError::MissingBlock(id));
        };

        let template = Arc::clone(&block.template);
        for (part_index, part) in template.parts().iter().enumerate() {
            let tile = part.tile_from(anchor);
            let expected_height = part.altitude_from(base_altitude).map(|altitude| altitude + 1);
            let top = self.tile(tile).and_then(Tile::top);
            let is_top = top
                == Some(StackEntry {
                    block: id,
                    part: part_index,
                });
            if !is_top || self.stack_height(tile) != expected_height {
                debug!("refusing to remove {id:?}: buried at {tile:?}");
                return Err(RemovalError::Buried { block: id, tile });
            }
        }

        for part in template.parts() {
            if let Some(stack) = self.stack_mut(part.tile_from(anchor)) {
                let _ = stack.pop();
            }
        }

        let mut block = self
            .blocks
            .remove(&id)
            .ok_or(RemovalError::MissingBlock(id))?;
        block.placement = Placement::Unplaced;
        Ok(block)
    }

    /// Player contribution: triangular stack heights minus the seeded baseline.
    #[must_use]
    pub fn score(&self) -> i64 {
        self.raw_score() - self.base_score
    }

    /// Height of the tallest stack in the city.
    #[must_use]
    pub fn highest_building(&self) -> u32 {
        self.iter_tiles().map(Tile::height).max().unwrap_or(0)
    }

    fn raw_score(&self) -> i64 {
        self.iter_tiles()
            .map(|tile| {
                let height = i64::from(tile.height());
                height * (height - 1).max(0) / 2
            })
            .sum()
    }

    fn iter_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }

    fn stack_mut(&mut self, coord: TileCoord) -> Option<&mut Vec<StackEntry>> {
        let index = self.index(coord)?;
        self.tiles
            .get_mut(index)
            .and_then(Option::as_mut)
            .and_then(|tile| tile.stack.as_mut())
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        let column = u32::try_from(coord.column()).ok()?;
        let row = u32::try_from(coord.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }
}

// Lots nearer the front of the window are more likely to start built up.
fn seeds_building(row: i32, roll: f64) -> bool {
    (row < 10 && roll < 0.25)
        || (row == 8 && roll < 0.30)
        || (row == 9 && roll < 0.55)
        || (row == 10 && roll < 0.65)
        || (row == 11 && roll < 0.75)
        || row == 12
}

/// Query functions that provide read-only access to the city state.
pub mod query {
    use glam::IVec2;
    use skyline_core::{BlockId, Heading, TileCoord, TileKind};

    use super::{Block, City, StackEntry, Tile};

    /// Read-only description of a tile for presentation layers.
    #[derive(Clone, Copy, Debug)]
    pub struct TileView<'a> {
        tile: &'a Tile,
        city: &'a City,
    }

    impl<'a> TileView<'a> {
        /// Coordinate of the tile.
        #[must_use]
        pub fn coord(&self) -> TileCoord {
            self.tile.coord()
        }

        /// Foundation kind of the tile.
        #[must_use]
        pub fn kind(&self) -> TileKind {
            self.tile.kind()
        }

        /// Screen origin of the tile's foundation sprite.
        #[must_use]
        pub fn foundation_position(&self) -> IVec2 {
            self.city.projection.tile_to_screen(self.tile.coord(), -1)
        }

        /// Stacked levels bottom to top with their block and screen position.
        pub fn levels(&self) -> impl Iterator<Item = LevelView<'a>> + 'a {
            let city = self.city;
            let coord = self.tile.coord();
            self.tile
                .stack()
                .unwrap_or(&[])
                .iter()
                .enumerate()
                .filter_map(move |(altitude, entry)| {
                    let block = city.block(entry.block())?;
                    Some(LevelView {
                        entry: *entry,
                        block,
                        position: city.projection.tile_to_screen(coord, altitude as i32),
                    })
                })
        }
    }

    /// One stacked level as seen by a renderer.
    #[derive(Clone, Copy, Debug)]
    pub struct LevelView<'a> {
        /// Block and part occupying the level.
        pub entry: StackEntry,
        /// The occupying block.
        pub block: &'a Block,
        /// Screen origin of the part's sprite.
        pub position: IVec2,
    }

    /// Iterates every non-empty tile in row-major order.
    pub fn tiles(city: &City) -> impl Iterator<Item = TileView<'_>> {
        city.iter_tiles().map(move |tile| TileView { tile, city })
    }

    /// Topmost block on a tile, if any.
    #[must_use]
    pub fn top_block(city: &City, coord: TileCoord) -> Option<BlockId> {
        city.tile(coord).and_then(Tile::top).map(|entry| entry.block())
    }

    /// Heading an agent standing on `coord` should follow; off-field cells hold.
    #[must_use]
    pub fn heading_at(city: &City, coord: TileCoord) -> Heading {
        city.navigation.heading(coord).unwrap_or(Heading::Hold)
    }

    /// Number of blocks registered in the city.
    #[must_use]
    pub fn block_count(city: &City) -> usize {
        city.blocks.len()
    }
}
