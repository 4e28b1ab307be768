#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skyline engine.
//!
//! This crate defines the vocabulary that connects the authoritative city
//! state, the pure systems that query it, and the adapters that present it.
//! The world owns tiles and block stacks addressed by [`TileCoord`], systems
//! resolve player intents into mutations and report the outcome through
//! [`Event`] values, and presentation layers translate between grid space and
//! screen space through the isometric [`Projection`].

use serde::{Deserialize, Serialize};

mod projection;

pub use projection::{Projection, BLOCK_HEIGHT, SPRITE_CENTER, STEP_X, STEP_Y};

/// Abstract outcome signals emitted after processing a player action.
///
/// Events carry no payload; presentation layers map them onto audio or UI cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// A carried block was set down in the city or returned to staging.
    Placed,
    /// A drop was attempted but no valid spot was in reach.
    FailedPlace,
    /// A block was lifted from the city or from staging.
    PickedUp,
    /// A pick-up targeted a block that could not be lifted.
    FailedPickup,
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Coordinates are signed so that footprint offsets and hit-testing near the
/// grid edge can express positions outside the grid without wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self {
            column: self.column + columns,
            row: self.row + rows,
        }
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Foundation placed under a tile by the static layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Off-map cell with no foundation.
    Empty,
    /// Ordinary building lot.
    Buildable,
    /// Landmark lot seeded with a fixed-height tower; also a navigation goal.
    Special,
    /// Road running along the row axis.
    RoadHorizontal,
    /// Road running along the column axis.
    RoadVertical,
}

impl TileKind {
    /// Every tile kind in symbol table order.
    pub const ALL: [TileKind; 5] = [
        TileKind::Empty,
        TileKind::Buildable,
        TileKind::Special,
        TileKind::RoadHorizontal,
        TileKind::RoadVertical,
    ];

    /// Layout symbol used to describe the tile kind in text maps.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Buildable => '#',
            Self::Special => '*',
            Self::RoadHorizontal => '-',
            Self::RoadVertical => '|',
        }
    }

    /// Resolves a layout symbol into the tile kind it denotes.
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.symbol() == symbol)
    }

    /// Reports whether blocks may ever be stacked on this foundation.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Buildable | Self::Special)
    }

    /// Role the tile plays when the navigation field is derived from the layout.
    #[must_use]
    pub const fn navigation_role(self) -> NavigationRole {
        match self {
            Self::Special => NavigationRole::Goal,
            Self::Buildable => NavigationRole::Blocked,
            Self::Empty | Self::RoadHorizontal | Self::RoadVertical => NavigationRole::Open,
        }
    }
}

/// Classification of a static cell for navigation purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationRole {
    /// Agents are drawn toward these cells; distance zero.
    Goal,
    /// Agents can never enter these cells.
    Blocked,
    /// Traversable cell.
    Open,
}

/// One occupied cell of a block footprint, relative to the block anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FootprintPart {
    column: i32,
    row: i32,
    altitude: i32,
}

impl FootprintPart {
    /// Part occupying the anchor cell itself.
    pub const ANCHOR: FootprintPart = FootprintPart::new(0, 0, 0);

    /// Creates a footprint part offset from the anchor.
    #[must_use]
    pub const fn new(column: i32, row: i32, altitude: i32) -> Self {
        Self {
            column,
            row,
            altitude,
        }
    }

    /// Column offset from the anchor tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row offset from the anchor tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Altitude offset from the block's base altitude.
    #[must_use]
    pub const fn altitude(&self) -> i32 {
        self.altitude
    }

    /// Tile occupied by this part when the block is anchored at `anchor`.
    #[must_use]
    pub const fn tile_from(&self, anchor: TileCoord) -> TileCoord {
        anchor.offset(self.column, self.row)
    }

    /// Altitude occupied by this part when the block rests at `base_altitude`.
    ///
    /// Returns `None` when the part would sit below the ground.
    #[must_use]
    pub fn altitude_from(&self, base_altitude: u32) -> Option<u32> {
        base_altitude.checked_add_signed(self.altitude)
    }
}

/// Unique identifier assigned to a block registered in the city.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Single-step direction stored in the navigation field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Remain in place: the cell is a goal or has no route to one.
    Hold,
    /// Step toward the previous column.
    PreviousColumn,
    /// Step toward the next column.
    NextColumn,
    /// Step toward the previous row.
    PreviousRow,
    /// Step toward the next row.
    NextRow,
}

impl Heading {
    /// Order in which candidate headings are compared; the first minimum wins.
    pub const CHECK_ORDER: [Heading; 5] = [
        Heading::Hold,
        Heading::PreviousColumn,
        Heading::NextColumn,
        Heading::PreviousRow,
        Heading::NextRow,
    ];

    /// Column and row delta described by the heading.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Hold => (0, 0),
            Self::PreviousColumn => (-1, 0),
            Self::NextColumn => (1, 0),
            Self::PreviousRow => (0, -1),
            Self::NextRow => (0, 1),
        }
    }

    /// Tile reached by following the heading from `from`.
    #[must_use]
    pub const fn step(self, from: TileCoord) -> TileCoord {
        let (columns, rows) = self.offset();
        from.offset(columns, rows)
    }
}
