//! Isometric mapping between tile space and screen space.

use glam::{IVec2, UVec2, Vec2};

use crate::TileCoord;

/// Horizontal screen advance for one step along the row axis.
pub const STEP_X: i32 = 16;
/// Horizontal screen advance for one step along the column axis.
pub const STEP_Y: i32 = 14;
/// Vertical screen rise for one level of altitude.
pub const BLOCK_HEIGHT: i32 = 8;
/// Offset from a block sprite's origin to the centre of its top face.
pub const SPRITE_CENTER: i32 = 8;

/// Affine projection from `(column, row, altitude)` to screen pixels.
///
/// The projection carries the per-grid translation chosen when the city is
/// loaded so the grid's extremes sit centred in the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Projection {
    offset: IVec2,
}

impl Projection {
    /// Creates a projection with an explicit screen translation.
    #[must_use]
    pub const fn from_offset(offset: IVec2) -> Self {
        Self { offset }
    }

    /// Creates a projection that centres a `columns` by `rows` grid in the viewport.
    ///
    /// `y_offset_base` shifts the whole grid downward, leaving headroom for
    /// tall stacks above the ground plane.
    #[must_use]
    pub fn centered(columns: u32, rows: u32, viewport: UVec2, y_offset_base: i32) -> Self {
        let last_column = i32::try_from(columns.saturating_sub(1)).unwrap_or(i32::MAX);
        let last_row = i32::try_from(rows.saturating_sub(1)).unwrap_or(i32::MAX);
        let corners = [
            TileCoord::new(0, 0),
            TileCoord::new(0, last_row),
            TileCoord::new(last_column, 0),
            TileCoord::new(last_column, last_row),
        ];

        let mut min = IVec2::splat(i32::MAX);
        let mut max = IVec2::splat(i32::MIN);
        for corner in corners {
            let point = Self::base_tile_to_screen(corner, -1);
            min = min.min(point);
            max = max.max(point);
        }

        let width = i32::try_from(viewport.x).unwrap_or(i32::MAX);
        let height = i32::try_from(viewport.y).unwrap_or(i32::MAX);
        let x = (width - max.x + min.x).div_euclid(2) - min.x - 12;
        let y = y_offset_base + (height - max.y + min.y).div_euclid(2) - min.y - 8;
        Self::from_offset(IVec2::new(x, y))
    }

    /// Screen translation applied after the untranslated projection.
    #[must_use]
    pub const fn offset(&self) -> IVec2 {
        self.offset
    }

    /// Projects a tile at `altitude` without the per-grid translation.
    #[must_use]
    pub fn base_tile_to_screen(tile: TileCoord, altitude: i32) -> IVec2 {
        let column = tile.column();
        let row = tile.row();
        let x = row * STEP_X - column * STEP_Y;
        let y = (row * STEP_X).div_euclid(2) + (column * STEP_Y).div_euclid(2)
            - altitude * BLOCK_HEIGHT;
        IVec2::new(x, y)
    }

    /// Projects a tile at `altitude` to the screen origin of its sprite.
    #[must_use]
    pub fn tile_to_screen(&self, tile: TileCoord, altitude: i32) -> IVec2 {
        Self::base_tile_to_screen(tile, altitude) + self.offset
    }

    /// Centre of the sprite drawn for a tile at `altitude`.
    ///
    /// Spatial queries measure distances from this point.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord, altitude: i32) -> Vec2 {
        (self.tile_to_screen(tile, altitude) + IVec2::splat(SPRITE_CENTER)).as_vec2()
    }

    /// Maps a screen point back onto the ground-plane tile beneath it.
    ///
    /// Altitude is ignored, so points near tall stacks resolve to the tile
    /// under the stack's footprint only approximately.
    #[must_use]
    pub fn screen_to_tile(&self, point: Vec2) -> TileCoord {
        let tx = point.x - (self.offset.x + SPRITE_CENTER) as f32;
        let t2y = 2.0 * (point.y - (self.offset.y + SPRITE_CENTER) as f32);
        let column = (((t2y - tx) / 2.0).floor() / STEP_Y as f32).floor();
        let row = (((t2y + tx) / 2.0).floor() / STEP_X as f32).floor();
        TileCoord::new(column as i32, row as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_projection_matches_isometric_steps() {
        assert_eq!(
            Projection::base_tile_to_screen(TileCoord::new(0, 0), 0),
            IVec2::ZERO
        );
        assert_eq!(
            Projection::base_tile_to_screen(TileCoord::new(1, 0), 0),
            IVec2::new(-14, 7)
        );
        assert_eq!(
            Projection::base_tile_to_screen(TileCoord::new(0, 1), 2),
            IVec2::new(16, 8 - 16)
        );
    }

    #[test]
    fn centered_projection_for_default_window() {
        let projection = Projection::centered(16, 16, UVec2::new(240, 320), 80);
        // Corners at altitude -1 span x in [-210, 240] and y in [8, 233].
        assert_eq!(projection.offset(), IVec2::new(93, 111));
    }

    #[test]
    fn screen_to_tile_inverts_ground_projection() {
        let projection = Projection::centered(16, 16, UVec2::new(240, 320), 80);
        for column in -2..18 {
            for row in -2..18 {
                let tile = TileCoord::new(column, row);
                let centre = projection.tile_center(tile, 0);
                assert_eq!(projection.screen_to_tile(centre), tile);
            }
        }
    }

    #[test]
    fn screen_to_tile_floors_towards_negative_infinity() {
        let projection = Projection::default();
        let tile = projection.screen_to_tile(Vec2::new(8.0, 7.0));
        assert_eq!(tile, TileCoord::new(-1, -1));
    }
}
