//! Static navigation field built from the layout's goal and obstacle markers.

use std::collections::VecDeque;

use skyline_core::{Heading, NavigationRole, TileCoord};

use crate::Layout;

/// Distance recorded for cells with no route to a goal.
pub const UNREACHABLE: u16 = u16::MAX;

/// Distances at or beyond this horizon are treated as unreachable.
pub const DISTANCE_HORIZON: u16 = 100;

/// Dense distance-to-goal grid with the greedy heading derived from it.
///
/// The field is built once from the static layout and never observes blocks
/// stacked during play. Cells are stored in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
    headings: Vec<Heading>,
}

impl NavigationField {
    /// Builds the field for a layout: special lots are goals, ordinary lots block.
    #[must_use]
    pub fn from_layout(layout: &Layout) -> Self {
        let goals: Vec<TileCoord> = layout
            .iter()
            .filter(|(_, kind)| kind.navigation_role() == NavigationRole::Goal)
            .map(|(coord, _)| coord)
            .collect();
        Self::build(layout.columns(), layout.rows(), &goals, |coord| {
            layout
                .kind(coord)
                .is_some_and(|kind| kind.navigation_role() == NavigationRole::Blocked)
        })
    }

    /// Builds the field with a multi-source breadth-first search from `goals`.
    #[must_use]
    pub fn build<F>(width: u32, height: u32, goals: &[TileCoord], mut is_blocked: F) -> Self
    where
        F: FnMut(TileCoord) -> bool,
    {
        let cell_count = (width as usize).checked_mul(height as usize).unwrap_or(0);
        let mut field = Self {
            width,
            height,
            distances: vec![UNREACHABLE; cell_count],
            headings: vec![Heading::Hold; cell_count],
        };
        if cell_count == 0 {
            return field;
        }

        let mut queue = VecDeque::new();
        for &goal in goals {
            if is_blocked(goal) {
                continue;
            }
            let Some(index) = field.index(goal) else {
                continue;
            };
            if field.distances[index] == 0 {
                continue;
            }
            field.distances[index] = 0;
            queue.push_back(goal);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = field.index(cell) else {
                continue;
            };
            let next_distance = field.distances[current_index] + 1;
            if next_distance >= DISTANCE_HORIZON {
                continue;
            }

            for heading in &Heading::CHECK_ORDER[1..] {
                let neighbor = heading.step(cell);
                let Some(neighbor_index) = field.index(neighbor) else {
                    continue;
                };
                if field.distances[neighbor_index] <= next_distance || is_blocked(neighbor) {
                    continue;
                }
                field.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }

        field.derive_headings();
        field
    }

    fn derive_headings(&mut self) {
        for index in 0..self.distances.len() {
            let own = self.distances[index];
            if own == UNREACHABLE {
                continue;
            }

            let cell = self.coord(index);
            let mut best = own;
            let mut best_heading = Heading::Hold;
            for heading in &Heading::CHECK_ORDER[1..] {
                let distance = self.distance(heading.step(cell)).unwrap_or(UNREACHABLE);
                if distance < best {
                    best = distance;
                    best_heading = *heading;
                }
            }
            self.headings[index] = best_heading;
        }
    }

    /// Width of the field in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn distances(&self) -> &[u16] {
        &self.distances
    }

    /// Distance recorded for the cell, or `None` when it lies outside the field.
    ///
    /// Unreachable cells report [`UNREACHABLE`].
    #[must_use]
    pub fn distance(&self, cell: TileCoord) -> Option<u16> {
        self.index(cell).map(|index| self.distances[index])
    }

    /// Heading recorded for the cell, or `None` when it lies outside the field.
    #[must_use]
    pub fn heading(&self, cell: TileCoord) -> Option<Heading> {
        self.index(cell).map(|index| self.headings[index])
    }

    /// Reports whether a goal can be reached from the cell.
    #[must_use]
    pub fn is_reachable(&self, cell: TileCoord) -> bool {
        self.distance(cell).is_some_and(|distance| distance != UNREACHABLE)
    }

    fn index(&self, cell: TileCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }

    fn coord(&self, index: usize) -> TileCoord {
        let width = self.width.max(1) as usize;
        TileCoord::new((index % width) as i32, (index / width) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_sets_goal_cells_to_zero() {
        let goals = [TileCoord::new(1, 2)];
        let field = NavigationField::build(3, 4, &goals, |_| false);

        assert_eq!(field.distance(TileCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(TileCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(TileCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(TileCoord::new(0, 0)), Some(3));
        assert_eq!(field.heading(TileCoord::new(1, 2)), Some(Heading::Hold));
        assert_eq!(field.heading(TileCoord::new(1, 0)), Some(Heading::NextRow));
    }

    #[test]
    fn build_respects_walls() {
        let goals = [TileCoord::new(1, 2)];
        let wall = TileCoord::new(1, 1);
        let field = NavigationField::build(3, 4, &goals, |cell| cell == wall);

        assert_eq!(field.distance(wall), Some(UNREACHABLE));
        assert_eq!(field.heading(wall), Some(Heading::Hold));
        assert_eq!(field.distance(TileCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(TileCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn ties_prefer_earlier_check_order() {
        // Goals on both column neighbours: the previous column wins.
        let goals = [TileCoord::new(0, 0), TileCoord::new(2, 0)];
        let field = NavigationField::build(3, 1, &goals, |_| false);
        assert_eq!(
            field.heading(TileCoord::new(1, 0)),
            Some(Heading::PreviousColumn)
        );
    }

    #[test]
    fn distances_beyond_horizon_are_unreachable() {
        let goals = [TileCoord::new(0, 0)];
        let field = NavigationField::build(120, 1, &goals, |_| false);
        assert_eq!(field.distance(TileCoord::new(99, 0)), Some(99));
        assert_eq!(field.distance(TileCoord::new(100, 0)), Some(UNREACHABLE));
        assert_eq!(field.heading(TileCoord::new(100, 0)), Some(Heading::Hold));
        assert_eq!(
            field.heading(TileCoord::new(99, 0)),
            Some(Heading::PreviousColumn)
        );
    }

    #[test]
    fn outside_cells_have_no_heading() {
        let field = NavigationField::build(2, 2, &[TileCoord::new(0, 0)], |_| false);
        assert_eq!(field.heading(TileCoord::new(2, 0)), None);
        assert_eq!(field.distance(TileCoord::new(0, -1)), None);
    }
}
