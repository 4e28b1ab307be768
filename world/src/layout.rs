//! Static tile-kind layouts parsed from text maps.

use std::fmt;

use skyline_core::{TileCoord, TileKind};

use crate::LayoutError;

/// Dense, row-major grid of tile kinds describing a city before play begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    columns: u32,
    rows: u32,
    cells: Vec<TileKind>,
}

impl Layout {
    /// Parses a text map with one line per row.
    ///
    /// Blank lines and surrounding whitespace are ignored. Every remaining row
    /// must contain the same number of symbols.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut columns = None;
        let mut rows = 0_u32;
        let mut cells = Vec::new();

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let mut width = 0_u32;
            for symbol in line.chars() {
                let kind = TileKind::from_symbol(symbol).ok_or(LayoutError::UnknownSymbol {
                    symbol,
                    column: width,
                    row: rows,
                })?;
                cells.push(kind);
                width += 1;
            }

            match columns {
                None => columns = Some(width),
                Some(expected) if expected != width => {
                    return Err(LayoutError::RaggedRow {
                        row: rows,
                        expected,
                        found: width,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }

        let columns = columns.ok_or(LayoutError::Empty)?;
        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Builds a layout directly from row-major tile kinds.
    pub fn from_cells(columns: u32, rows: u32, cells: Vec<TileKind>) -> Result<Self, LayoutError> {
        if columns == 0 || rows == 0 {
            return Err(LayoutError::Empty);
        }
        let expected = u64::from(columns) * u64::from(rows);
        if cells.len() as u64 != expected {
            return Err(LayoutError::CellCount {
                expected,
                found: cells.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Extracts a fixed-size window from a larger addressable map.
    ///
    /// The returned layout is re-addressed so that `origin` becomes `(0, 0)`.
    pub fn window(&self, origin: TileCoord, columns: u32, rows: u32) -> Result<Self, LayoutError> {
        let out_of_range = LayoutError::WindowOutOfRange {
            origin,
            columns,
            rows,
        };
        let (Ok(left), Ok(top)) = (u32::try_from(origin.column()), u32::try_from(origin.row()))
        else {
            return Err(out_of_range);
        };
        let fits_columns = left.checked_add(columns).is_some_and(|end| end <= self.columns);
        let fits_rows = top.checked_add(rows).is_some_and(|end| end <= self.rows);
        if !fits_columns || !fits_rows {
            return Err(out_of_range);
        }

        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                let source = TileCoord::new((left + column) as i32, (top + row) as i32);
                cells.push(self.kind(source).unwrap_or(TileKind::Empty));
            }
        }
        Self::from_cells(columns, rows, cells)
    }

    /// Number of columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile kind at the provided coordinate, if it lies inside the layout.
    #[must_use]
    pub fn kind(&self, coord: TileCoord) -> Option<TileKind> {
        self.index(coord).and_then(|index| self.cells.get(index).copied())
    }

    /// Iterates over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, TileKind)> + '_ {
        let columns = self.columns.max(1) as usize;
        self.cells.iter().enumerate().map(move |(index, kind)| {
            let coord = TileCoord::new((index % columns) as i32, (index / columns) as i32);
            (coord, *kind)
        })
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

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.columns.max(1) as usize) {
            let line: String = row.iter().map(|kind| kind.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
