//! Character grid for diagram analysis.
//!
//! The grid is ragged: each row keeps its own length. Cells outside a row
//! read as `None`, which is different from a space.

use std::fmt;

use log::trace;

use crate::chars::{is_corner, is_edge, is_marker, is_tick};
use crate::path::Path;

/// A mutable 2D grid of characters, origin top-left.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<char>>,
    /// Corners left in place by erasure, blanked by [`Grid::clear_deferred`].
    deferred: Vec<(i32, i32)>,
}

impl Grid {
    pub fn new(text: &str) -> Self {
        let rows = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).chars().collect())
            .collect();
        Self {
            rows,
            deferred: Vec::new(),
        }
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Length of one row, zero when out of range
    pub fn row_len(&self, row: i32) -> usize {
        self.row(row).map_or(0, Vec::len)
    }

    fn row(&self, row: i32) -> Option<&Vec<char>> {
        usize::try_from(row).ok().and_then(|r| self.rows.get(r))
    }

    /// Character at (row, col), `None` when off the grid.
    pub fn get(&self, row: i32, col: i32) -> Option<char> {
        let col = usize::try_from(col).ok()?;
        self.row(row).and_then(|r| r.get(col)).copied()
    }

    /// Overwrite a cell. Writes outside the grid are ignored.
    pub fn set(&mut self, row: i32, col: i32, c: char) {
        let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
            return;
        };
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = c;
        }
    }

    /// Queue a cell to be blanked once all paths are found.
    pub fn defer_clear(&mut self, row: i32, col: i32) {
        self.deferred.push((row, col));
    }

    pub fn deferred(&self) -> &[(i32, i32)] {
        &self.deferred
    }

    /// Blank every deferred cell.
    pub fn clear_deferred(&mut self) {
        for (row, col) in std::mem::take(&mut self.deferred) {
            self.set(row, col, ' ');
        }
    }

    /// Remove a path's glyphs from the grid.
    ///
    /// Edges and markers are blanked, corners are deferred because lines may
    /// still start from them, and ticks become `+` junctions.
    pub fn erase(&mut self, path: &Path) {
        let points = path.points();
        let closed = path.is_closed();

        for (i, p) in points.iter().enumerate() {
            let next = if i + 1 < points.len() {
                &points[i + 1]
            } else if closed {
                &points[0]
            } else {
                break;
            };

            if p.col == next.col {
                let (lo, hi) = (p.row.min(next.row), p.row.max(next.row));
                for row in lo..=hi {
                    self.erase_cell(row, p.col);
                }
            } else if p.row == next.row {
                let (lo, hi) = (p.col.min(next.col), p.col.max(next.col));
                for col in lo..=hi {
                    self.erase_cell(p.row, col);
                }
            } else {
                let (start, end) = if p.col <= next.col { (p, next) } else { (next, p) };
                let step = if start.row > end.row { -1 } else { 1 };
                let (mut row, mut col) = (start.row, start.col);
                for _ in 0..=(end.col - start.col) {
                    let c = self.get(row, col);
                    if matches!(c, Some('/' | '\\')) {
                        self.set(row, col, ' ');
                    } else {
                        self.erase_cell(row, col);
                    }
                    row += step;
                    col += 1;
                }
                trace!("erased diagonal from {},{}", start.row, start.col);
                // an open line erases one diagonal run, then stops
                if !closed {
                    self.set(start.row, start.col, ' ');
                    break;
                }
            }
        }
    }

    fn erase_cell(&mut self, row: i32, col: i32) {
        let c = self.get(row, col);
        if is_tick(c) {
            self.set(row, col, '+');
            self.defer_clear(row, col);
        } else if is_edge(c, None) || is_marker(c) {
            self.set(row, col, ' ');
        } else if is_corner(c) {
            self.defer_clear(row, col);
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for c in row {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PointFlags;

    #[test]
    fn test_ragged_rows() {
        let grid = Grid::new("abc\nd\r\nefgh");
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.get(1, 0), Some('d'));
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(0, -1), None);
        assert_eq!(grid.row_len(2), 4);
    }

    #[test]
    fn test_set_out_of_bounds_is_ignored() {
        let mut grid = Grid::new("ab");
        grid.set(0, 5, 'x');
        grid.set(-1, 0, 'x');
        grid.set(0, 1, 'z');
        assert_eq!(grid.to_string(), "az");
    }

    #[test]
    fn test_erase_box_defers_corners() {
        let mut grid = Grid::new("+--+\n|ab|\n+--+");
        let mut path = Path::new();
        path.add_point(0, 0, PointFlags::vertex());
        path.add_point(0, 3, PointFlags::vertex());
        path.add_point(2, 3, PointFlags::vertex());
        path.add_point(2, 0, PointFlags::vertex());
        path.add_point(0, 0, PointFlags::vertex());

        grid.erase(&path);
        assert_eq!(grid.to_string(), "+  +\n ab \n+  +");
        assert_eq!(grid.deferred().len(), 8);

        grid.clear_deferred();
        assert_eq!(grid.to_string(), "    \n ab \n    ");
    }

    #[test]
    fn test_erase_tick_becomes_junction() {
        let mut grid = Grid::new("--o--");
        let mut path = Path::new();
        path.add_point(0, 0, PointFlags::vertex());
        path.add_point(0, 4, PointFlags::vertex());
        grid.erase(&path);
        assert_eq!(grid.to_string(), "  +  ");
        grid.clear_deferred();
        assert_eq!(grid.to_string(), "     ");
    }

    #[test]
    fn test_erase_diagonal() {
        let mut grid = Grid::new("  ^\n /\n/");
        let mut path = Path::new();
        path.add_point(2, 0, PointFlags::vertex());
        path.add_point(0, 2, PointFlags::end_marker());
        grid.erase(&path);
        assert_eq!(grid.to_string(), "   \n  \n ");
    }

    #[test]
    fn test_erase_stops_after_one_diagonal() {
        let mut grid = Grid::new("       +---\n      /\n     /");
        let mut path = Path::new();
        path.add_point(2, 5, PointFlags::vertex());
        path.add_point(0, 7, PointFlags::vertex());
        path.add_point(0, 10, PointFlags::vertex());
        grid.erase(&path);
        assert_eq!(grid.to_string(), "       +---\n       \n      ");
        assert_eq!(grid.deferred(), &[(0, 7)]);
        grid.clear_deferred();
        assert_eq!(grid.to_string(), "        ---\n       \n      ");
    }
}
