use crate::catalog::{Cell, Shape, EMPTY};
use crate::piece::Position;

/// Locked cells, stored row-major with row 0 at the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![EMPTY; width]; height],
        }
    }

    /// Builds a board from explicit rows. All rows must share one width.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        assert!(rows.iter().all(|row| row.len() == width), "ragged board rows");
        Self {
            width,
            height: rows.len(),
            rows,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.rows[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y][x] = cell;
    }

    /// Anything outside the grid counts as occupied, so walls, floor and
    /// ceiling collide exactly like locked cells.
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return true;
        }
        self.rows[y as usize][x as usize] != EMPTY
    }

    pub fn collides(&self, shape: &Shape, position: Position) -> bool {
        shape
            .filled_cells()
            .any(|(dx, dy, _)| self.is_occupied(position.x + dx, position.y + dy))
    }

    /// Writes the shape's nonzero cells at `position`.
    ///
    /// The caller must have checked [`Board::collides`] first; overlapping
    /// cells are overwritten and out-of-range cells are skipped.
    pub fn merge(&mut self, shape: &Shape, position: Position) {
        for (dx, dy, id) in shape.filled_cells() {
            let (x, y) = (position.x + dx, position.y + dy);
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.rows[y as usize][x as usize] = id;
            }
        }
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.rows[y].iter().all(|&cell| cell != EMPTY)
    }

    /// Removes every complete row, bottom to top, inserting an empty row at
    /// the top for each one. Returns how many rows were removed.
    pub fn sweep_completed_rows(&mut self) -> u32 {
        let mut cleared = 0;
        if self.width == 0 {
            return cleared;
        }
        let mut y = self.height;

        while y > 0 {
            if self.is_row_complete(y - 1) {
                let mut row = self.rows.remove(y - 1);
                row.fill(EMPTY);
                self.rows.insert(0, row);
                cleared += 1;
                // Re-check the same index: the row above has shifted into it.
            } else {
                y -= 1;
            }
        }

        cleared
    }

    pub fn clear_row(&mut self, y: usize) {
        self.rows[y].fill(EMPTY);
    }

    pub fn clear_column(&mut self, x: usize) {
        for row in &mut self.rows {
            row[x] = EMPTY;
        }
    }

    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.fill(EMPTY);
        }
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|&&cell| cell != EMPTY).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|&&cell| cell != EMPTY).count()
    }
}
