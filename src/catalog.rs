use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::piece::Rotation;

/// Board and shape cell value: `0` is empty, anything else is a piece id.
pub type Cell = u8;
pub const EMPTY: Cell = 0;

/// Side length of the largest template; boards smaller than this are rejected.
pub const MAX_SHAPE_SIZE: usize = 4;

// ============================================================================
// Colors
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

// ============================================================================
// Piece kinds
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn from_id(id: Cell) -> Option<Self> {
        match id {
            1..=7 => Some(Self::ALL[id as usize - 1]),
            _ => None,
        }
    }

    /// Identifier written into board cells; always in `1..=7`.
    pub fn id(self) -> Cell {
        self as Cell + 1
    }

    pub fn color(self) -> Rgb {
        match self {
            PieceKind::I => Rgb(0xFF, 0x0D, 0x72),
            PieceKind::J => Rgb(0x0D, 0xC2, 0xFF),
            PieceKind::L => Rgb(0x0D, 0xFF, 0x72),
            PieceKind::O => Rgb(0xF5, 0x38, 0xFF),
            PieceKind::S => Rgb(0xFF, 0x8E, 0x0D),
            PieceKind::T => Rgb(0xFF, 0xE1, 0x38),
            PieceKind::Z => Rgb(0x38, 0x77, 0xFF),
        }
    }

    /// Template in spawn orientation. Every template is square so that
    /// transpose-and-reverse rotates it in place.
    fn template(self) -> &'static [&'static [u8]] {
        match self {
            PieceKind::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            PieceKind::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        }
    }

    /// Fresh, independently owned copy of this piece's shape.
    pub fn shape(self) -> Shape {
        let id = self.id();
        Shape::from_rows(
            self.template()
                .iter()
                .map(|row| row.iter().map(|&bit| if bit != 0 { id } else { EMPTY }).collect())
                .collect(),
        )
    }
}

pub fn piece_count() -> usize {
    PieceKind::ALL.len()
}

pub fn shape_of(index: usize) -> Shape {
    PieceKind::from_index(index).shape()
}

/// `None` for the empty cell and for ids outside the catalog.
pub fn color_of(id: Cell) -> Option<Rgb> {
    PieceKind::from_id(id).map(PieceKind::color)
}

// ============================================================================
// Shape
// ============================================================================

/// Row-major matrix of cells; `rows[y][x]`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Shape {
    rows: Vec<Vec<Cell>>,
}

impl Shape {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The id carried by the first occupied cell, or `EMPTY` for a blank shape.
    pub fn id(&self) -> Cell {
        self.filled_cells().next().map_or(EMPTY, |(_, _, id)| id)
    }

    /// `(x, y, id)` for every nonzero cell, relative to the top-left corner.
    pub fn filled_cells(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &cell)| cell != EMPTY)
                .map(move |(x, &cell)| (x as i32, y as i32, cell))
        })
    }

    /// Quarter turn: transpose, then reverse each row (clockwise) or the
    /// row order (counter-clockwise).
    pub fn rotated(&self, rotation: Rotation) -> Shape {
        let height = self.height();
        let width = self.width();
        let mut rows = vec![vec![EMPTY; height]; width];
        for (y, row) in self.rows.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                rows[x][y] = cell;
            }
        }
        match rotation {
            Rotation::Clockwise => rows.iter_mut().for_each(|row| row.reverse()),
            Rotation::CounterClockwise => rows.reverse(),
        }
        Shape { rows }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> PieceKind;
}

/// Uniform draw over the catalog.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        PieceKind::from_index(self.rng.gen_range(0..piece_count()))
    }
}

/// Cycles through a fixed list forever.
pub struct SequencePieceProvider {
    pieces: Vec<PieceKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<PieceKind>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}
