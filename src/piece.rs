use crate::board::Board;
use crate::catalog::{PieceKind, Shape};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// The falling piece: its own copy of the shape plus the offset of the
/// shape's top-left cell on the board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub position: Position,
}

impl ActivePiece {
    /// Places `kind` at the spawn point: row 0, horizontally centered.
    pub fn spawn(kind: PieceKind, board_width: usize) -> Self {
        let shape = kind.shape();
        let x = (board_width / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            kind,
            shape,
            position: Position::new(x, 0),
        }
    }

    pub fn new_at(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            position: Position::new(x, y),
        }
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn blocks(&self) -> impl Iterator<Item = Position> + '_ {
        self.shape
            .filled_cells()
            .map(move |(dx, dy, _)| Position::new(self.position.x + dx, self.position.y + dy))
    }

    pub fn collides(&self, board: &Board) -> bool {
        board.collides(&self.shape, self.position)
    }

    fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            position: Position::new(self.position.x + dx, self.position.y + dy),
            ..self.clone()
        }
    }
}

/// The piece shifted by `(dx, dy)`, or `None` if that spot is blocked.
pub fn attempt_move(piece: &ActivePiece, board: &Board, dx: i32, dy: i32) -> Option<ActivePiece> {
    let moved = piece.moved(dx, dy);
    (!moved.collides(board)).then_some(moved)
}

/// Horizontal offsets tried after a blocked rotation: `+1, -1, +2, -2, ...`
/// up to `±bound`.
pub fn kick_offsets(bound: usize) -> impl Iterator<Item = i32> {
    (1..=bound as i32).flat_map(|magnitude| [magnitude, -magnitude])
}

/// Rotates a quarter turn, kicking sideways if the new orientation collides.
///
/// This is a simplified wall kick, not the guideline Super Rotation System:
/// there are no per-orientation kick tables, only a symmetric horizontal
/// search around the unchanged pivot, bounded by the rotated shape's width.
/// Returns `None` when no candidate fits; the input piece is never touched.
pub fn attempt_rotate(piece: &ActivePiece, board: &Board, rotation: Rotation) -> Option<ActivePiece> {
    let rotated = ActivePiece {
        shape: piece.shape.rotated(rotation),
        ..piece.clone()
    };
    if !rotated.collides(board) {
        return Some(rotated);
    }

    let bound = rotated.shape.width();
    for offset in kick_offsets(bound) {
        let kicked = rotated.moved(offset, 0);
        if !kicked.collides(board) {
            tracing::trace!(offset, "rotation kicked");
            return Some(kicked);
        }
    }
    None
}

/// Lowest collision-free position straight below the piece.
pub fn landing_position(piece: &ActivePiece, board: &Board) -> Position {
    let mut position = piece.position;
    while !board.collides(&piece.shape, Position::new(position.x, position.y + 1)) {
        position.y += 1;
    }
    position
}
