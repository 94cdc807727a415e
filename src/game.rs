use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::catalog::{Cell, PieceKind, PieceProvider, RandomPieceProvider, Shape};
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::piece::{self, ActivePiece, Position, Rotation};
use crate::powerup::{PowerUpEffect, PowerUpEngine, PowerUpKind};
use crate::progression::Progression;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesCleared(u32),
    LevelUp(u32),
    PowerUpUnlocked(PowerUpKind),
    PowerUpUsed(PowerUpEffect),
    TimeSlowEnded,
    Paused,
    Resumed,
    GameStarted,
    GameOver { final_score: u32 },
}

type GameOverHook = Box<dyn FnMut(u32)>;

// ============================================================================
// Game
// ============================================================================

/// One play session: board, falling piece, preview, progression and
/// power-ups. Every command runs to completion before the next one.
pub struct Game {
    config: GameConfig,
    board: Board,
    current_piece: ActivePiece,
    next_piece: Option<PieceKind>,
    progression: Progression,
    power_ups: PowerUpEngine,
    state: GameState,
    drop_counter_ms: u64,
    piece_provider: Box<dyn PieceProvider>,
    rng: StdRng,
    events: Vec<GameEvent>,
    on_game_over: Option<GameOverHook>,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_provider(config, Box::new(RandomPieceProvider::new()))
    }

    /// Deterministic session: pieces and power-up targets follow `seed`.
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut game = Self::with_provider(config, Box::new(RandomPieceProvider::seeded(seed)))?;
        game.rng = StdRng::seed_from_u64(seed);
        Ok(game)
    }

    pub fn with_provider(
        config: GameConfig,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Self::blank(config, provider);
        game.start_new_game();
        Ok(game)
    }

    /// Session over a prepared board with `current_piece` already falling.
    /// Used to set up exact positions; the preview comes from `provider`.
    pub fn with_board(
        config: GameConfig,
        board: Board,
        current_piece: ActivePiece,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Self::blank(config, provider);
        assert_eq!(
            (board.width(), board.height()),
            (config.board_width, config.board_height),
            "board does not match config"
        );
        game.board = board;
        game.current_piece = current_piece;
        game.next_piece = Some(game.piece_provider.next_piece());
        Ok(game)
    }

    /// Empty session; the caller installs the first piece.
    fn blank(config: GameConfig, provider: Box<dyn PieceProvider>) -> Self {
        Self {
            config,
            board: Board::new(config.board_width, config.board_height),
            current_piece: ActivePiece::spawn(PieceKind::O, config.board_width),
            next_piece: None,
            progression: Progression::new(&config),
            power_ups: PowerUpEngine::new(&config),
            state: GameState::Playing,
            drop_counter_ms: 0,
            piece_provider: provider,
            rng: StdRng::from_entropy(),
            events: Vec::new(),
            on_game_over: None,
        }
    }

    /// Registers the callback fired once with the final score when a game ends.
    pub fn on_game_over(&mut self, hook: impl FnMut(u32) + 'static) {
        self.on_game_over = Some(Box::new(hook));
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Clears all session state and spawns a fresh piece. Also cancels a
    /// running slow-down, so nothing from the previous game can fire later.
    pub fn start_new_game(&mut self) {
        self.board.reset();
        self.progression.reset();
        self.power_ups.reset();
        self.drop_counter_ms = 0;
        self.next_piece = None;
        self.events.clear();
        self.state = GameState::Playing;
        tracing::info!(
            width = self.config.board_width,
            height = self.config.board_height,
            power_ups = self.config.power_ups_enabled,
            "new game"
        );
        self.events.push(GameEvent::GameStarted);
        self.spawn_next_piece();
    }

    /// Promotes the queued preview (drawing one if none is queued), queues a
    /// new preview, and ends the game if the spawn point is blocked.
    /// Does nothing unless the game is running.
    pub fn spawn_next_piece(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        let kind = match self.next_piece.take() {
            Some(kind) => kind,
            None => self.piece_provider.next_piece(),
        };
        self.next_piece = Some(self.piece_provider.next_piece());
        self.current_piece = ActivePiece::spawn(kind, self.config.board_width);

        if self.current_piece.collides(&self.board) {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        let final_score = self.progression.score();
        self.state = GameState::GameOver;
        tracing::info!(final_score, lines = self.progression.lines(), "game over");
        self.events.push(GameEvent::GameOver { final_score });
        if let Some(hook) = self.on_game_over.as_mut() {
            hook(final_score);
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        self.state = GameState::Paused;
        self.events.push(GameEvent::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.state = GameState::Playing;
        self.events.push(GameEvent::Resumed);
        true
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => {
                self.pause();
            }
            GameState::Paused => {
                self.resume();
            }
            GameState::GameOver => {
                // Cannot pause when game is over
            }
        }
    }

    // ------------------------------------------------------------------------
    // Frame driver
    // ------------------------------------------------------------------------

    /// Feeds the time since the previous frame. While playing this runs the
    /// slow-down countdown and performs a gravity drop once the drop counter
    /// passes the current interval. Paused or finished games ignore time.
    pub fn advance(&mut self, elapsed_ms: u64) {
        if self.state != GameState::Playing {
            return;
        }
        if self.power_ups.advance(elapsed_ms) {
            tracing::debug!("time slow ended");
            self.events.push(GameEvent::TimeSlowEnded);
        }
        self.drop_counter_ms = self.drop_counter_ms.saturating_add(elapsed_ms);
        if self.drop_counter_ms > self.drop_interval_ms() {
            self.tick();
        }
    }

    /// One gravity step.
    pub fn tick(&mut self) {
        self.soft_drop();
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn move_piece(&mut self, dx: i32) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        match piece::attempt_move(&self.current_piece, &self.board, dx, 0) {
            Some(moved) => {
                self.current_piece = moved;
                self.events.push(GameEvent::PieceMoved);
                true
            }
            None => false,
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.move_piece(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.move_piece(1)
    }

    pub fn rotate_piece(&mut self, rotation: Rotation) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        match piece::attempt_rotate(&self.current_piece, &self.board, rotation) {
            Some(rotated) => {
                self.current_piece = rotated;
                self.events.push(GameEvent::PieceRotated);
                true
            }
            None => false,
        }
    }

    pub fn rotate_cw(&mut self) -> bool {
        self.rotate_piece(Rotation::Clockwise)
    }

    pub fn rotate_ccw(&mut self) -> bool {
        self.rotate_piece(Rotation::CounterClockwise)
    }

    /// Moves down one row, or locks the piece if it cannot.
    pub fn soft_drop(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.drop_counter_ms = 0;
        match piece::attempt_move(&self.current_piece, &self.board, 0, 1) {
            Some(moved) => self.current_piece = moved,
            None => self.lock_and_spawn(),
        }
    }

    /// Drops straight to the lowest free position and locks there.
    pub fn hard_drop(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.drop_counter_ms = 0;
        self.current_piece.position = piece::landing_position(&self.current_piece, &self.board);
        self.lock_and_spawn();
    }

    /// Merge, sweep, score, unlock, spawn: one step as far as callers can see.
    fn lock_and_spawn(&mut self) {
        self.board
            .merge(&self.current_piece.shape, self.current_piece.position);
        tracing::debug!(
            piece = ?self.current_piece.kind,
            x = self.current_piece.position.x,
            y = self.current_piece.position.y,
            "piece locked"
        );
        self.events.push(GameEvent::PieceLocked);

        let lines = self.board.sweep_completed_rows();
        if lines > 0 {
            self.add_score(lines);
        }
        self.spawn_next_piece();
    }

    /// Credits a sweep of `lines` rows and unlocks any power-ups the new
    /// score reaches. Does nothing unless the game is running.
    pub fn add_score(&mut self, lines: u32) {
        if self.state != GameState::Playing {
            return;
        }
        let outcome = self
            .progression
            .record_clear(lines, self.power_ups.score_multiplier());
        tracing::debug!(lines, points = outcome.points, "lines cleared");
        self.events.push(GameEvent::LinesCleared(lines));

        if let Some(level) = outcome.level_up {
            tracing::info!(level, interval_ms = self.progression.drop_interval_ms(), "level up");
            self.events.push(GameEvent::LevelUp(level));
        }

        for kind in self.power_ups.check_unlocks(self.progression.score()) {
            tracing::info!(power_up = kind.name(), "power-up unlocked");
            self.events.push(GameEvent::PowerUpUnlocked(kind));
        }
    }

    /// Uses an available power-up. Unavailable ones are a silent no-op.
    pub fn activate_power_up(&mut self, kind: PowerUpKind) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        match self.power_ups.activate(kind, &mut self.board, &mut self.rng) {
            Some(effect) => {
                tracing::info!(?effect, "power-up used");
                self.events.push(GameEvent::PowerUpUsed(effect));
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Locked cells only, without the falling piece.
    pub fn board_snapshot(&self) -> Vec<Vec<Cell>> {
        self.board.rows().to_vec()
    }

    pub fn active_piece(&self) -> &ActivePiece {
        &self.current_piece
    }

    pub fn preview_piece(&self) -> Option<Shape> {
        self.next_piece.map(PieceKind::shape)
    }

    pub fn next_kind(&self) -> Option<PieceKind> {
        self.next_piece
    }

    pub fn score(&self) -> u32 {
        self.progression.score()
    }

    pub fn level(&self) -> u32 {
        self.progression.level()
    }

    pub fn lines(&self) -> u32 {
        self.progression.lines()
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn active_power_ups(&self) -> Vec<PowerUpKind> {
        self.power_ups.active()
    }

    pub fn power_ups(&self) -> &PowerUpEngine {
        &self.power_ups
    }

    /// Interval the frame driver currently waits between gravity drops.
    pub fn drop_interval_ms(&self) -> u64 {
        self.power_ups
            .effective_interval(self.progression.drop_interval_ms())
    }

    /// Returns the visual grid state with the current piece overlaid
    pub fn render_grid(&self) -> Vec<Vec<Cell>> {
        let mut visual_grid = self.board_snapshot();
        let (width, height) = (self.board.width() as i32, self.board.height() as i32);

        for (dx, dy, id) in self.current_piece.shape.filled_cells() {
            let Position { x, y } = self.current_piece.position;
            let (x, y) = (x + dx, y + dy);
            if x >= 0 && x < width && y >= 0 && y < height {
                visual_grid[y as usize][x as usize] = id;
            }
        }

        visual_grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::catalog::SequencePieceProvider;

    pub fn empty_board(config: &GameConfig) -> Board {
        Board::new(config.board_width, config.board_height)
    }

    pub fn fill_row(board: &mut Board, y: usize) {
        for x in 0..board.width() {
            board.set(x, y, PieceKind::T.id());
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: usize, gap_x: usize) {
        for x in 0..board.width() {
            if x != gap_x {
                board.set(x, y, PieceKind::T.id());
            }
        }
    }

    pub fn sequence(pieces: &[PieceKind]) -> Box<dyn PieceProvider> {
        Box::new(SequencePieceProvider::new(pieces.to_vec()))
    }

    /// Session on `board` with `piece` falling and O pieces queued behind it.
    pub fn game_with(config: GameConfig, board: Board, piece: ActivePiece) -> Game {
        Game::with_board(config, board, piece, sequence(&[PieceKind::O]))
            .expect("test config is valid")
    }
}
