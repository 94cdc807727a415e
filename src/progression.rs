use crate::config::GameConfig;

// Scoring, indexed by rows cleared in one sweep
pub const SCORE_SINGLE: u32 = 40;
pub const SCORE_DOUBLE: u32 = 100;
pub const SCORE_TRIPLE: u32 = 300;
pub const SCORE_TETRIS: u32 = 1200;

/// Base points for a single sweep, before the level multiplier.
/// Sweeps of more than four rows pay the same as four.
pub fn line_reward(lines: u32) -> u32 {
    match lines {
        0 => 0,
        1 => SCORE_SINGLE,
        2 => SCORE_DOUBLE,
        3 => SCORE_TRIPLE,
        _ => SCORE_TETRIS,
    }
}

pub fn level_for_lines(total_lines: u32, lines_per_level: u32) -> u32 {
    total_lines / lines_per_level + 1
}

/// `initial - increment * (level - 1)`, never below `minimum`.
pub fn drop_interval_for_level(level: u32, config: &GameConfig) -> u64 {
    let reduction = config
        .level_speed_increment_ms
        .saturating_mul(u64::from(level.saturating_sub(1)));
    config
        .initial_drop_interval_ms
        .saturating_sub(reduction)
        .max(config.minimum_drop_interval_ms)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ClearOutcome {
    pub points: u32,
    /// The new level, if this clear raised it.
    pub level_up: Option<u32>,
}

/// Score, level, lines and the speed that follows from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    score: u32,
    level: u32,
    lines: u32,
    drop_interval_ms: u64,
    config: GameConfig,
}

impl Progression {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            level: 1,
            lines: 0,
            drop_interval_ms: drop_interval_for_level(1, config),
            config: *config,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn drop_interval_ms(&self) -> u64 {
        self.drop_interval_ms
    }

    /// Credits one sweep. `multiplier` is 2 while double points is in effect.
    pub fn record_clear(&mut self, lines: u32, multiplier: u32) -> ClearOutcome {
        let points = line_reward(lines)
            .saturating_mul(self.level)
            .saturating_mul(multiplier);
        self.score = self.score.saturating_add(points);
        self.lines = self.lines.saturating_add(lines);

        let new_level = level_for_lines(self.lines, self.config.lines_per_level);
        let level_up = (new_level > self.level).then(|| {
            self.level = new_level;
            self.drop_interval_ms = drop_interval_for_level(new_level, &self.config);
            new_level
        });

        ClearOutcome { points, level_up }
    }

    pub fn reset(&mut self) {
        *self = Self::new(&self.config);
    }
}
