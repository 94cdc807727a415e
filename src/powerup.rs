//! Score-unlocked power-ups.
//!
//! Each kind unlocks at most once per game, the first time the score
//! reaches its threshold. Row clear, column clear and time slow go into the
//! available set and are consumed on use. Double points never enters that
//! set: it stays in effect for the rest of the game once unlocked.

use rand::Rng;

use crate::board::Board;
use crate::config::GameConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PowerUpKind {
    ClearRow,
    ClearColumn,
    SlowTime,
    DoublePoints,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::ClearRow,
        PowerUpKind::ClearColumn,
        PowerUpKind::SlowTime,
        PowerUpKind::DoublePoints,
    ];

    pub fn score_threshold(self) -> u32 {
        match self {
            PowerUpKind::ClearRow => 500,
            PowerUpKind::ClearColumn => 1000,
            PowerUpKind::SlowTime => 1500,
            PowerUpKind::DoublePoints => 2000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::ClearRow => "Row Clear",
            PowerUpKind::ClearColumn => "Column Clear",
            PowerUpKind::SlowTime => "Slow Time",
            PowerUpKind::DoublePoints => "Double Points",
        }
    }

    pub fn is_passive(self) -> bool {
        self == PowerUpKind::DoublePoints
    }
}

/// What an activation did, for the host to report.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUpEffect {
    RowCleared(usize),
    ColumnCleared(usize),
    TimeSlowed { duration_ms: u64 },
}

#[derive(Clone, Debug)]
pub struct PowerUpEngine {
    enabled: bool,
    slow_time_factor: u64,
    slow_time_duration_ms: u64,
    unlocked: Vec<PowerUpKind>,
    available: Vec<PowerUpKind>,
    double_points: bool,
    slow_remaining_ms: Option<u64>,
}

impl PowerUpEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            enabled: config.power_ups_enabled,
            slow_time_factor: config.slow_time_factor,
            slow_time_duration_ms: config.slow_time_duration_ms,
            unlocked: Vec::new(),
            available: Vec::new(),
            double_points: false,
            slow_remaining_ms: None,
        }
    }

    /// Drops every unlock and cancels a running slow-down.
    pub fn reset(&mut self) {
        self.unlocked.clear();
        self.available.clear();
        self.double_points = false;
        self.slow_remaining_ms = None;
    }

    /// Unlocks every kind whose threshold `score` has reached for the first
    /// time, returning the newly unlocked kinds.
    pub fn check_unlocks(&mut self, score: u32) -> Vec<PowerUpKind> {
        if !self.enabled {
            return Vec::new();
        }
        let fresh: Vec<PowerUpKind> = PowerUpKind::ALL
            .into_iter()
            .filter(|kind| score >= kind.score_threshold() && !self.unlocked.contains(kind))
            .collect();
        for &kind in &fresh {
            self.unlocked.push(kind);
            if kind.is_passive() {
                self.double_points = true;
            } else {
                self.available.push(kind);
            }
        }
        fresh
    }

    pub fn is_available(&self, kind: PowerUpKind) -> bool {
        self.available.contains(&kind)
    }

    /// Activatable power-ups, in unlock order.
    pub fn available(&self) -> &[PowerUpKind] {
        &self.available
    }

    /// Available power-ups followed by passive ones in effect.
    pub fn active(&self) -> Vec<PowerUpKind> {
        let mut active = self.available.clone();
        if self.double_points {
            active.push(PowerUpKind::DoublePoints);
        }
        active
    }

    pub fn score_multiplier(&self) -> u32 {
        if self.double_points {
            2
        } else {
            1
        }
    }

    pub fn is_time_slowed(&self) -> bool {
        self.slow_remaining_ms.is_some()
    }

    pub fn slow_remaining_ms(&self) -> Option<u64> {
        self.slow_remaining_ms
    }

    /// Applies the slow-down to an un-slowed `base` interval. The base always
    /// comes from the progression, so overlapping slow-downs never compound
    /// and expiry never restores a stale value.
    pub fn effective_interval(&self, base_ms: u64) -> u64 {
        if self.is_time_slowed() {
            base_ms.saturating_mul(self.slow_time_factor)
        } else {
            base_ms
        }
    }

    /// Advances the slow-down countdown. Returns true when it just ran out.
    pub fn advance(&mut self, elapsed_ms: u64) -> bool {
        match self.slow_remaining_ms {
            Some(remaining) if remaining > elapsed_ms => {
                self.slow_remaining_ms = Some(remaining - elapsed_ms);
                false
            }
            Some(_) => {
                self.slow_remaining_ms = None;
                true
            }
            None => false,
        }
    }

    /// Consumes `kind` and applies it. `None` (and no change) if it is not
    /// currently available.
    pub fn activate<R: Rng + ?Sized>(
        &mut self,
        kind: PowerUpKind,
        board: &mut Board,
        rng: &mut R,
    ) -> Option<PowerUpEffect> {
        if kind.is_passive() {
            return None;
        }
        let index = self.available.iter().position(|&k| k == kind)?;
        self.available.remove(index);

        let effect = match kind {
            PowerUpKind::ClearRow => {
                let y = rng.gen_range(0..board.height());
                board.clear_row(y);
                PowerUpEffect::RowCleared(y)
            }
            PowerUpKind::ClearColumn => {
                let x = rng.gen_range(0..board.width());
                board.clear_column(x);
                PowerUpEffect::ColumnCleared(x)
            }
            PowerUpKind::SlowTime => {
                // A second slow-down restarts the countdown; the factor is
                // applied once either way.
                self.slow_remaining_ms = Some(self.slow_time_duration_ms);
                PowerUpEffect::TimeSlowed {
                    duration_ms: self.slow_time_duration_ms,
                }
            }
            PowerUpKind::DoublePoints => return None,
        };
        Some(effect)
    }
}
