/// Points for a hit one row off the bar; also the size of a miss penalty.
pub const HALF_VALUE: i64 = 50;
/// Points for a hit on the bar.
pub const FULL_VALUE: i64 = 100;
/// Consecutive hits needed to raise the multiplier by one.
pub const STREAK_STEP: u32 = 10;
pub const MAX_MULTIPLIER: u32 = 9;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_notes: u32,
    pub correct_notes: u32,
    pub mistaken_notes: u32,
    pub score: i64,
    pub last_note_delta: i64,
    pub streak: u32,
    pub best_streak: u32,
}

/// What the HUD needs from a round, copied out of the live stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub score: i64,
    pub accuracy: f64,
    pub last_delta: i64,
    pub streak: u32,
    pub multiplier: u32,
    pub correct_notes: u32,
    pub mistaken_notes: u32,
    pub total_notes: u32,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiplier(&self) -> u32 {
        multiplier_for(self.streak)
    }

    /// Percentage of correct notes over everything judged; 0 before anything was judged.
    pub fn accuracy(&self) -> f64 {
        let judged = self.total_notes as u64 + self.mistaken_notes as u64;
        if judged == 0 {
            return 0.0;
        }
        (self.correct_notes as f64 / judged as f64 * 100.0).max(0.0)
    }

    /// Scales `delta` by the current multiplier and adds it, never dropping below zero.
    pub fn apply(&mut self, delta: i64) {
        self.last_note_delta = delta * self.multiplier() as i64;
        self.score = (self.score + self.last_note_delta).max(0);
    }

    pub fn record_correct(&mut self) {
        self.correct_notes += 1;
        self.total_notes += 1;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
    }

    pub fn record_incorrect(&mut self) {
        self.streak = 0;
        self.mistaken_notes += 1;
        self.apply(-HALF_VALUE);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            score: self.score,
            accuracy: self.accuracy(),
            last_delta: self.last_note_delta,
            streak: self.streak,
            multiplier: self.multiplier(),
            correct_notes: self.correct_notes,
            mistaken_notes: self.mistaken_notes,
            total_notes: self.total_notes,
        }
    }
}

pub fn multiplier_for(streak: u32) -> u32 {
    (1 + streak / STREAK_STEP).min(MAX_MULTIPLIER)
}
