use crate::clock::{clamp_speed, RoundClock};
use crate::fretboard::{Frame, Lanes, ScrollBuffer, BAR_ROW};
use crate::judge::{judge_key, judge_miss_row, Judgment};
use crate::stats::{Stats, StatsSnapshot};
use rand::Rng;
use std::time::Duration;

/// Everything the control loop reacts to, from the ticker or the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Tick,
    Key(char),
    Pause,
    Restart,
    Quit,
    Faster,
    Slower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Paused,
    Finished,
}

/// What the run loop should do after a signal was handled.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Nothing changed on screen.
    Idle,
    Render,
    /// The round just ran out of time; emitted exactly once per round.
    Finished(RoundSummary),
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundSummary {
    pub speed: u32,
    pub score: i64,
    pub correct_notes: u32,
    pub mistaken_notes: u32,
    pub total_notes: u32,
    pub accuracy: f64,
    pub best_streak: u32,
}

#[derive(Clone, Debug)]
pub struct RoundConfig {
    pub lanes: Lanes,
    pub height: usize,
    pub round_length: Duration,
    pub speed: u32,
    pub note_probability: f64,
    pub start_paused: bool,
}

/// Owned copy of the visible state, handed to the renderer.
#[derive(Clone, Debug)]
pub struct View {
    /// Oldest frame first.
    pub rows: Vec<Frame>,
    pub lanes: Vec<char>,
    pub bar_row: usize,
    pub stats: StatsSnapshot,
    pub time_left: Duration,
    pub speed: u32,
    pub phase: Phase,
    pub last_judgment: Option<Judgment>,
}

struct Round {
    buffer: ScrollBuffer,
    stats: Stats,
    clock: RoundClock,
    phase: Phase,
    last_judgment: Option<Judgment>,
}

impl Round {
    fn new(config: &RoundConfig, speed: u32, phase: Phase) -> Self {
        Self {
            buffer: ScrollBuffer::new(config.lanes.len(), config.height),
            stats: Stats::new(),
            clock: RoundClock::new(config.round_length, speed),
            phase,
            last_judgment: None,
        }
    }
}

pub struct Game<R: Rng> {
    config: RoundConfig,
    rng: R,
    speed: u32,
    round: Round,
}

impl<R: Rng> Game<R> {
    pub fn new(config: RoundConfig, rng: R) -> Self {
        let speed = clamp_speed(config.speed);
        let phase = if config.start_paused {
            Phase::Paused
        } else {
            Phase::Running
        };
        let round = Round::new(&config, speed, phase);
        Self {
            config,
            rng,
            speed,
            round,
        }
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    pub fn stats(&self) -> &Stats {
        &self.round.stats
    }

    pub fn clock(&self) -> &RoundClock {
        &self.round.clock
    }

    pub fn buffer(&self) -> &ScrollBuffer {
        &self.round.buffer
    }

    /// Tick interval while the round is running, `None` when ticks should stop.
    pub fn ticking(&self) -> Option<Duration> {
        match self.round.phase {
            Phase::Running => Some(self.round.clock.tick_interval()),
            Phase::Paused | Phase::Finished => None,
        }
    }

    pub fn handle(&mut self, signal: Signal) -> Step {
        match signal {
            Signal::Quit => Step::Quit,
            Signal::Restart => {
                self.restart();
                Step::Render
            }
            Signal::Pause => self.toggle_pause(),
            Signal::Faster => self.change_speed(1),
            Signal::Slower => self.change_speed(-1),
            Signal::Tick => {
                if self.round.phase != Phase::Running {
                    return Step::Idle;
                }
                self.round
                    .buffer
                    .advance(&mut self.rng, self.config.note_probability);
                self.settle_tick()
            }
            Signal::Key(k) => self.press(k),
        }
    }

    /// Runs one tick with the given frame entering the board instead of a
    /// generated one.
    pub fn advance(&mut self, frame: Frame) -> Step {
        if self.round.phase != Phase::Running {
            return Step::Idle;
        }
        self.round.buffer.push(frame);
        self.settle_tick()
    }

    /// Clock, trim and miss row for a frame that has just entered the board.
    fn settle_tick(&mut self) -> Step {
        let round = &mut self.round;
        let step = round.clock.tick_interval();
        round.clock.advance(step);
        round.buffer.trim();
        if judge_miss_row(&round.buffer, &mut round.stats) {
            round.last_judgment = Some(Judgment::Miss);
        }

        if round.clock.finished() {
            round.phase = Phase::Finished;
            let summary = self.summary();
            log::info!(
                "round finished: score {} ({:.0}%) at speed {}",
                summary.score,
                summary.accuracy,
                summary.speed
            );
            return Step::Finished(summary);
        }
        Step::Render
    }

    /// Judges a lane key. The board is not advanced and the miss row is not
    /// looked at, so a re-render here cannot count the same miss twice.
    pub fn press(&mut self, key: char) -> Step {
        if self.round.phase != Phase::Running {
            return Step::Idle;
        }
        let round = &mut self.round;
        let judgment = judge_key(key, &self.config.lanes, &mut round.buffer, &mut round.stats);
        log::trace!("key {key:?} judged {judgment:?}");
        round.last_judgment = Some(judgment);
        round.buffer.trim();
        Step::Render
    }

    pub fn restart(&mut self) {
        log::info!("restarting round at speed {}", self.speed);
        self.round = Round::new(&self.config, self.speed, Phase::Running);
    }

    fn toggle_pause(&mut self) -> Step {
        self.round.phase = match self.round.phase {
            Phase::Running => {
                let clock = &self.round.clock;
                log::info!("paused after {:?}, {:?} left", clock.elapsed(), clock.time_left());
                Phase::Paused
            }
            Phase::Paused => {
                log::info!("resumed");
                Phase::Running
            }
            Phase::Finished => return Step::Idle,
        };
        Step::Render
    }

    fn change_speed(&mut self, delta: i32) -> Step {
        if self.round.phase == Phase::Finished {
            return Step::Idle;
        }
        let wanted = (self.speed as i32 + delta).max(0) as u32;
        let speed = self.round.clock.set_speed(wanted);
        if speed == self.speed {
            return Step::Idle;
        }
        log::info!("speed {} -> {}", self.speed, speed);
        self.speed = speed;
        Step::Render
    }

    pub fn summary(&self) -> RoundSummary {
        let s = &self.round.stats;
        RoundSummary {
            speed: self.round.clock.speed(),
            score: s.score,
            correct_notes: s.correct_notes,
            mistaken_notes: s.mistaken_notes,
            total_notes: s.total_notes,
            accuracy: s.accuracy(),
            best_streak: s.best_streak,
        }
    }

    pub fn view(&self) -> View {
        let round = &self.round;
        View {
            rows: round.buffer.frames().cloned().collect(),
            lanes: self.config.lanes.keys().to_vec(),
            bar_row: BAR_ROW,
            stats: round.stats.snapshot(),
            time_left: round.clock.time_left(),
            speed: round.clock.speed(),
            phase: round.phase,
            last_judgment: round.last_judgment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fretboard::Cell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(start_paused: bool) -> Game<StdRng> {
        game_with(start_paused, 0.5)
    }

    fn game_with(start_paused: bool, note_probability: f64) -> Game<StdRng> {
        let config = RoundConfig {
            lanes: Lanes::parse("dfjk").unwrap(),
            height: 6,
            round_length: Duration::from_secs(30),
            speed: 7,
            note_probability,
            start_paused,
        };
        Game::new(config, StdRng::seed_from_u64(99))
    }

    #[test]
    fn ticks_take_frames_from_the_buffer_generator() {
        let mut g = game_with(false, 1.0);
        for _ in 0..3 {
            assert_eq!(g.handle(Signal::Tick), Step::Render);
        }
        assert_eq!(g.buffer().len(), 6);
        let live: Vec<bool> = g.buffer().frames().map(Frame::has_live_note).collect();
        assert_eq!(&live[3..], &[true, true, true]);

        let mut g = game_with(false, 0.0);
        g.handle(Signal::Tick);
        assert!(!g.buffer().frames().any(Frame::has_live_note));
        assert_eq!(g.clock().time_left(), Duration::from_millis(30_000 - 143));
    }

    #[test]
    fn starts_paused_by_default_config() {
        let g = game(true);
        assert_eq!(g.phase(), Phase::Paused);
        assert_eq!(g.ticking(), None);
    }

    #[test]
    fn pause_toggles_and_freezes_state() {
        let mut g = game(false);
        g.handle(Signal::Tick);
        assert_eq!(g.handle(Signal::Pause), Step::Render);
        let before_rows: Vec<Frame> = g.buffer().frames().cloned().collect();
        let before_stats = g.stats().clone();
        let before_time = g.clock().time_left();

        for _ in 0..50 {
            assert_eq!(g.handle(Signal::Tick), Step::Idle);
            assert_eq!(g.handle(Signal::Key('j')), Step::Idle);
        }
        let after_rows: Vec<Frame> = g.buffer().frames().cloned().collect();
        assert_eq!(before_rows, after_rows);
        assert_eq!(&before_stats, g.stats());
        assert_eq!(before_time, g.clock().time_left());

        g.handle(Signal::Pause);
        assert_eq!(g.phase(), Phase::Running);
        assert_eq!(g.ticking(), Some(Duration::from_millis(143)));
    }

    #[test]
    fn speed_change_keeps_the_round() {
        let mut g = game(false);
        g.advance(Frame::with_note(4, 2));
        g.advance(Frame::filler(4));
        let left = g.clock().time_left();

        assert_eq!(g.handle(Signal::Faster), Step::Render);
        assert_eq!(g.clock().speed(), 8);
        assert_eq!(g.clock().time_left(), left);
        assert_eq!(g.buffer().row(crate::fretboard::Zone::Above).cell(2), Cell::Note);
        assert_eq!(g.ticking(), Some(Duration::from_millis(125)));
    }

    #[test]
    fn speed_is_clamped_at_the_edges() {
        let mut g = game(true);
        for _ in 0..20 {
            g.handle(Signal::Faster);
        }
        assert_eq!(g.clock().speed(), 12);
        assert_eq!(g.handle(Signal::Faster), Step::Idle);
        for _ in 0..20 {
            g.handle(Signal::Slower);
        }
        assert_eq!(g.clock().speed(), 1);
    }

    #[test]
    fn restart_builds_a_fresh_round_at_current_speed() {
        let mut g = game(false);
        g.handle(Signal::Faster);
        g.handle(Signal::Key('x'));
        g.handle(Signal::Tick);
        g.handle(Signal::Restart);

        assert_eq!(g.phase(), Phase::Running);
        assert_eq!(g.stats(), &Stats::new());
        assert_eq!(g.clock().time_left(), Duration::from_secs(30));
        assert_eq!(g.clock().speed(), 8);
        assert!(g.buffer().frames().all(|f| !f.has_live_note()));
    }

    #[test]
    fn finished_round_only_accepts_restart_and_quit() {
        let mut g = game(false);
        let mut finished = 0;
        for _ in 0..300 {
            if let Step::Finished(_) = g.handle(Signal::Tick) {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
        assert_eq!(g.phase(), Phase::Finished);
        assert_eq!(g.ticking(), None);
        assert_eq!(g.handle(Signal::Pause), Step::Idle);
        assert_eq!(g.handle(Signal::Faster), Step::Idle);
        assert_eq!(g.handle(Signal::Key('j')), Step::Idle);
        assert_eq!(g.handle(Signal::Quit), Step::Quit);
        assert_eq!(g.handle(Signal::Restart), Step::Render);
        assert_eq!(g.phase(), Phase::Running);
    }

    #[test]
    fn view_reports_last_judgment() {
        let mut g = game(false);
        g.handle(Signal::Key('x'));
        let v = g.view();
        assert_eq!(v.last_judgment, Some(Judgment::Miss));
        assert_eq!(v.rows.len(), 6);
        assert_eq!(v.lanes, vec!['d', 'f', 'j', 'k']);
    }
}
