use crate::error::ConfigError;
use crate::input::is_control_key;
use rand::Rng;
use std::collections::VecDeque;

/// Index of the judgment bar inside the window, counted from the oldest frame.
pub const BAR_ROW: usize = 3;
/// Smallest window that still holds every judgment zone.
pub const MIN_HEIGHT: usize = BAR_ROW + 2;
pub const MAX_LANES: usize = 8;

/// Rows around the bar that take part in judgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// One step before the bar, still approaching.
    Above,
    Bar,
    /// One step past the bar; a late hit still counts.
    Below,
    /// Two steps past the bar; an unconsumed note here is lost.
    Miss,
}

impl Zone {
    pub fn offset(self) -> isize {
        match self {
            Zone::Above => 1,
            Zone::Bar => 0,
            Zone::Below => -1,
            Zone::Miss => -2,
        }
    }

    pub fn index(self) -> usize {
        (BAR_ROW as isize + self.offset()) as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitGrade {
    Full,
    Half,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Note,
    /// A note that was already scored; never matched again.
    Hit(HitGrade),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    cells: Vec<Cell>,
}

impl Frame {
    pub fn filler(lanes: usize) -> Self {
        Self {
            cells: vec![Cell::Empty; lanes],
        }
    }

    pub fn with_note(lanes: usize, lane: usize) -> Self {
        let mut f = Self::filler(lanes);
        f.set(lane, Cell::Note);
        f
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, lane: usize) -> Cell {
        self.cells.get(lane).copied().unwrap_or(Cell::Empty)
    }

    pub fn set(&mut self, lane: usize, cell: Cell) {
        if let Some(c) = self.cells.get_mut(lane) {
            *c = cell;
        }
    }

    pub fn has_live_note(&self) -> bool {
        self.cells.iter().any(|c| *c == Cell::Note)
    }
}

/// The ordered key set; lane `i` is bound to `keys[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lanes {
    keys: Vec<char>,
}

impl Lanes {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let keys: Vec<char> = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if keys.is_empty() || keys.len() > MAX_LANES {
            return Err(ConfigError::LaneCount {
                count: keys.len(),
                max: MAX_LANES,
            });
        }
        for (i, &k) in keys.iter().enumerate() {
            if is_control_key(k) {
                return Err(ConfigError::LaneIsControlKey(k));
            }
            if keys[..i].contains(&k) {
                return Err(ConfigError::DuplicateLane(k));
            }
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[char] {
        &self.keys
    }

    pub fn lane_of(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        self.keys.iter().position(|&k| k == key)
    }
}

/// Fixed-height sliding window of frames, oldest first.
///
/// New frames enter at the back and old ones fall off the front, so a note
/// walks from the newest slot down through `Above`, `Bar`, `Below` and `Miss`.
#[derive(Clone, Debug)]
pub struct ScrollBuffer {
    frames: VecDeque<Frame>,
    height: usize,
    lanes: usize,
}

impl ScrollBuffer {
    /// Callers check `height >= MIN_HEIGHT` once at startup.
    pub fn new(lanes: usize, height: usize) -> Self {
        let mut frames = VecDeque::with_capacity(height + 1);
        for _ in 0..height {
            frames.push_back(Frame::filler(lanes));
        }
        Self {
            frames,
            height,
            lanes,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    pub fn append_filler(&mut self) {
        self.push(Frame::filler(self.lanes));
    }

    pub fn append_random_note<R: Rng>(&mut self, rng: &mut R) {
        let lane = rng.gen_range(0..self.lanes);
        self.push(Frame::with_note(self.lanes, lane));
    }

    /// Appends a note frame with probability `p`, a filler otherwise.
    pub fn advance<R: Rng>(&mut self, rng: &mut R, p: f64) {
        if rng.gen_bool(p.clamp(0.0, 1.0)) {
            self.append_random_note(rng);
        } else {
            self.append_filler();
        }
    }

    pub fn trim(&mut self) {
        while self.frames.len() > self.height {
            self.frames.pop_front();
        }
    }

    pub fn row(&self, zone: Zone) -> &Frame {
        &self.frames[zone.index()]
    }

    pub fn row_mut(&mut self, zone: Zone) -> &mut Frame {
        &mut self.frames[zone.index()]
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zone_rows_surround_the_bar() {
        assert_eq!(Zone::Miss.index(), 1);
        assert_eq!(Zone::Below.index(), 2);
        assert_eq!(Zone::Bar.index(), 3);
        assert_eq!(Zone::Above.index(), 4);
        assert!(Zone::Above.index() < MIN_HEIGHT);
    }

    #[test]
    fn new_buffer_is_full_of_filler() {
        let b = ScrollBuffer::new(4, 6);
        assert_eq!(b.len(), 6);
        assert!(b.frames().all(|f| !f.has_live_note()));
    }

    #[test]
    fn append_then_trim_drops_oldest() {
        let mut b = ScrollBuffer::new(4, 6);
        b.push(Frame::with_note(4, 2));
        assert_eq!(b.len(), 7);
        b.trim();
        assert_eq!(b.len(), 6);
        assert_eq!(b.frames().last().map(|f| f.cell(2)), Some(Cell::Note));
    }

    #[test]
    fn trim_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = ScrollBuffer::new(4, 6);
        for _ in 0..3 {
            b.append_random_note(&mut rng);
        }
        b.trim();
        let once: Vec<Frame> = b.frames().cloned().collect();
        b.trim();
        let twice: Vec<Frame> = b.frames().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn random_note_marks_exactly_one_lane() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut b = ScrollBuffer::new(4, 6);
        for _ in 0..50 {
            b.append_random_note(&mut rng);
            b.trim();
            let newest = b.frames().last().cloned().unwrap_or_else(|| Frame::filler(4));
            let notes = newest.cells().iter().filter(|c| **c == Cell::Note).count();
            assert_eq!(notes, 1);
        }
    }

    #[test]
    fn advance_respects_probability_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = ScrollBuffer::new(4, 6);
        for _ in 0..20 {
            b.advance(&mut rng, 0.0);
            b.trim();
        }
        assert!(b.frames().all(|f| !f.has_live_note()));
        for _ in 0..6 {
            b.advance(&mut rng, 1.0);
            b.trim();
        }
        assert!(b.frames().all(|f| f.has_live_note()));
    }

    #[test]
    fn lanes_reject_duplicates_and_control_keys() {
        assert!(Lanes::parse("dfjk").is_ok());
        assert!(matches!(Lanes::parse("dfjd"), Err(ConfigError::DuplicateLane('d'))));
        assert!(matches!(Lanes::parse("dfjq"), Err(ConfigError::LaneIsControlKey('q'))));
        assert!(matches!(Lanes::parse(""), Err(ConfigError::LaneCount { .. })));
    }

    #[test]
    fn lane_lookup_ignores_case() {
        let lanes = Lanes::parse("dfjk").unwrap();
        assert_eq!(lanes.lane_of('J'), Some(2));
        assert_eq!(lanes.lane_of('x'), None);
    }
}
