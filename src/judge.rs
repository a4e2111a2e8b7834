use crate::fretboard::{Cell, HitGrade, Lanes, ScrollBuffer, Zone};
use crate::stats::{Stats, FULL_VALUE, HALF_VALUE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    Early,
    OnTime,
    Late,
    Miss,
}

impl Judgment {
    pub fn label(self) -> &'static str {
        match self {
            Judgment::Early => "EARLY",
            Judgment::OnTime => "ON TIME",
            Judgment::Late => "LATE",
            Judgment::Miss => "MISS",
        }
    }
}

// Scoring order when one press lines up with notes in several rows.
const LIVE_ZONES: [(Zone, HitGrade, i64); 3] = [
    (Zone::Bar, HitGrade::Full, FULL_VALUE),
    (Zone::Above, HitGrade::Half, HALF_VALUE),
    (Zone::Below, HitGrade::Half, HALF_VALUE),
];

/// Judges one keypress against the rows around the bar.
///
/// Every live note in the key's lane within `Above`, `Bar` and `Below` is
/// consumed and scored, but the streak only grows once per press. A note that
/// already sits in the `Miss` row cannot be rescued.
pub fn judge_key(key: char, lanes: &Lanes, buffer: &mut ScrollBuffer, stats: &mut Stats) -> Judgment {
    let Some(lane) = lanes.lane_of(key) else {
        stats.record_incorrect();
        return Judgment::Miss;
    };

    let mut best = None;
    for (zone, grade, value) in LIVE_ZONES {
        let row = buffer.row_mut(zone);
        if row.cell(lane) != Cell::Note {
            continue;
        }
        row.set(lane, Cell::Hit(grade));
        stats.apply(value);
        if best.is_none() {
            best = Some(zone);
        }
    }

    match best {
        None => {
            stats.record_incorrect();
            Judgment::Miss
        }
        Some(zone) => {
            stats.record_correct();
            match zone {
                Zone::Bar => Judgment::OnTime,
                Zone::Above => Judgment::Early,
                _ => Judgment::Late,
            }
        }
    }
}

/// Scores the `Miss` row once per tick. Returns true when a note was lost.
pub fn judge_miss_row(buffer: &ScrollBuffer, stats: &mut Stats) -> bool {
    if buffer.row(Zone::Miss).has_live_note() {
        stats.record_incorrect();
        true
    } else {
        false
    }
}
