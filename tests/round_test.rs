use fretboard::fretboard::{Cell, Frame, HitGrade, Lanes, Zone};
use fretboard::game::{Game, Phase, RoundConfig, Signal, Step};
use fretboard::judge::Judgment;
use fretboard::stats::HALF_VALUE;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

const LANES: usize = 4;

fn running_game() -> Game<StdRng> {
    let config = RoundConfig {
        lanes: Lanes::parse("dfjk").unwrap(),
        height: 6,
        round_length: Duration::from_secs(30),
        speed: 7,
        note_probability: 0.5,
        start_paused: false,
    };
    Game::new(config, StdRng::seed_from_u64(2024))
}

fn filler(g: &mut Game<StdRng>, ticks: usize) {
    for _ in 0..ticks {
        g.advance(Frame::filler(LANES));
    }
}

#[test]
fn early_hit_in_above_row_scores_half() {
    let mut g = running_game();
    // lane 'j' is index 2; one tick later it sits one row before the bar
    g.advance(Frame::with_note(LANES, 2));
    filler(&mut g, 1);
    assert_eq!(g.buffer().row(Zone::Above).cell(2), Cell::Note);

    assert_eq!(g.handle(Signal::Key('j')), Step::Render);
    assert_eq!(g.stats().correct_notes, 1);
    assert_eq!(g.stats().score, HALF_VALUE);
    assert_eq!(g.view().last_judgment, Some(Judgment::Early));
}

#[test]
fn wrong_lane_on_bar_costs_streak_but_score_stays_at_zero() {
    let mut g = running_game();
    g.advance(Frame::with_note(LANES, 2));
    filler(&mut g, 2);
    assert_eq!(g.buffer().row(Zone::Bar).cell(2), Cell::Note);

    g.handle(Signal::Key('k'));
    assert_eq!(g.stats().mistaken_notes, 1);
    assert_eq!(g.stats().streak, 0);
    assert_eq!(g.stats().score, 0);
}

#[test]
fn unplayed_note_is_missed_exactly_once() {
    let mut g = running_game();
    g.advance(Frame::with_note(LANES, 0));
    for _ in 0..10 {
        g.advance(Frame::filler(LANES));
        // re-renders from keypresses never re-check the miss row
        g.handle(Signal::Key('x'));
    }
    // ten wrong keys plus the one lost note
    assert_eq!(g.stats().mistaken_notes, 11);

    let mut g = running_game();
    g.advance(Frame::with_note(LANES, 0));
    filler(&mut g, 10);
    assert_eq!(g.stats().mistaken_notes, 1);
}

#[test]
fn consumed_note_never_counts_as_a_miss() {
    // above, bar, below
    for ticks_before_press in [1, 2, 3] {
        let mut g = running_game();
        g.advance(Frame::with_note(LANES, 1));
        filler(&mut g, ticks_before_press);
        g.handle(Signal::Key('f'));
        assert_eq!(g.stats().correct_notes, 1);

        filler(&mut g, 8);
        assert_eq!(g.stats().mistaken_notes, 0, "pressed after {ticks_before_press} ticks");
    }
}

#[test]
fn late_hit_marks_the_cell() {
    let mut g = running_game();
    g.advance(Frame::with_note(LANES, 3));
    filler(&mut g, 3);
    g.handle(Signal::Key('k'));
    assert_eq!(g.buffer().row(Zone::Below).cell(3), Cell::Hit(HitGrade::Half));
    assert_eq!(g.view().last_judgment, Some(Judgment::Late));
}

#[test]
fn streak_raises_the_multiplier() {
    let mut g = running_game();
    for _ in 0..10 {
        g.advance(Frame::with_note(LANES, 0));
        filler(&mut g, 2);
        g.handle(Signal::Key('d'));
    }
    assert_eq!(g.stats().streak, 10);
    assert_eq!(g.stats().multiplier(), 2);
    assert_eq!(g.stats().score, 10 * 100);
}

#[test]
fn round_ends_after_210_ticks_at_speed_seven() {
    let mut g = running_game();
    for _ in 0..209 {
        assert_eq!(g.handle(Signal::Tick), Step::Render);
    }
    match g.handle(Signal::Tick) {
        Step::Finished(summary) => assert_eq!(summary.speed, 7),
        other => panic!("expected the round to finish, got {other:?}"),
    }
    assert_eq!(g.phase(), Phase::Finished);
    assert!(g.clock().finished());
    for _ in 0..10 {
        assert_eq!(g.handle(Signal::Tick), Step::Idle);
        assert!(g.clock().finished());
    }
}

#[test]
fn pause_stops_time_and_board() {
    let mut g = running_game();
    filler(&mut g, 3);
    g.handle(Signal::Pause);
    let left = g.clock().time_left();
    let stats = g.stats().clone();

    for _ in 0..100 {
        assert_eq!(g.handle(Signal::Tick), Step::Idle);
    }
    assert_eq!(g.advance(Frame::with_note(LANES, 0)), Step::Idle);
    assert_eq!(g.clock().time_left(), left);
    assert_eq!(g.stats(), &stats);

    g.handle(Signal::Pause);
    assert_eq!(g.handle(Signal::Tick), Step::Render);
    assert!(g.clock().time_left() < left);
}

#[test]
fn speed_change_mid_round_keeps_score_and_board() {
    let mut g = running_game();
    g.advance(Frame::with_note(LANES, 0));
    filler(&mut g, 2);
    g.handle(Signal::Key('d'));
    let score = g.stats().score;
    let rows: Vec<Frame> = g.buffer().frames().cloned().collect();

    g.handle(Signal::Slower);
    assert_eq!(g.clock().speed(), 6);
    assert_eq!(g.stats().score, score);
    assert_eq!(g.buffer().frames().cloned().collect::<Vec<_>>(), rows);
    assert_eq!(g.ticking(), Some(Duration::from_millis(167)));
}
