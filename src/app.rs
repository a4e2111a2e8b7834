use crate::config::Settings;
use crate::error::SetupError;
use crate::fretboard::{Lanes, MIN_HEIGHT};
use crate::game::{Game, Phase, RoundConfig, RoundSummary, Signal, Step};
use crate::input::spawn_reader;
use crate::leaderboard::{Entry, Leaderboard};
use crate::render::{board_width, Overlay, Terminal, FOOTER_ROWS};
use anyhow::{bail, Context, Result};
use crossterm::terminal;
use rand::{rngs::StdRng, SeedableRng};
use std::{io, path::PathBuf, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

pub struct Options {
    pub name: String,
    pub settings: Settings,
    pub seed: u64,
    pub highscores_path: PathBuf,
}

/// Board height for a terminal of `rows`, or why it cannot be played in.
pub fn fit_board(cols: u16, rows: u16, lanes: usize) -> Result<usize, SetupError> {
    let needed_rows = MIN_HEIGHT as u16 + FOOTER_ROWS;
    if rows < needed_rows {
        return Err(SetupError::TerminalTooSmall {
            rows,
            needed: needed_rows,
        });
    }
    let needed_cols = board_width(lanes);
    if cols < needed_cols {
        return Err(SetupError::TerminalTooNarrow {
            cols,
            needed: needed_cols,
        });
    }
    Ok((rows - FOOTER_ROWS) as usize)
}

/// Periodic `Tick` producer; replaced wholesale whenever its rate changes.
#[derive(Default)]
struct Ticker {
    task: Option<(JoinHandle<()>, Duration)>,
}

impl Ticker {
    fn sync(&mut self, want: Option<Duration>, tx: &mpsc::Sender<io::Result<Signal>>) {
        if self.task.as_ref().map(|(_, every)| *every) == want {
            return;
        }
        self.stop();
        if let Some(every) = want {
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let mut t = interval_at(Instant::now() + every, every);
                t.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    t.tick().await;
                    if tx.send(Ok(Signal::Tick)).await.is_err() {
                        return;
                    }
                }
            });
            self.task = Some((handle, every));
        }
    }

    fn stop(&mut self) {
        if let Some((handle, _)) = self.task.take() {
            handle.abort();
        }
    }
}

struct App {
    name: String,
    color: bool,
    game: Game<StdRng>,
    leaderboard: Leaderboard,
    results: Option<(RoundSummary, Vec<Entry>)>,
    term: Terminal,
}

impl App {
    async fn run(&mut self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<io::Result<Signal>>(64);
        let _reader = spawn_reader(tx.clone());
        let mut ticker = Ticker::default();

        self.draw()?;
        loop {
            ticker.sync(self.game.ticking(), &tx);

            let Some(msg) = rx.recv().await else {
                bail!("input channel closed");
            };
            let signal = msg.context("reading keyboard input")?;

            match self.game.handle(signal) {
                Step::Idle => {}
                Step::Render => {
                    if self.game.phase() != Phase::Finished {
                        self.results = None;
                    }
                    self.draw()?;
                }
                Step::Finished(summary) => {
                    ticker.stop();
                    let top = self
                        .leaderboard
                        .add(Entry {
                            name: self.name.clone(),
                            speed: summary.speed,
                            score: summary.score,
                            correct: summary.correct_notes,
                            total: summary.total_notes,
                        })
                        .context("saving highscore")?;
                    self.results = Some((summary, top));
                    self.draw()?;
                }
                Step::Quit => break,
            }
        }

        ticker.stop();
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let view = self.game.view();
        let overlay = match (&view.phase, &self.results) {
            (Phase::Paused, _) => Overlay::Help,
            (Phase::Finished, Some((summary, top))) => Overlay::Results {
                name: &self.name,
                summary,
                top,
            },
            _ => Overlay::None,
        };
        self.term.draw(&view, &overlay, self.color)
    }
}

pub async fn run(opts: Options) -> Result<()> {
    let settings = opts.settings;
    let lanes = Lanes::parse(&settings.lanes).context("invalid lane keys in settings")?;

    let (cols, rows) = terminal::size().context("could not determine terminal size")?;
    let height = fit_board(cols, rows, lanes.len())?;

    let leaderboard = Leaderboard::open(opts.highscores_path, settings.leaderboard_size)
        .context("loading highscores")?;

    log::info!(
        "starting: {}x{} terminal, board height {}, lanes {:?}, speed {}, seed {}, highscores {}",
        cols,
        rows,
        height,
        lanes.keys(),
        settings.speed,
        opts.seed,
        leaderboard.path().display()
    );

    let config = RoundConfig {
        lanes,
        height,
        round_length: settings.round_length(),
        speed: settings.speed,
        note_probability: settings.note_probability,
        start_paused: settings.start_paused,
    };
    let game = Game::new(config, StdRng::seed_from_u64(opts.seed));

    let term = Terminal::begin(cols, rows).context("could not switch terminal to raw mode")?;
    let mut app = App {
        name: opts.name,
        color: settings.enable_color,
        game,
        leaderboard,
        results: None,
        term,
    };

    let res = app.run().await;
    let restored = app.term.end();
    if let Err(e) = &res {
        log::error!("aborting: {e:#}");
    }
    res?;
    restored
}
