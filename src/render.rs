use crate::fretboard::{Cell as Slot, HitGrade, Zone};
use crate::game::{Phase, RoundSummary, View};
use crate::leaderboard::Entry;
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::cmp::min;
use std::io::{self, Write};

/// Columns used by one lane: a separator and three cells.
pub const LANE_WIDTH: u16 = 4;
/// Rows below the board reserved for the key hints.
pub const FOOTER_ROWS: u16 = 1;

const FLAME: [&str; 4] = ["\\(_)/", "/ ) (", " ) \\", "  )"];

const LANE_COLORS: [Color; 8] = [
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
    Color::DarkYellow,
];

const BG: Color = Color::Black;
const BAR_BG: Color = Color::DarkGrey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: BG,
            bold: false,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.w && y < self.h {
            Some(self.cells[self.idx(x, y)])
        } else {
            None
        }
    }
    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Text of one row, trailing blanks removed.
    pub fn row_text(&self, y: u16) -> String {
        let s: String = (0..self.w)
            .filter_map(|x| self.get(x, y))
            .map(|c| c.ch)
            .collect();
        s.trim_end().to_string()
    }
}

/// Extra layer drawn over the board.
pub enum Overlay<'a> {
    None,
    Help,
    Results {
        name: &'a str,
        summary: &'a RoundSummary,
        top: &'a [Entry],
    },
}

pub fn board_width(lanes: usize) -> u16 {
    lanes as u16 * LANE_WIDTH + 1
}

/* -----------------------------
   Board composition
------------------------------ */

/// Draws the fretboard, sidebar and footer; newest frame at the top.
pub fn compose(buf: &mut CellBuffer, view: &View, overlay: &Overlay, color: bool) {
    buf.clear();
    let height = view.rows.len();
    let multiplier = view.stats.multiplier;

    for (i, frame) in view.rows.iter().enumerate() {
        let Ok(y) = u16::try_from(height - 1 - i) else {
            continue;
        };
        let on_bar = i == view.bar_row;
        let framing = i == Zone::Above.index() || i == Zone::Below.index();
        let bg = if on_bar { BAR_BG } else { BG };
        let filler = if framing { '-' } else { ' ' };

        let mut x = 0u16;
        for (lane, slot) in frame.cells().iter().enumerate() {
            let lane_fg = if color {
                LANE_COLORS[lane % LANE_COLORS.len()]
            } else {
                Color::White
            };
            buf.set(x, y, plain('|', Color::Grey, bg));
            let (ch, fg, bold) = match slot {
                Slot::Empty => (filler, Color::DarkGrey, false),
                Slot::Note => (view.lanes.get(lane).copied().unwrap_or('o'), lane_fg, true),
                Slot::Hit(HitGrade::Full) => ('#', lane_fg, false),
                Slot::Hit(HitGrade::Half) => ('+', lane_fg, false),
            };
            buf.set(x + 1, y, plain(filler, Color::DarkGrey, bg));
            buf.set(x + 2, y, Cell { ch, fg, bg, bold });
            buf.set(x + 3, y, plain(filler, Color::DarkGrey, bg));
            x += LANE_WIDTH;
        }
        buf.set(x, y, plain('|', Color::Grey, bg));

        let side = sidebar_line(view, i, multiplier);
        if !side.is_empty() {
            let fg = if i >= view.bar_row + 2 && multiplier > 1 && color {
                Color::DarkYellow
            } else {
                Color::White
            };
            draw_text(buf, x + 3, y, &side, fg, BG);
        }
    }

    let footer_y = buf.h.saturating_sub(1);
    let hint = match view.phase {
        Phase::Running => "p pause  r restart  q quit  +/- speed",
        Phase::Paused => "PAUSED  p play  r restart  q quit  +/- speed",
        Phase::Finished => "ROUND OVER  r play again  q quit",
    };
    draw_text(buf, 0, footer_y, hint, Color::Grey, BG);

    match overlay {
        Overlay::None => {}
        Overlay::Help => {
            let keys: Vec<String> = view.lanes.iter().map(|k| k.to_string()).collect();
            let body = format!(
                "Notes fall toward the grey bar.\n\
                 Press a lane's key as its note crosses the bar.\n\n\
                 Lanes: {}\n\
                 On the bar: {} pts, one row off: {} pts.\n\
                 Wrong keys and missed notes cost points\n\
                 and reset your streak.\n\
                 Every 10 hits in a row raise the multiplier.\n\n\
                 p play/pause   r restart   q quit\n\
                 + / - change speed (now {})",
                keys.join(" "),
                crate::stats::FULL_VALUE,
                crate::stats::HALF_VALUE,
                view.speed
            );
            draw_center_box(buf, "How to play", &body);
        }
        Overlay::Results { name, summary, top } => {
            let mut body = format!(
                "Congratulations {}, your score was {} ({:.0}%)!\n\
                 Correct: {}, Mistakes: {}, Total: {}\n\
                 Best streak: {}\n\n\
                 Highscores for speed {}:\n",
                name,
                summary.score,
                summary.accuracy,
                summary.correct_notes,
                summary.mistaken_notes,
                summary.total_notes,
                summary.best_streak,
                summary.speed
            );
            for (i, e) in top.iter().enumerate() {
                body.push_str(&format!(
                    "  {}. {} {} ({}/{})\n",
                    i + 1,
                    e.name,
                    e.score,
                    e.correct,
                    e.total
                ));
            }
            body.push_str("\nr play again   q quit");
            draw_center_box(buf, "Round over", &body);
        }
    }
}

fn sidebar_line(view: &View, row: usize, multiplier: u32) -> String {
    let s = &view.stats;
    let bar = view.bar_row;
    if row == bar {
        return format!("score: {} ({:.0}%) {:+}", s.score, s.accuracy, s.last_delta);
    }
    if row == bar + 1 {
        return format!("streak: {} ({}x)", s.streak, multiplier);
    }
    if row + 1 == bar {
        return format!("time: {}", view.time_left.as_secs_f64().ceil() as u64);
    }
    if row + 2 == bar {
        return format!("speed: {}", view.speed);
    }
    if row + 3 == bar {
        return view.last_judgment.map(|j| j.label().to_string()).unwrap_or_default();
    }
    if multiplier > 1 && row >= bar + 2 {
        if let Some(line) = FLAME.get(row - bar - 2) {
            return line.to_string();
        }
    }
    String::new()
}

fn plain(ch: char, fg: Color, bg: Color) -> Cell {
    Cell {
        ch,
        fg,
        bg,
        bold: false,
    }
}

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, plain(ch, fg, bg));
    }
}

fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let w = buf.w;
    let h = buf.h;

    let bw = min(56, w.saturating_sub(2));
    let bh = min(body.lines().count() as u16 + 4, h.saturating_sub(1));
    if bw < 4 || bh < 3 {
        return;
    }

    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;
    let edge = |ch| plain(ch, Color::White, BG);

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, edge(' '));
        }
    }
    for x in x0..x0 + bw {
        buf.set(x, y0, edge('─'));
        buf.set(x, y0 + bh - 1, edge('─'));
    }
    for y in y0..y0 + bh {
        buf.set(x0, y, edge('│'));
        buf.set(x0 + bw - 1, y, edge('│'));
    }
    buf.set(x0, y0, edge('┌'));
    buf.set(x0 + bw - 1, y0, edge('┐'));
    buf.set(x0, y0 + bh - 1, edge('└'));
    buf.set(x0 + bw - 1, y0 + bh - 1, edge('┘'));

    draw_text(buf, x0 + 2, y0 + 1, title, Color::White, BG);
    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        let room = (bw - 3) as usize;
        let clipped: String = line.chars().take(room).collect();
        draw_text(buf, x0 + 2, yy, &clipped, Color::White, BG);
        yy += 1;
    }
}

/* -----------------------------
   Terminal output
------------------------------ */

pub struct Terminal {
    out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    prev: CellBuffer,
    pub cur: CellBuffer,
    // False until the first full repaint has gone out.
    diff_only: bool,
}

// Runs `undo` when `res` failed, keeping the original error.
fn undo_on_err<T>(res: io::Result<T>, undo: impl FnOnce() -> io::Result<()>) -> io::Result<T> {
    if res.is_err() {
        let _ = undo();
    }
    res
}

impl Terminal {
    /// Takes over the terminal at the size measured once at startup.
    pub fn begin(cols: u16, rows: u16) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        undo_on_err(
            execute!(
                out,
                EnterAlternateScreen,
                cursor::Hide,
                DisableLineWrap,
                terminal::Clear(ClearType::All)
            ),
            terminal::disable_raw_mode,
        )?;

        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            diff_only: false,
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn draw(&mut self, view: &View, overlay: &Overlay, color: bool) -> anyhow::Result<()> {
        compose(&mut self.cur, view, overlay, color);
        self.present()
    }

    fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                if !self.needs_paint(i) {
                    continue;
                }
                let c = self.cur.cells[i];

                queue!(self.out, cursor::MoveTo(x, y))?;

                if c.bold != last_bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.diff_only = true;
        Ok(())
    }

    fn needs_paint(&self, i: usize) -> bool {
        !self.diff_only || self.cur.cells[i] != self.prev.cells[i]
    }
}
