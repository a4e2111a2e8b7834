use crate::game::Signal;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{io, thread, time::Duration};
use tokio::sync::mpsc;

const CONTROL_KEYS: [char; 7] = ['q', 'r', 'p', '+', '=', '-', '_'];

pub fn is_control_key(c: char) -> bool {
    CONTROL_KEYS.contains(&c.to_ascii_lowercase())
}

/// Decodes a key event; anything that is not a control becomes a lane key.
pub fn signal_for(ev: KeyEvent) -> Option<Signal> {
    if ev.kind == KeyEventKind::Release {
        return None;
    }
    // raw mode swallows SIGINT
    if ev.modifiers.contains(KeyModifiers::CONTROL) {
        return match ev.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Signal::Quit),
            _ => None,
        };
    }
    match ev.code {
        KeyCode::Esc => Some(Signal::Quit),
        KeyCode::Char(ch) => Some(match ch {
            'q' | 'Q' => Signal::Quit,
            'r' | 'R' => Signal::Restart,
            'p' | 'P' => Signal::Pause,
            '+' | '=' => Signal::Faster,
            '-' | '_' => Signal::Slower,
            other => Signal::Key(other),
        }),
        _ => None,
    }
}

/// Reads the keyboard on its own thread until the control loop hangs up.
///
/// A read error is forwarded once and ends the thread.
pub fn spawn_reader(tx: mpsc::Sender<io::Result<Signal>>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        if tx.is_closed() {
            return;
        }
        let ready = match event::poll(Duration::from_millis(50)) {
            Ok(r) => r,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        };
        if !ready {
            continue;
        }
        match event::read() {
            Ok(Event::Key(k)) => {
                if let Some(sig) = signal_for(k) {
                    if tx.blocking_send(Ok(sig)).is_err() {
                        return;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    })
}
