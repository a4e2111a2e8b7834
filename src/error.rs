use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("need between 1 and {max} lane keys, got {count}")]
    LaneCount { count: usize, max: usize },
    #[error("lane key '{0}' is listed twice")]
    DuplicateLane(char),
    #[error("lane key '{0}' is reserved for a game control")]
    LaneIsControlKey(char),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("terminal is {rows} rows tall, the fretboard needs at least {needed}")]
    TerminalTooSmall { rows: u16, needed: u16 },
    #[error("terminal is {cols} columns wide, the fretboard needs at least {needed}")]
    TerminalTooNarrow { cols: u16, needed: u16 },
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("could not read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: expected name,speed,score,correct,total", path.display())]
    Malformed { path: PathBuf, line: usize },
}
