pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fretboard;
pub mod game;
pub mod input;
pub mod judge;
pub mod leaderboard;
pub mod logging;
pub mod render;
pub mod stats;
