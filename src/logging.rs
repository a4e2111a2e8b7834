use anyhow::{Context, Result};
use std::{fs::OpenOptions, path::Path};

/// Sends log output to `path`; the terminal itself belongs to the game.
///
/// Everything is let through at install time and the real level is applied
/// with `set_level` once settings are known. `RUST_LOG` overrides both.
pub fn init(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
    set_level(log::LevelFilter::Warn);
    Ok(())
}

pub fn set_level(level: log::LevelFilter) {
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(level);
    }
}
