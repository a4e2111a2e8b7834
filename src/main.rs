use anyhow::{Context, Result};
use clap::Parser;
use fretboard::{app, config, logging};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "fretboard")]
#[command(about = "Terminal rhythm game: hit the notes as they cross the bar", long_about = None)]
struct Cli {
    /// Player name for the highscore list (prompted when omitted)
    #[arg(long)]
    name: Option<String>,

    /// Ticks per second, 1..=12
    #[arg(long)]
    speed: Option<u32>,

    /// Round length in seconds
    #[arg(long)]
    round_secs: Option<u64>,

    /// Chance (0..=1) that a tick brings a new note
    #[arg(long)]
    difficulty: Option<f64>,

    /// Lane keys, left to right. Example: dfjk
    #[arg(long)]
    lanes: Option<String>,

    /// Seed for note generation (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Start the round immediately instead of on the help screen
    #[arg(long, default_value_t = false)]
    no_pause: bool,

    /// Force monochrome (no colors)
    #[arg(long, default_value_t = false)]
    mono: bool,

    /// Highscore file (defaults to the data directory)
    #[arg(long)]
    highscores: Option<PathBuf>,

    /// Directory for settings, highscores and the log file
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, s: &mut config::Settings) {
        if let Some(v) = self.speed {
            s.speed = v;
        }
        if let Some(v) = self.round_secs {
            s.round_secs = v;
        }
        if let Some(v) = self.difficulty {
            s.note_probability = v;
        }
        if let Some(v) = &self.lanes {
            s.lanes = v.clone();
        }
        if self.no_pause {
            s.start_paused = false;
        }
        if self.mono {
            s.enable_color = false;
        }
    }
}

fn prompt_name() -> Result<String> {
    print!("Enter your name: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading player name")?;
    Ok(line)
}

fn clean_name(raw: &str) -> String {
    let name: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let name = name.trim();
    if name.is_empty() {
        "anonymous".to_string()
    } else {
        name.to_string()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = config::project_paths(cli.data_dir.as_deref())?;
    logging::init(&paths.log_path)?;

    let mut settings = config::load_settings(&paths.settings_path)?;
    cli.apply(&mut settings);
    let settings = settings.normalized();
    logging::set_level(settings.log_filter());

    let name = match &cli.name {
        Some(n) => clean_name(n),
        None => clean_name(&prompt_name()?),
    };

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0xC0FFEE)
    });

    app::run(app::Options {
        name,
        settings,
        seed,
        highscores_path: cli.highscores.unwrap_or(paths.highscores_path),
    })
    .await
}
