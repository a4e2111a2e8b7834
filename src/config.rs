use crate::clock::{clamp_speed, DEFAULT_ROUND, DEFAULT_SPEED};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lanes: String,
    pub speed: u32,
    pub round_secs: u64,
    pub note_probability: f64,
    pub leaderboard_size: usize,
    pub start_paused: bool,
    pub enable_color: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lanes: "dfjk".to_string(),
            speed: DEFAULT_SPEED,
            round_secs: DEFAULT_ROUND.as_secs(),
            note_probability: 0.5,
            leaderboard_size: 5,
            start_paused: true,
            enable_color: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Pulls out-of-range numbers back into something playable.
    pub fn normalized(mut self) -> Self {
        self.speed = clamp_speed(self.speed);
        self.round_secs = self.round_secs.max(1);
        self.note_probability = if self.note_probability.is_finite() {
            self.note_probability.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.leaderboard_size = self.leaderboard_size.max(1);
        self
    }

    pub fn round_length(&self) -> Duration {
        Duration::from_secs(self.round_secs)
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub highscores_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings_path: dir.join("settings.json"),
            highscores_path: dir.join("highscores"),
            log_path: dir.join("fretboard.log"),
        }
    }
}

/// Resolves the data directory, `override_dir` winning over the platform default.
pub fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "fretboard", "Fretboard")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths::in_dir(&dir))
}

/// Reads settings, writing the defaults out on first run so they can be edited.
pub fn load_settings(path: &Path) -> Result<Settings> {
    match fs::read_to_string(path) {
        Ok(s) => {
            let settings: Settings = serde_json::from_str(&s)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(settings.normalized())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let settings = Settings::default();
            save_settings_atomic(path, &settings)?;
            log::info!("wrote default settings to {}", path.display());
            Ok(settings)
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

pub fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // Windows will not rename over an existing file.
    if cfg!(windows) && to.exists() {
        fs::remove_file(to)?;
    }
    fs::rename(from, to)
}
