use crate::config::atomic_rename;
use crate::error::LeaderboardError;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub speed: u32,
    pub score: i64,
    pub correct: u32,
    pub total: u32,
}

impl Entry {
    // Control characters would split the record across lines.
    fn to_line(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        format!(
            "{},{},{},{},{}\n",
            name, self.speed, self.score, self.correct, self.total
        )
    }

    // Numbers are taken from the right so a comma inside the name survives.
    fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.rsplitn(5, ',');
        let total = fields.next()?.trim().parse().ok()?;
        let correct = fields.next()?.trim().parse().ok()?;
        let score = fields.next()?.trim().parse().ok()?;
        let speed = fields.next()?.trim().parse().ok()?;
        let name = fields.next()?.to_string();
        Some(Self {
            name,
            speed,
            score,
            correct,
            total,
        })
    }
}

/// Finished rounds, best score first, persisted one line per entry.
pub struct Leaderboard {
    path: PathBuf,
    entries: Vec<Entry>,
    show: usize,
}

impl Leaderboard {
    /// Opens the file at `path`; a missing file is an empty board.
    pub fn open(path: impl Into<PathBuf>, show: usize) -> Result<Self, LeaderboardError> {
        let mut board = Self {
            path: path.into(),
            entries: Vec::new(),
            show: show.max(1),
        };
        board.load()?;
        Ok(board)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<Vec<Entry>, LeaderboardError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(LeaderboardError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = Entry::parse_line(line).ok_or_else(|| LeaderboardError::Malformed {
                path: self.path.clone(),
                line: i + 1,
            })?;
            entries.push(entry);
        }
        sort_desc(&mut entries);
        self.entries = entries;
        Ok(self.entries.clone())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Records a round, rewrites the file and returns the top entries for its speed.
    pub fn add(&mut self, entry: Entry) -> Result<Vec<Entry>, LeaderboardError> {
        let speed = entry.speed;
        self.entries.push(entry);
        sort_desc(&mut self.entries);
        self.save()?;
        log::info!(
            "leaderboard now holds {} entries ({})",
            self.entries.len(),
            self.path.display()
        );
        Ok(self.top(Some(speed)))
    }

    pub fn top(&self, speed: Option<u32>) -> Vec<Entry> {
        self.entries
            .iter()
            .filter(|e| speed.map_or(true, |s| e.speed == s))
            .take(self.show)
            .cloned()
            .collect()
    }

    fn save(&self) -> Result<(), LeaderboardError> {
        let write_err = |source| LeaderboardError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(write_err)?;
            }
        }
        let data: String = self.entries.iter().map(Entry::to_line).collect();
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data).map_err(write_err)?;
        atomic_rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

// Stable, so equal scores keep the order they were recorded in.
fn sort_desc(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
}
