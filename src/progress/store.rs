use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// What survives a restart: solved object ids and the mistake count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(rename = "lahendatud", default)]
    pub solved: BTreeSet<String>,
    // Older saves predate the mistake counter.
    #[serde(rename = "vead", default)]
    pub mistakes: u32,
}

/// Flat JSON progress file, rewritten wholesale on every save.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing, unreadable or corrupt file is empty progress.
    pub fn load(&self) -> Progress {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Progress::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    pub fn save(&self, progress: &Progress) -> io::Result<()> {
        let mut json = serde_json::to_string_pretty(progress).map_err(io::Error::other)?;
        json.push('\n');
        std::fs::write(&self.path, json)
    }

    pub fn reset(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
