use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// The persisted watchlist: a single file holding a JSON array of symbols.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WatchlistStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or malformed content reads as an empty list.
    pub fn load(&self) -> Vec<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                log::warn!("reading {}: {err}", self.path.display());
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(symbols) => symbols,
            Err(err) => {
                log::warn!("ignoring malformed watchlist in {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Replaces the persisted list. The new content is written to a sibling
    /// file and renamed over the old one, so readers never see a partial write.
    pub fn save(&self, symbols: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(symbols)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
