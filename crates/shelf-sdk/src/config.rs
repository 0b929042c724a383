use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, LibraryResult};

/// Where the catalog keeps its data and how it pages listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database file.
    pub database: PathBuf,
    /// Upload root holding `<cover_id>.<ext>` artifacts.
    pub covers_dir: PathBuf,
    /// Largest accepted cover upload, in bytes.
    pub max_cover_bytes: u64,
    pub books_per_page: u32,
    pub reviews_per_page: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("shelf.db"),
            covers_dir: PathBuf::from("static/covers"),
            max_cover_bytes: 16 * 1024 * 1024,
            books_per_page: 10,
            reviews_per_page: 20,
        }
    }
}

impl LibraryConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> LibraryResult<Self> {
        toml::from_str(text).map_err(|e| LibraryError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> LibraryResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LibraryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> LibraryResult<String> {
        toml::to_string_pretty(self).map_err(|e| LibraryError::Config(e.to_string()))
    }

    /// Resolve relative paths against `base` (typically the config file's directory).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.database.is_relative() {
            self.database = base.join(&self.database);
        }
        if self.covers_dir.is_relative() {
            self.covers_dir = base.join(&self.covers_dir);
        }
        self
    }
}
