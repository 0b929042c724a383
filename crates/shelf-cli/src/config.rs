use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shelf_sdk::LibraryConfig;
use shelf_server::ServerConfig;

/// Contents of `shelf.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    pub library: LibraryConfig,
    pub server: ServerConfig,
}

impl ShelfConfig {
    /// Load `path`, or defaults when it does not exist. Relative data paths
    /// are resolved against the file's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<Self>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.library = config.library.rooted_at(base);
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
