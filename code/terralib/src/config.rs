use anyhow::Context;
use serde;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Listen on all interfaces, on Flask's default port, which is where the
// deployed device firmware expects the server to be.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

// Settings for the http server. Every field is optional in the toml file and
// falls back to its default.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: String,
    // Directory holding data.json and control.json.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR.to_string(),
            data_dir: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    // Reads the config file if there is one. A missing file means defaults; a
    // file that exists but doesn't parse is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
