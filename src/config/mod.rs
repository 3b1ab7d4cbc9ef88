use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub catalog: Option<String>,
    pub site_root: Option<String>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    #[serde(alias = "debounce")]
    pub debounce_ms: Option<u64>,
    pub synthesize_history: Option<bool>,
    pub listing_page: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found '{path}'")]
    NotFound { path: String },

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

const CONFIG_DIR: &str = ".romcatalog";
const CONFIG_FILE: &str = "config.yml";

/// `~/.romcatalog/config.yml`, when a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Replaces a leading `~` component with the home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

pub fn expand_tilde_string(raw: &str) -> String {
    expand_tilde(raw).display().to_string()
}

/// Reads the YAML config at `path`. A missing file yields the empty
/// config only when `allow_missing` is set.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    let shown = path.display().to_string();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return if allow_missing {
                Ok(ConfigFile::default())
            } else {
                Err(ConfigError::NotFound { path: shown })
            };
        }
        Err(source) => return Err(ConfigError::Read { path: shown, source }),
    };
    parse_config(&contents).map_err(|source| ConfigError::Parse { path: shown, source })
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    // An empty or comment-only file is a valid, empty config.
    if contents.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    }) {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
}

pub fn default_config_yaml() -> String {
    r#"# romcatalog config
#
# Location (default):
#   ~/.romcatalog/config.yml

# Catalog resource: an http(s) URL or a local path.
# Both a flat array and {"devices": [...]} are accepted.
catalog: ./data/devices.json

# Base for relative per-device "dataFile" references.
# Defaults to the site the catalog belongs to: the catalog's directory,
# or its parent when the catalog sits in a data/ folder.
# site_root: https://example.com/

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080
# user_agent: romcatalog

# Output (optional)
# output: ./device.html
# output_format: text
no_color: false

# Search input quiescence interval for interactive mode.
debounce_ms: 300

# Derive two prior versions for devices without a build list.
synthesize_history: false

# Page the error panel links back to.
listing_page: download.html
"#
    .to_string()
}

/// Writes the commented default config unless `path` already exists.
/// Returns whether a file was written.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    let write_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, default_config_yaml()).map_err(write_err)?;
    Ok(true)
}
