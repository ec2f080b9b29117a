use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_MEDIA_URL_PREFIX: &str = "/media";

fn default_database() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("mediashelf").join("mediashelf.db"))
        .unwrap_or_else(|| PathBuf::from("mediashelf.db"))
}

/// `[extensions]` table of the config file. Each key replaces the built-in set.
#[derive(Deserialize, Default, Debug)]
pub struct FileExtensions {
    pub video: Option<Vec<String>>,
    pub book: Option<Vec<String>>,
    pub subtitle: Option<Vec<String>>,
    pub embedded_subtitles: Option<Vec<String>>,
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub media_url_prefix: Option<String>,
    pub scan_on_start: Option<bool>,
    #[serde(default)]
    pub extensions: FileExtensions,
}

/// Extension membership for each file kind, stored lowercase with a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSets {
    pub video: BTreeSet<String>,
    pub book: BTreeSet<String>,
    pub subtitle: BTreeSet<String>,
    /// Containers assumed to carry their own subtitle tracks. Heuristic only:
    /// most Matroska files embed subtitles, but the container is never inspected.
    pub embedded_subtitles: BTreeSet<String>,
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self {
            video: ext_set([".mp4", ".mkv"]),
            book: ext_set([".epub"]),
            subtitle: ext_set([".srt", ".vtt"]),
            embedded_subtitles: ext_set([".mkv"]),
        }
    }
}

impl ExtensionSets {
    fn apply(mut self, file: FileExtensions) -> Self {
        if let Some(v) = file.video {
            self.video = ext_set(v);
        }
        if let Some(v) = file.book {
            self.book = ext_set(v);
        }
        if let Some(v) = file.subtitle {
            self.subtitle = ext_set(v);
        }
        if let Some(v) = file.embedded_subtitles {
            self.embedded_subtitles = ext_set(v);
        }
        self
    }
}

/// Lowercase every entry and make sure it starts with a dot, so "MKV", "mkv"
/// and ".mkv" in a config file all mean the same thing.
pub fn ext_set<I, S>(exts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    exts.into_iter()
        .map(|e| e.as_ref().trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e != ".")
        .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
        .collect()
}

/// Everything the reconciler, the subtitle resolver and the HTTP layer need to
/// know about the library. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
    /// URL path under which library files are served, without trailing slash.
    pub media_url_prefix: String,
    pub extensions: ExtensionSets,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            media_url_prefix: DEFAULT_MEDIA_URL_PREFIX.to_string(),
            extensions: ExtensionSets::default(),
        }
    }

    /// Public URL of a library file given its subpath.
    pub fn media_url(&self, subpath: &str) -> String {
        format!("{}/{}", self.media_url_prefix, subpath.trim_start_matches('/'))
    }
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub bind: String,
    pub database: PathBuf,
    pub scan_on_start: bool,
    pub library: LibraryConfig,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        let media_url_prefix = file
            .media_url_prefix
            .map(|p| format!("/{}", p.trim_matches('/')))
            .unwrap_or_else(|| DEFAULT_MEDIA_URL_PREFIX.to_string());
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind: args
                .bind
                .clone()
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            database: args
                .database
                .clone()
                .or(file.database)
                .unwrap_or_else(default_database),
            scan_on_start: !args.no_scan && file.scan_on_start.unwrap_or(true),
            library: LibraryConfig {
                root: args.root.clone(),
                media_url_prefix,
                extensions: ExtensionSets::default().apply(file.extensions),
            },
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("mediashelf.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("mediashelf").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
