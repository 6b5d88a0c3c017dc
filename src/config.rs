use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const DEFAULT_HTTP_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    database: String,
    #[serde(default)]
    youtube: YoutubeConfig,
    #[serde(default)]
    http: HttpConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.local/share/playlist-tracker/playlists.db".to_string(),
            youtube: YoutubeConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-tracker").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("No config directory on this platform")?;

        Self::from_file(&config_path)
    }

    /// Write the default config to the default location, leaving an
    /// existing file untouched.
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::default().write_if_missing(&config_path)?;
        Ok(config_path)
    }

    fn write_if_missing(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            log::info!("Config already exists at {}", path.display());
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(true)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn database_path(&self) -> PathBuf {
        Self::expand_path(&self.database)
    }

    pub fn youtube_base_url(&self) -> Result<Url> {
        let raw = self
            .youtube
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_YOUTUBE_BASE_URL);

        // `Url::join` drops the last path segment unless it ends with a slash.
        let raw = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };

        Url::parse(&raw).wrap_err_with(|| format!("Invalid YouTube base url: {raw}"))
    }

    /// API key from the config file. `--api-key` / `YOUTUBE_API_KEY` take
    /// precedence on the command line.
    pub fn api_key(&self) -> Option<&str> {
        self.youtube.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn http_port(&self) -> u16 {
        self.http.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_from_file_with_all_sections() {
        let (_dir, path) = write_config(
            r#"
database = "/tmp/playlists.db"

[youtube]
api_key = "secret"
base_url = "http://localhost:9000/youtube/v3"

[http]
port = 8080
"#,
        );

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/tmp/playlists.db"));
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.http_port(), 8080);
        assert_eq!(
            config.youtube_base_url().unwrap().as_str(),
            "http://localhost:9000/youtube/v3/"
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let (_dir, path) = write_config(r#"database = "playlists.db""#);

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.http_port(), 3000);
        assert_eq!(
            config.youtube_base_url().unwrap().as_str(),
            DEFAULT_YOUTUBE_BASE_URL
        );
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());

        let (_dir, path) = write_config("database = [");
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        assert_eq!(Config::expand_path("~/data/p.db"), home.join("data/p.db"));
        assert_eq!(Config::expand_path("/abs/p.db"), PathBuf::from("/abs/p.db"));
    }

    #[test]
    fn test_write_if_missing_round_trips_and_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(Config::default().write_if_missing(&path).unwrap());
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, r#"database = "other.db""#).unwrap();
        assert!(!Config::default().write_if_missing(&path).unwrap());
        assert_eq!(
            Config::from_file(&path).unwrap().database_path(),
            PathBuf::from("other.db")
        );
    }
}
