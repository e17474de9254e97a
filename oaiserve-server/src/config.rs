use crate::error::{ConfigError, RepositoryError, Result};
use oaiserve_feed::{Feed, FeedConfig, FormatRegistry};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

fn default_bind() -> String {
    "[::]:5000".into()
}

fn default_workers() -> usize {
    4
}

fn default_database() -> PathBuf {
    PathBuf::from("oaiserve.sqlite")
}

fn default_extension() -> String {
    "json".into()
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default = "default_bind")]
    pub(crate) bind: String,
    #[serde(default = "default_workers")]
    pub(crate) workers: usize,
    #[serde(default = "default_database")]
    pub(crate) database: PathBuf,

    #[serde(default)]
    pub(crate) feed: FeedConfig,
    #[serde(default)]
    pub(crate) update: UpdateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            workers: default_workers(),
            database: default_database(),
            feed: FeedConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

/// Where `oaiserve update` reads content from.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct UpdateConfig {
    #[serde(default)]
    pub(crate) source: Option<PathBuf>,
    #[serde(default = "default_extension")]
    pub(crate) extension: String,
    /// Flush every this many records instead of once at the end.
    #[serde(default)]
    pub(crate) flush_threshold: Option<usize>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            source: None,
            extension: default_extension(),
            flush_threshold: None,
        }
    }
}

impl Config {
    pub(crate) fn load(settings_file: &Path) -> Result<Config> {
        let contents = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.display().to_string(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Config> {
        let settings: Config =
            toml::from_str(contents).map_err(|e| RepositoryError::from(ConfigError::from(e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                reason: "workers must be greater than 0".to_string(),
            }
            .into());
        }
        if self.update.flush_threshold == Some(0) {
            return Err(ConfigError::Invalid {
                reason: "update.flush_threshold must be greater than 0".to_string(),
            }
            .into());
        }
        self.feed
            .validate(&FormatRegistry::with_defaults())
            .map_err(ConfigError::from)?;
        Ok(())
    }

    pub(crate) fn build_feed(&self) -> Result<Feed> {
        Feed::new(self.feed.clone(), FormatRegistry::with_defaults())
            .map_err(|e| ConfigError::from(e).into())
    }
}

/// Resolve the settings file: an explicit path (`--config` or `CONFIG_FILE`),
/// else `settings.toml` in the working directory, else defaults.
pub(crate) fn load(settings_file: Option<&Path>) -> Result<Config> {
    match settings_file {
        Some(path) => Config::load(path),
        None if Path::new("settings.toml").exists() => Config::load(Path::new("settings.toml")),
        None => Ok(Config::default()),
    }
}
