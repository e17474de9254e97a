use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Store error: {0}")]
    Store(#[from] oaiserve_store_db::Error),

    #[error("Content error: {0}")]
    Content(#[from] oaiserve_content::Error),

    #[error("OAI-PMH error: {0}")]
    Feed(#[from] oaiserve_feed::OaiError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid feed: {0}")]
    Feed(#[from] oaiserve_feed::FeedConfigError),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Request handler failed: {reason}")]
    Handler { reason: String },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Extension trait for adding context to IO errors
pub trait IoErrorContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RepositoryError::Io {
            context: context.into(),
            source: e,
        })
    }
}
