use chrono::{DateTime, Utc};
use oaiserve_content::{
    DatabaseUpdater, DirectoryContentProvider, JsonContentObject, UpdateMode, UpdateReport,
};
use oaiserve_store_db::{OpenMode, StoreDb};
use tracing::info;

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Options of the `update` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UpdateOptions {
    pub(crate) from: Option<DateTime<Utc>>,
    pub(crate) mode: UpdateMode,
    /// Empty the database before importing.
    pub(crate) clear: bool,
}

/// Import the configured content directory into the database.
pub(crate) fn run(config: &Config, options: UpdateOptions) -> Result<UpdateReport> {
    let source = config
        .update
        .source
        .as_ref()
        .ok_or_else(|| ConfigError::Invalid {
            reason: "update.source is not set".to_string(),
        })?;

    let mut db = StoreDb::open(&config.database, OpenMode::Create)?;
    if options.clear {
        info!("Clearing {}", config.database.display());
        db.empty_database()?;
    }

    let provider = DirectoryContentProvider::new(source, config.update.extension.as_str());
    let mut updater = DatabaseUpdater::<_, JsonContentObject>::new(provider)
        .with_flush_threshold(config.update.flush_threshold);
    updater.update_provider(options.from)?;
    let report = updater.update_database(&mut db, options.mode)?;

    info!(
        "Updated {} of {} content objects from {} ({} ignored, {} errors)",
        report.updated,
        report.total,
        source.display(),
        report.ignored,
        report.errors
    );
    Ok(report)
}
