#![warn(clippy::dbg_macro)]

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::Config;
use error::{IoErrorContext, RepositoryError, Result};
use oaiserve_content::{UpdateMode, parse_timestamp};
use oaiserve_store_db::{OpenMode, StoreDb};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod health;
mod oai;
mod update;

#[derive(Parser)]
#[command(name = "oaiserve", version, about = "OAI-PMH repository server")]
struct Cli {
    /// Settings file; defaults to ./settings.toml if present
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the OAI-PMH endpoint (default)
    Serve,
    /// Import the configured content directory into the database
    Update {
        /// Only import content modified since this date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_from)]
        from: Option<DateTime<Utc>>,
        /// Log and count failing content objects instead of aborting
        #[arg(long)]
        suppress_errors: bool,
        /// Empty the database first
        #[arg(long)]
        clear: bool,
    },
}

fn parse_from(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("not a date: {value}"))
}

#[derive(Debug)]
struct HttpError {
    err: RepositoryError,
}

impl Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for HttpError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<RepositoryError> for HttpError {
    fn from(err: RepositoryError) -> HttpError {
        HttpError { err }
    }
}

type ServerResult = std::result::Result<HttpResponse, HttpError>;

async fn serve(config: Config) -> Result<()> {
    let feed = config.build_feed()?;
    let db = StoreDb::open(&config.database, OpenMode::Create)?;
    info!(
        "serving {} records from {}",
        db.record_count()?,
        config.database.display()
    );
    let state = web::Data::new(oai::OaiState::new(db, feed));

    info!("listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/oai", web::get().to(oai::get))
            .route("/oai", web::post().to(oai::post))
            .route("/health", web::get().to(health::get))
    })
    // default is 5 seconds, which is too small for large ListRecords pages on slow machines
    .client_request_timeout(Duration::from_secs(30))
    .workers(config.workers)
    .bind(config.bind.clone())
    .io_context("Failed to bind server")?
    .run()
    .await
    .io_context("Failed to start server")
}

async fn inner_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Update {
            from,
            suppress_errors,
            clear,
        } => {
            let options = update::UpdateOptions {
                from,
                mode: if suppress_errors {
                    UpdateMode::Suppress
                } else {
                    UpdateMode::Abort
                },
                clear,
            };
            update::run(&config, options).map(|_| ())
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    inner_main().await.map_err(std::io::Error::other)
}
