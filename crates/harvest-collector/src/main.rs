//! Collector binary for the Q&A harvester.
//!
//! Two modes, picked by the first argument:
//!
//! - `collect` (default): run or resume a collection and land it in
//!   `PostgreSQL`. Exits non-zero when the run fails; the checkpoint then
//!   records `FAILED` and the next invocation resumes from it.
//! - `serve`: run the last-update read API.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `harvest-config.yaml` (or `HARVEST_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the `PostgreSQL` pool and run migrations
//! 4. Build the API client and domain query layer
//! 5. Load the checkpoint
//! 6. Run the collector
//! 7. Log the result

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use harvest_client::{CatalogApi, ReqwestTransport, RequestClient};
use harvest_core::checkpoint::DEFAULT_SAVE_EVERY;
use harvest_core::{CollectionCheckpoint, Collector, HarvestConfig};
use harvest_db::{BatchWriter, PostgresConfig, PostgresPool};
use harvest_observer::{AppState, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::CollectorError;

/// Config file used when `HARVEST_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "harvest-config.yaml";

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Collect,
    Serve,
}

impl Mode {
    fn from_arg(arg: Option<&str>) -> Result<Self, CollectorError> {
        match arg {
            None | Some("collect") => Ok(Self::Collect),
            Some("serve") => Ok(Self::Serve),
            Some(other) => Err(CollectorError::Usage(other.to_owned())),
        }
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let arg = std::env::args().nth(1);
    let mode = Mode::from_arg(arg.as_deref())?;

    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_target(true)
        .init();

    info!(mode = ?mode, "harvest-collector starting");
    info!(
        site = config.api.site,
        tagged = config.api.tagged.as_deref().unwrap_or(""),
        page_size = config.collection.page_size,
        max_attempts = config.retry.max_attempts,
        checkpoint = %config.checkpoint.path.display(),
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL.
    let pool = PostgresPool::connect(&PostgresConfig::from(&config.database)).await?;
    pool.run_migrations().await?;

    let result = match mode {
        Mode::Collect => collect(&config, &pool).await,
        Mode::Serve => serve(&config, &pool).await,
    };

    pool.close().await;
    if let Err(e) = &result {
        error!(error = %e, "harvest-collector exiting with failure");
    }
    result?;
    Ok(())
}

/// Run or resume a collection.
async fn collect(config: &HarvestConfig, pool: &PostgresPool) -> Result<(), CollectorError> {
    // 4. Build the API client and query layer.
    let transport = ReqwestTransport::new(&config.api)?;
    let client = RequestClient::new(transport, config.api.clone(), config.retry);
    let api = CatalogApi::new(client, config.collection.page_size);

    // 5. Load the checkpoint.
    let save_every = usize::try_from(config.collection.save_every).unwrap_or(DEFAULT_SAVE_EVERY);
    let checkpoint = CollectionCheckpoint::load(&config.checkpoint.path).with_save_every(save_every);
    let writer = BatchWriter::from_config(pool.pool().clone(), &config.database);

    // 6. Run the collector.
    let mut collector = Collector::new(api, writer, checkpoint, &config.collection);
    collector.collect_data().await?;

    // 7. Log the result.
    info!(
        questions = collector.questions().len(),
        answers = collector.answers().len(),
        comments = collector.comments().len(),
        no_answer_ratio = collector.no_answer_ratio().unwrap_or(0.0),
        "collection complete"
    );
    Ok(())
}

/// Serve the last-update read API until terminated.
async fn serve(config: &HarvestConfig, pool: &PostgresPool) -> Result<(), CollectorError> {
    let state = Arc::new(AppState::from_pool(pool.pool().clone()));
    harvest_observer::start_server(&ServerConfig::from(&config.observer), state).await?;
    Ok(())
}

/// Load `harvest-config.yaml`, or the file named by `HARVEST_CONFIG`.
///
/// A missing default file falls back to built-in defaults (with environment
/// overrides applied); a missing explicitly named file is an error.
fn load_config() -> Result<HarvestConfig, CollectorError> {
    let explicit = std::env::var_os("HARVEST_CONFIG").map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if explicit.is_none() && !path.exists() {
        return Ok(HarvestConfig::parse("")?);
    }
    Ok(HarvestConfig::from_file(&path)?)
}
