use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod ledger;
use ledger::{ReactionService, SqliteLedgerStore};

mod provider;
use provider::SpotifyClient;

mod server;
use server::{run_server, RequestsLoggingLevel};

mod sqlite_persistence;

mod user;
use user::{SqliteUserStore, UserStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database files.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to an optional TOML config file. File values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Page size for listing endpoints when the client does not pass one.
    #[clap(long, default_value_t = 50)]
    pub default_page_size: usize,

    /// Number of days to retain unused session tokens. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 90)]
    pub token_retention_days: u64,

    /// Interval in hours between token pruning runs. Only used if token_retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// Interval in minutes between counter reconciliation passes. Set to 0 to disable.
    #[clap(long, default_value_t = 15)]
    pub reconcile_interval_mins: u64,

    /// Override of the music provider API base URL.
    #[clap(long)]
    pub provider_api_base: Option<String>,

    /// Provider token used for metadata lookups. Enrichment is off when absent.
    #[clap(long)]
    pub provider_service_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        default_page_size: cli_args.default_page_size,
        token_retention_days: cli_args.token_retention_days,
        prune_interval_hours: cli_args.prune_interval_hours,
        reconcile_interval_mins: cli_args.reconcile_interval_mins,
        provider_api_base: cli_args.provider_api_base,
        provider_service_token: cli_args.provider_service_token,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite ledger database at {:?}...",
        config.ledger_db_path()
    );
    let ledger_store = Arc::new(SqliteLedgerStore::new(config.ledger_db_path())?);
    let reactions = Arc::new(ReactionService::new(ledger_store));

    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

    // Spawn background task for session token pruning if enabled
    if config.token_retention_days > 0 {
        let retention_days = config.token_retention_days;
        let interval_hours = config.prune_interval_hours;
        let pruning_user_store = user_store.clone();

        info!(
            "Session token pruning enabled: retaining {} days, pruning every {} hours",
            retention_days, interval_hours
        );

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_hours * 60 * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match pruning_user_store.prune_stale_session_tokens(retention_days) {
                    Ok(count) => {
                        if count > 0 {
                            info!("Pruned {} stale session tokens", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to prune session tokens: {}", e);
                    }
                }
            }
        });
    }

    // Spawn background task for counter reconciliation if enabled
    if config.reconcile_interval_mins > 0 {
        let interval_mins = config.reconcile_interval_mins;
        let reconciling_reactions = reactions.clone();

        info!(
            "Counter reconciliation enabled: running every {} minutes",
            interval_mins
        );

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_mins * 60);
            let mut ticker = tokio::time::interval(interval);

            ticker.tick().await;

            loop {
                ticker.tick().await;

                match reconciling_reactions.reconcile() {
                    Ok(count) => {
                        if count > 0 {
                            info!("Reconciled {} drifted counter rows", count);
                        }
                    }
                    Err(e) => {
                        error!("Counter reconciliation failed: {}", e);
                    }
                }
            }
        });
    }

    let spotify = Arc::new(SpotifyClient::new(
        config.provider_api_base.clone(),
        config.provider_service_token.clone(),
    )?);

    info!("Ready to serve at port {}!", config.port);
    run_server(
        reactions,
        user_store,
        spotify.clone(),
        spotify,
        config.logging_level,
        config.port,
        config.default_page_size,
    )
    .await
}
