mod admin;
mod alerts;
mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod favorites;
mod listings;
mod matching;
mod models;
mod notifications;
mod pagination;
mod profiles;
mod routes;
mod search;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::alerts::dispatcher::{AlertDispatcher, DispatchSettings};
use crate::alerts::repository::PgAlertStore;
use crate::alerts::scheduler::{self, DailySchedule};
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::matching::scoring::HeuristicScorer;
use crate::notifications::mail::MailNotifier;
use crate::notifications::store::DatabaseNotifier;
use crate::notifications::{FanoutNotifier, Notifier};
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "jobboard-api")]
#[command(about = "Job board API with job matching and daily alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and run the daily alert scheduler (default)
    Serve,
    /// Run one alert dispatch and exit
    SendAlerts {
        /// Dispatch time (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Board API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&db).await?;

    let notifier = build_notifier(&config, &db)?;
    let dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(PgAlertStore::new(db.clone())),
        notifier.clone(),
        DispatchSettings::from_config(&config),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::SendAlerts { at } => {
            let report = dispatcher.run_daily_dispatch(at.unwrap_or_else(Utc::now)).await?;
            info!(
                checked = report.alerts_checked,
                notified = report.notified,
                skipped = report.skipped,
                failed = report.failed,
                "alert dispatch finished"
            );
            Ok(())
        }
        Command::Serve => serve(config, db, notifier, dispatcher).await,
    }
}

/// In-app notifications always; mail on top when SMTP is configured.
fn build_notifier(config: &Config, db: &PgPool) -> Result<Arc<dyn Notifier>> {
    let mut channels: Vec<Arc<dyn Notifier>> = vec![Arc::new(DatabaseNotifier::new(db.clone()))];
    match &config.mail {
        Some(mail) => {
            channels.push(Arc::new(MailNotifier::new(mail, &config.app_url)?));
            info!(host = %mail.smtp_host, "mail notifications enabled");
        }
        None => info!("SMTP_HOST not set, mail notifications disabled"),
    }
    Ok(Arc::new(FanoutNotifier::new(channels)))
}

async fn serve(
    config: Config,
    db: PgPool,
    notifier: Arc<dyn Notifier>,
    dispatcher: Arc<AlertDispatcher>,
) -> Result<()> {
    let schedule = DailySchedule::parse(&config.alerts_daily_at)
        .map_err(anyhow::Error::msg)
        .context("Invalid ALERTS_DAILY_AT")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(scheduler::run(dispatcher, schedule, shutdown_rx));

    let state = AppState {
        db,
        config: config.clone(),
        scorer: Arc::new(HeuristicScorer::new()),
        notifier,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping alert scheduler");
    if shutdown_tx.send(true).is_err() {
        error!("alert scheduler already exited");
    }
    if let Err(e) = scheduler.await {
        error!("alert scheduler task failed: {e}");
    }
    Ok(())
}

/// Resolves on CTRL+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received CTRL+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
