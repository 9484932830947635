// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak-Sync command line
//!
//! Syncs activities from Strava or GPX files into the local database,
//! prints the streak-annotated history, or serves it over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use streak_sync::{
    config::Config,
    db::ActivityStore,
    services::{
        sync_from_tracks, write_progress, StravaClient, StreakCalculator, SyncEngine, SyncMode,
        SyncOutcome, SyncProgress, TrackLoader,
    },
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "streak-sync")]
#[command(author, version, about = "Sync activities and track daily streaks", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync activities from Strava
    Sync {
        /// Re-fetch the full history instead of resuming
        #[arg(long)]
        force: bool,
    },

    /// Import GPX tracks from a directory
    Gpx {
        /// Track directory (defaults to GPX_DIR)
        dir: Option<PathBuf>,
    },

    /// Print activities with their streaks as JSON
    Load {
        /// Category to compute streaks for (defaults to STREAK_SPORT_TYPE)
        #[arg(long)]
        sport_type: Option<String>,
    },

    /// Serve the activity API
    Serve {
        /// Port to listen on (defaults to PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs)?;

    let config = Config::from_env().context("Failed to load configuration")?;
    let mut store = ActivityStore::open(&config.database_path)?;

    match cli.command {
        Commands::Sync { force } => {
            let credentials = config.strava()?;
            let client = StravaClient::new(credentials.client_id, credentials.client_secret);
            let mut engine = SyncEngine::new(
                client,
                credentials.refresh_token.clone(),
                TrackLoader::new(config.gpx_sport_type.as_str()),
            );

            let mode = if force {
                SyncMode::Full
            } else {
                SyncMode::Incremental
            };

            match engine.sync(&mut store, mode, print_progress).await {
                Ok(outcome) => finish_line(outcome),
                Err(e) if e.is_strava_token_error() => {
                    tracing::error!(error = %e, "Strava rejected the credentials, re-authorize the app");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }

            if engine.refresh_token() != credentials.refresh_token {
                tracing::warn!("Strava issued a new refresh token, update STRAVA_REFRESH_TOKEN");
            }
        }
        Commands::Gpx { dir } => {
            let dir = dir.unwrap_or_else(|| config.gpx_dir.clone());
            let loader = TrackLoader::new(config.gpx_sport_type.as_str());
            let outcome = sync_from_tracks(&mut store, &loader, &dir, print_progress)?;
            finish_line(outcome);
        }
        Commands::Load { sport_type } => {
            let calculator =
                StreakCalculator::new(sport_type.unwrap_or_else(|| config.streak_sport_type.clone()));
            let activities = calculator.compute_annotated_list(&store)?;
            println!("{}", serde_json::to_string_pretty(&activities)?);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let state = Arc::new(AppState::new(config, store));
            let app = streak_sync::routes::create_router(state);

            let addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(address = %addr, "Server listening");

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// One character per record: `+` created, `.` updated.
fn print_progress(progress: SyncProgress) {
    if let Err(e) = write_progress(&mut std::io::stdout(), progress) {
        tracing::debug!(error = %e, "Failed to write sync progress");
    }
}

fn finish_line(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Synced { created, updated } => {
            println!();
            tracing::info!(created, updated, "Sync complete");
        }
        SyncOutcome::NoTracks => println!("No tracks found."),
    }
}

/// Initialize logging to stderr, leaving stdout for progress and output.
fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("streak_sync=info".parse()?)
        .add_directive("info".parse()?);

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
    Ok(())
}
