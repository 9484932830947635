//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present.

use std::env;
use std::path::PathBuf;

/// Strava OAuth credentials used by remote syncs.
#[derive(Debug, Clone)]
pub struct StravaCredentials {
    /// Strava OAuth client ID (public)
    pub client_id: String,
    /// Strava OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token of the athlete
    pub refresh_token: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Default directory for GPX imports
    pub gpx_dir: PathBuf,
    /// Category used for streaks
    pub streak_sport_type: String,
    /// Category assigned to imported GPX tracks
    pub gpx_sport_type: String,
    /// HTTP server port
    pub port: u16,

    strava_client_id: Option<String>,
    strava_client_secret: Option<String>,
    strava_refresh_token: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/activities.db"),
            gpx_dir: PathBuf::from("GPX_OUT"),
            streak_sport_type: "Run".to_string(),
            gpx_sport_type: "Run".to_string(),
            port: 8080,
            strava_client_id: Some("test_client_id".to_string()),
            strava_client_secret: Some("test_secret".to_string()),
            strava_refresh_token: Some("test_refresh_token".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT", v))?,
            Err(_) => 8080,
        };

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/activities.db")),
            gpx_dir: env::var("GPX_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("GPX_OUT")),
            streak_sport_type: non_empty("STREAK_SPORT_TYPE").unwrap_or_else(|| "Run".to_string()),
            gpx_sport_type: non_empty("GPX_SPORT_TYPE").unwrap_or_else(|| "Run".to_string()),
            port,

            strava_client_id: non_empty("STRAVA_CLIENT_ID"),
            strava_client_secret: non_empty("STRAVA_CLIENT_SECRET"),
            strava_refresh_token: non_empty("STRAVA_REFRESH_TOKEN"),
        })
    }

    /// Strava credentials, required for remote syncs only.
    pub fn strava(&self) -> Result<StravaCredentials, ConfigError> {
        Ok(StravaCredentials {
            client_id: self
                .strava_client_id
                .clone()
                .ok_or(ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            client_secret: self
                .strava_client_secret
                .clone()
                .ok_or(ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            refresh_token: self
                .strava_refresh_token
                .clone()
                .ok_or(ConfigError::Missing("STRAVA_REFRESH_TOKEN"))?,
        })
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
