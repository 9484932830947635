// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Streak-Sync: keep a local copy of your activities and track daily streaks
//!
//! This crate syncs activities from Strava (or a directory of GPX files) into
//! a local SQLite store and annotates them with consecutive-day streaks.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ActivityStore;
use tokio::sync::Mutex;

/// Shared application state for the HTTP API.
pub struct AppState {
    pub config: Config,
    /// Requests are serialized on the single store handle.
    pub store: Mutex<ActivityStore>,
}

impl AppState {
    pub fn new(config: Config, store: ActivityStore) -> Self {
        Self {
            config,
            store: Mutex::new(store),
        }
    }
}
