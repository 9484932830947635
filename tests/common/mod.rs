// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use streak_sync::config::Config;
use streak_sync::db::ActivityStore;
use streak_sync::error::AppError;
use streak_sync::models::ActivityRecord;
use streak_sync::AppState;
use streak_sync::services::strava::{
    ActivityApi, FetchFilter, StravaActivitySummary, TokenRefreshResponse,
};

/// Build a stored record starting at `start` (UTC) with the same local time.
#[allow(dead_code)]
pub fn record(id: i64, activity_type: &str, start: DateTime<Utc>) -> ActivityRecord {
    ActivityRecord {
        id,
        name: format!("{} {}", activity_type, id),
        activity_type: activity_type.to_string(),
        start_date: start,
        start_date_local: start.format("%Y-%m-%d %H:%M:%S").to_string(),
        distance: 5000.0,
        moving_time: 1500,
        elapsed_time: 1600,
        total_elevation_gain: 25.0,
        average_speed: 5000.0 / 1500.0,
        summary_polyline: None,
    }
}

#[allow(dead_code)]
pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Router over an in-memory store seeded with `records`.
#[allow(dead_code)]
pub fn create_test_app(records: &[ActivityRecord]) -> (axum::Router, Arc<AppState>) {
    let mut store = ActivityStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    for r in records {
        tx.upsert(r).unwrap();
    }
    tx.commit().unwrap();

    let state = Arc::new(AppState::new(Config::default(), store));
    let app = streak_sync::routes::create_router(state.clone());
    (app, state)
}

/// Strava list-endpoint shape for `start` (local time = UTC).
#[allow(dead_code)]
pub fn summary(id: u64, activity_type: &str, start: DateTime<Utc>) -> StravaActivitySummary {
    let iso = start.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    StravaActivitySummary {
        id,
        name: format!("{} {}", activity_type, id),
        activity_type: activity_type.to_string(),
        start_date: iso.clone(),
        start_date_local: iso,
        distance: 4000.0,
        moving_time: 1200,
        elapsed_time: 1300,
        total_elevation_gain: 12.0,
        average_speed: None,
        map: None,
    }
}

/// Scripted remote source. Records every call so tests can assert on them.
#[allow(dead_code)]
pub struct MockApi {
    refresh: Result<TokenRefreshResponse, String>,
    items: Vec<Result<StravaActivitySummary, String>>,
    pub filters: Mutex<Vec<FetchFilter>>,
    pub access_tokens: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn new(items: Vec<StravaActivitySummary>) -> Self {
        Self::scripted(items.into_iter().map(Ok).collect())
    }

    /// `Err` entries become mid-stream failures at that position.
    pub fn scripted(items: Vec<Result<StravaActivitySummary, String>>) -> Self {
        Self {
            refresh: Ok(TokenRefreshResponse {
                access_token: "access-1".to_string(),
                refresh_token: "refresh-2".to_string(),
                expires_at: 1_900_000_000,
            }),
            items,
            filters: Mutex::new(Vec::new()),
            access_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_refresh(message: &str) -> Self {
        Self {
            refresh: Err(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.filters.lock().unwrap().len()
    }
}

impl ActivityApi for MockApi {
    async fn refresh_access_token(
        &self,
        _refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        self.refresh.clone().map_err(AppError::Credential)
    }

    fn activities<'a>(
        &'a self,
        access_token: &'a str,
        filter: FetchFilter,
    ) -> BoxStream<'a, Result<StravaActivitySummary, AppError>> {
        self.filters.lock().unwrap().push(filter);
        self.access_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());

        let items: Vec<_> = self
            .items
            .iter()
            .cloned()
            .map(|item| item.map_err(AppError::StravaApi))
            .collect();
        stream::iter(items).boxed()
    }
}
