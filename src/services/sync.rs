// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity sync engine.
//!
//! Handles the core workflow:
//! 1. Refresh the Strava access token (remote modes only)
//! 2. Pick the fetch window from what is already stored
//! 3. Stream activities and upsert each one into an open transaction
//! 4. Commit once the whole stream is consumed, roll back on any failure

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use futures_util::StreamExt;

use crate::db::{ActivityStore, StoreTransaction};
use crate::error::{AppError, Result};
use crate::models::ActivityInput;
use crate::services::strava::{ActivityApi, FetchFilter};
use crate::services::tracks::TrackLoader;

/// How far before the newest stored activity an incremental sync restarts.
/// Strava may still add or backdate activities near the previous boundary.
pub const INCREMENTAL_OVERLAP_DAYS: i64 = 7;

/// Where a sync pass reads activities from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMode {
    /// Every remote activity up to now
    Full,
    /// Remote activities since the newest stored one, minus the overlap
    Incremental,
    /// GPX files in a directory
    LocalTracks(PathBuf),
}

/// Per-record progress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncProgress {
    Created,
    Updated,
}

impl SyncProgress {
    /// Terminal mark: `+` created, `.` updated.
    pub fn mark(self) -> &'static str {
        match self {
            SyncProgress::Created => "+",
            SyncProgress::Updated => ".",
        }
    }
}

/// Write one progress mark and flush so it shows up immediately.
pub fn write_progress<W: Write>(out: &mut W, progress: SyncProgress) -> io::Result<()> {
    out.write_all(progress.mark().as_bytes())?;
    out.flush()
}

/// Result of a completed sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { created: usize, updated: usize },
    /// The track directory held nothing usable; the store was not touched.
    NoTracks,
}

/// Pick the remote listing filter for a sync pass.
pub fn fetch_filter(store: &ActivityStore, force: bool, now: DateTime<Utc>) -> Result<FetchFilter> {
    if force {
        return Ok(FetchFilter::Before(now));
    }

    Ok(match store.max_start_date()? {
        Some(last) => FetchFilter::After(last - Duration::days(INCREMENTAL_OVERLAP_DAYS)),
        None => FetchFilter::Before(now),
    })
}

/// Syncs activities into an [`ActivityStore`].
pub struct SyncEngine<A> {
    api: A,
    refresh_token: String,
    tracks: TrackLoader,
}

impl<A: ActivityApi> SyncEngine<A> {
    pub fn new(api: A, refresh_token: String, tracks: TrackLoader) -> Self {
        Self {
            api,
            refresh_token,
            tracks,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Current refresh token. Strava may rotate it on every refresh.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Run one sync pass, reporting each upsert through `on_progress`.
    pub async fn sync(
        &mut self,
        store: &mut ActivityStore,
        mode: SyncMode,
        on_progress: impl FnMut(SyncProgress),
    ) -> Result<SyncOutcome> {
        match mode {
            SyncMode::Full => self.sync_remote(store, true, on_progress).await,
            SyncMode::Incremental => self.sync_remote(store, false, on_progress).await,
            SyncMode::LocalTracks(dir) => sync_from_tracks(store, &self.tracks, &dir, on_progress),
        }
    }

    async fn sync_remote(
        &mut self,
        store: &mut ActivityStore,
        force: bool,
        mut on_progress: impl FnMut(SyncProgress),
    ) -> Result<SyncOutcome> {
        let grant = self.api.refresh_access_token(&self.refresh_token).await?;
        if grant.refresh_token != self.refresh_token {
            tracing::info!("Strava rotated the refresh token");
            self.refresh_token = grant.refresh_token.clone();
        }
        tracing::info!(
            expires_at = %DateTime::from_timestamp(grant.expires_at, 0).unwrap_or_default(),
            "Access ok"
        );

        let filter = fetch_filter(store, force, Utc::now())?;
        tracing::info!(?filter, "Start syncing");

        let tx = store.transaction()?;
        let mut activities = self.api.activities(&grant.access_token, filter);
        let mut counts = (0, 0);

        let streamed: Result<()> = async {
            while let Some(summary) = activities.next().await {
                let created = upsert_input(&tx, ActivityInput::Strava(summary?))?;
                report(created, &mut counts, &mut on_progress);
            }
            Ok::<(), AppError>(())
        }
        .await;

        finish(tx, streamed, counts)
    }
}

/// Upsert every GPX track in `dir`. Shared by [`SyncMode::LocalTracks`] and
/// callers without Strava credentials.
pub fn sync_from_tracks(
    store: &mut ActivityStore,
    loader: &TrackLoader,
    dir: &Path,
    mut on_progress: impl FnMut(SyncProgress),
) -> Result<SyncOutcome> {
    let tracks = loader.load_tracks(dir)?;
    if tracks.is_empty() {
        tracing::info!(dir = %dir.display(), "No tracks found");
        return Ok(SyncOutcome::NoTracks);
    }

    let tx = store.transaction()?;
    let mut counts = (0, 0);

    let upserted: Result<()> = tracks.into_iter().try_for_each(|track| {
        let created = upsert_input(&tx, ActivityInput::Track(track))?;
        report(created, &mut counts, &mut on_progress);
        Ok::<(), AppError>(())
    });

    finish(tx, upserted, counts)
}

fn upsert_input(tx: &StoreTransaction<'_>, input: ActivityInput) -> Result<bool> {
    let record = input.into_record()?;
    let created = tx.upsert(&record)?;
    tracing::debug!(id = record.id, created, "Upserted activity");
    Ok(created)
}

fn report(created: bool, counts: &mut (usize, usize), on_progress: &mut impl FnMut(SyncProgress)) {
    if created {
        counts.0 += 1;
        on_progress(SyncProgress::Created);
    } else {
        counts.1 += 1;
        on_progress(SyncProgress::Updated);
    }
}

/// Commit when every upsert succeeded, otherwise discard the whole pass.
fn finish(
    tx: StoreTransaction<'_>,
    result: Result<()>,
    (created, updated): (usize, usize),
) -> Result<SyncOutcome> {
    match result {
        Ok(()) => {
            tx.commit()?;
            tracing::info!(created, updated, "Sync committed");
            Ok(SyncOutcome::Synced { created, updated })
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "Rollback after failed sync also failed");
            }
            tracing::warn!(error = %e, pending = created + updated, "Sync aborted, nothing committed");
            Err(e)
        }
    }
}
