// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod streak;
pub mod strava;
pub mod sync;
pub mod tracks;

pub use streak::StreakCalculator;
pub use strava::{ActivityApi, FetchFilter, StravaClient};
pub use sync::{
    sync_from_tracks, write_progress, SyncEngine, SyncMode, SyncOutcome, SyncProgress,
};
pub use tracks::{Track, TrackLoader};
