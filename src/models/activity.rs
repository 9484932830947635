// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::strava::StravaActivitySummary;
use crate::services::tracks::Track;
use crate::time_utils::{format_local, parse_utc_rfc3339};

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Source-assigned ID (Strava activity ID, or track start in Unix ms)
    pub id: i64,
    /// Activity name/title
    pub name: String,
    /// Category (Run, Ride, Hike, etc.)
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Start instant in UTC
    pub start_date: DateTime<Utc>,
    /// Naive local start time, `YYYY-MM-DD HH:MM:SS`
    pub start_date_local: String,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: i64,
    /// Elapsed time in seconds
    pub elapsed_time: i64,
    /// Elevation gain in meters
    pub total_elevation_gain: f64,
    /// Average speed in m/s
    pub average_speed: f64,
    /// Encoded polyline (precision 5)
    pub summary_polyline: Option<String>,
}

/// Raw input from one of the supported sources, before normalization.
#[derive(Debug, Clone)]
pub enum ActivityInput {
    Strava(StravaActivitySummary),
    Track(Track),
}

impl ActivityInput {
    /// Normalize into the stored record shape.
    pub fn into_record(self) -> Result<ActivityRecord, AppError> {
        match self {
            ActivityInput::Strava(summary) => ActivityRecord::from_strava(&summary),
            ActivityInput::Track(track) => Ok(ActivityRecord::from_track(&track)),
        }
    }
}

impl ActivityRecord {
    /// Build a record from a Strava activity summary.
    pub fn from_strava(summary: &StravaActivitySummary) -> Result<Self, AppError> {
        let start_date = parse_utc_rfc3339(&summary.start_date).map_err(|e| {
            AppError::InvalidActivity(format!(
                "start_date {:?} of activity {}: {}",
                summary.start_date, summary.id, e
            ))
        })?;

        // Strava reports local time with a misleading `Z` suffix; only the
        // wall-clock part is meaningful.
        let start_date_local = chrono::DateTime::parse_from_rfc3339(&summary.start_date_local)
            .map_err(|e| {
                AppError::InvalidActivity(format!(
                    "start_date_local {:?} of activity {}: {}",
                    summary.start_date_local, summary.id, e
                ))
            })?
            .naive_local();

        let id = i64::try_from(summary.id).map_err(|_| {
            AppError::InvalidActivity(format!("activity id {} out of range", summary.id))
        })?;

        Ok(Self {
            id,
            name: summary.name.clone(),
            activity_type: summary.activity_type.clone(),
            start_date,
            start_date_local: format_local(start_date_local),
            distance: summary.distance,
            moving_time: summary.moving_time,
            elapsed_time: summary.elapsed_time,
            total_elevation_gain: summary.total_elevation_gain,
            average_speed: summary
                .average_speed
                .unwrap_or_else(|| average_speed(summary.distance, summary.moving_time)),
            summary_polyline: summary.polyline().map(str::to_string),
        })
    }

    /// Build a record from a parsed GPX track.
    ///
    /// The local start time is the wall clock in the offset the track recorded.
    pub fn from_track(track: &Track) -> Self {
        let elapsed_time = (track.end_time - track.start_time).num_seconds().max(0);

        Self {
            id: track.start_time.timestamp_millis(),
            name: track.name.clone(),
            activity_type: track.activity_type.clone(),
            start_date: track.start_time,
            start_date_local: format_local(track.start_local),
            distance: track.distance,
            moving_time: track.moving_time,
            elapsed_time,
            total_elevation_gain: track.elevation_gain,
            average_speed: average_speed(track.distance, track.moving_time),
            summary_polyline: track.polyline.clone(),
        }
    }
}

fn average_speed(distance: f64, moving_time: i64) -> f64 {
    if moving_time > 0 {
        distance / moving_time as f64
    } else {
        0.0
    }
}

/// A stored activity together with its read-time streak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedActivity {
    #[serde(flatten)]
    pub activity: ActivityRecord,
    /// Consecutive days, ending on this activity's local date
    pub streak: u32,
}
