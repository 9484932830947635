// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPX track loading.
//!
//! Every `*.gpx` file in a directory becomes one [`Track`] summary. Files that
//! cannot be parsed, or that have no timestamped points, are skipped.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use geo::{Distance, Haversine, LineString, Point};

use crate::error::AppError;

/// Below this speed (m/s) an interval between two points counts as stopped.
const STOPPED_SPEED_MPS: f64 = 0.5;

/// Summary of one recorded GPX track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub activity_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Wall-clock start in the offset the file recorded (UTC when it has none)
    pub start_local: NaiveDateTime,
    /// Meters
    pub distance: f64,
    /// Seconds spent above the stopped threshold
    pub moving_time: i64,
    /// Meters climbed
    pub elevation_gain: f64,
    /// Encoded polyline (precision 5)
    pub polyline: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct TrackSample {
    point: Point<f64>,
    elevation: Option<f64>,
    time: DateTime<FixedOffset>,
}

/// Loads GPX files from a directory.
#[derive(Debug, Clone)]
pub struct TrackLoader {
    activity_type: String,
}

impl Default for TrackLoader {
    fn default() -> Self {
        Self::new("Run")
    }
}

impl TrackLoader {
    /// Loader that labels every track with `activity_type`.
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
        }
    }

    /// Parse every GPX file in `dir`, ordered by file name.
    pub fn load_tracks<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<Track>, AppError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            AppError::Track(format!("Failed to read directory {}: {}", dir.display(), e))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_gpx(path))
            .collect();
        paths.sort();

        let mut tracks = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_track(&path) {
                Ok(Some(track)) => tracks.push(track),
                Ok(None) => {
                    tracing::warn!(path = %path.display(), "GPX file has no timestamped points, skipping");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse GPX file, skipping");
                }
            }
        }

        tracing::info!(dir = %dir.display(), count = tracks.len(), "Loaded tracks");
        Ok(tracks)
    }

    /// Parse a single GPX file. `Ok(None)` when it holds no usable points.
    pub fn load_track(&self, path: &Path) -> Result<Option<Track>, AppError> {
        let file = fs::File::open(path)
            .map_err(|e| AppError::Track(format!("{}: {}", path.display(), e)))?;
        let gpx = gpx::read(BufReader::new(file))
            .map_err(|e| AppError::Track(format!("{}: {}", path.display(), e)))?;

        let mut samples = Vec::new();
        let mut name = None;

        for track in gpx.tracks {
            if name.is_none() {
                name = track.name.filter(|n| !n.trim().is_empty());
            }
            for segment in track.segments {
                for point in segment.points {
                    let p = point.point();
                    let elevation = point.elevation;
                    let Some(time) = point.time.and_then(|t| t.format().ok()) else {
                        continue;
                    };
                    let Ok(time) = DateTime::parse_from_rfc3339(&time) else {
                        continue;
                    };
                    samples.push(TrackSample {
                        point: Point::new(p.x(), p.y()),
                        elevation,
                        time,
                    });
                }
            }
        }

        let name = name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(summarize(name, self.activity_type.clone(), &samples))
    }
}

fn is_gpx(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"))
}

fn summarize(name: String, activity_type: String, samples: &[TrackSample]) -> Option<Track> {
    let first = samples.first()?;
    let last = samples.last()?;

    let mut distance = 0.0;
    let mut moving_time = 0;
    let mut elevation_gain = 0.0;

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let step = Haversine.distance(a.point, b.point);
        distance += step;

        let seconds = (b.time - a.time).num_seconds();
        if seconds > 0 && step / seconds as f64 >= STOPPED_SPEED_MPS {
            moving_time += seconds;
        }

        if let (Some(from), Some(to)) = (a.elevation, b.elevation) {
            if to > from {
                elevation_gain += to - from;
            }
        }
    }

    let line: LineString<f64> = samples.iter().map(|s| s.point.0).collect();
    let polyline = match polyline::encode_coordinates(line.0, 5) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            tracing::warn!(track = %name, error = %e, "Failed to encode track polyline");
            None
        }
    };

    Some(Track {
        name,
        activity_type,
        start_time: first.time.with_timezone(&Utc),
        end_time: last.time.with_timezone(&Utc),
        start_local: first.time.naive_local(),
        distance,
        moving_time,
        elevation_gain,
        polyline,
    })
}
