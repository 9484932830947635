// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak statistics derived from the annotated activity list.

use serde::{Deserialize, Serialize};

use crate::models::AnnotatedActivity;

/// Summary of one category's annotated history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakStats {
    /// Category the streak was computed for
    pub sport_type: String,
    /// Activities of that category
    pub activities: u32,
    /// Total distance across those activities (meters)
    pub total_distance_meters: f64,
    /// Longest run of consecutive days
    pub longest_streak: u32,
    /// Streak ending at the most recent activity
    pub current_streak: u32,
    /// Local start of the first activity (`YYYY-MM-DD HH:MM:SS`)
    pub first_date: Option<String>,
    /// Local start of the most recent activity
    pub last_date: Option<String>,
}

impl StreakStats {
    /// Summarize an annotated list as produced by the streak calculator.
    pub fn from_annotated(sport_type: &str, annotated: &[AnnotatedActivity]) -> Self {
        Self {
            sport_type: sport_type.to_string(),
            activities: annotated.len() as u32,
            total_distance_meters: annotated.iter().map(|a| a.activity.distance).sum(),
            longest_streak: annotated.iter().map(|a| a.streak).max().unwrap_or(0),
            current_streak: annotated.last().map_or(0, |a| a.streak),
            first_date: annotated
                .first()
                .map(|a| a.activity.start_date_local.clone()),
            last_date: annotated.last().map(|a| a.activity.start_date_local.clone()),
        }
    }
}
