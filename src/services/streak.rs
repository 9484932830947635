// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day streaks over the stored activity history.
//!
//! Streaks are recomputed on every read and never stored.

use chrono::{Days, NaiveDate};

use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, AnnotatedActivity};
use crate::time_utils::parse_local_date;

/// Annotates activities of one category with their running day streak.
#[derive(Debug, Clone)]
pub struct StreakCalculator {
    activity_type: String,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::new("Run")
    }
}

impl StreakCalculator {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
        }
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    /// Annotate every stored activity of this category, oldest first.
    pub fn compute_annotated_list(&self, store: &ActivityStore) -> Result<Vec<AnnotatedActivity>> {
        self.annotate(store.ordered_by_local_date()?)
    }

    /// Annotate `records`, which must be sorted ascending by local start time.
    ///
    /// Records of other categories are dropped and leave the streak untouched.
    pub fn annotate<I>(&self, records: I) -> Result<Vec<AnnotatedActivity>>
    where
        I: IntoIterator<Item = ActivityRecord>,
    {
        let mut annotated = Vec::new();
        let mut last_date: Option<NaiveDate> = None;
        let mut streak = 0u32;

        for activity in records {
            if activity.activity_type != self.activity_type {
                continue;
            }

            let date = parse_local_date(&activity.start_date_local).map_err(|e| {
                AppError::InvalidActivity(format!(
                    "start_date_local {:?} of activity {}: {}",
                    activity.start_date_local, activity.id, e
                ))
            })?;

            streak = match last_date {
                None => 1,
                Some(last) if date == last => streak,
                Some(last) if last.checked_add_days(Days::new(1)) == Some(date) => streak + 1,
                Some(last) if date > last => 1,
                Some(last) => {
                    return Err(AppError::OrderingViolation {
                        previous: last,
                        current: date,
                    });
                }
            };
            last_date = Some(date);

            annotated.push(AnnotatedActivity { activity, streak });
        }

        Ok(annotated)
    }
}
