// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only API over the stored activities.

use crate::error::{AppError, Result};
use crate::models::{AnnotatedActivity, StreakStats};
use crate::services::StreakCalculator;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(get_activities))
        .route("/api/stats", get(get_stats))
}

/// Optional category override.
#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    pub sport_type: Option<String>,
}

impl StreakQuery {
    fn calculator(&self, state: &AppState) -> Result<StreakCalculator> {
        match self.sport_type.as_deref().map(str::trim) {
            Some("") => Err(AppError::BadRequest("sport_type must not be empty".to_string())),
            Some(sport_type) => Ok(StreakCalculator::new(sport_type)),
            None => Ok(StreakCalculator::new(state.config.streak_sport_type.as_str())),
        }
    }
}

/// Activities of one category, oldest first, each with its streak.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreakQuery>,
) -> Result<Json<Vec<AnnotatedActivity>>> {
    let calculator = query.calculator(&state)?;
    let store = state.store.lock().await;
    let activities = calculator.compute_annotated_list(&store)?;

    tracing::debug!(
        sport_type = calculator.activity_type(),
        count = activities.len(),
        "Served annotated activities"
    );
    Ok(Json(activities))
}

/// Streak summary for one category.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreakQuery>,
) -> Result<Json<StreakStats>> {
    let calculator = query.calculator(&state)?;
    let store = state.store.lock().await;
    let activities = calculator.compute_annotated_list(&store)?;

    Ok(Json(StreakStats::from_annotated(
        calculator.activity_type(),
        &activities,
    )))
}
