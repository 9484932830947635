// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching activities.
//!
//! Handles:
//! - Token refresh before each sync session
//! - Paginated activity listing as a lazy stream
//! - Rate limit and expired token detection

use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use serde::Deserialize;

use crate::error::AppError;

/// Page size for `/athlete/activities` (Strava's maximum is 200).
const ACTIVITIES_PER_PAGE: u32 = 100;

/// Time bound for an activity listing. Strava accepts one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFilter {
    /// Activities starting after this instant
    After(DateTime<Utc>),
    /// Activities starting before this instant
    Before(DateTime<Utc>),
}

impl FetchFilter {
    fn query_param(&self) -> (&'static str, String) {
        match self {
            FetchFilter::After(t) => ("after", t.timestamp().to_string()),
            FetchFilter::Before(t) => ("before", t.timestamp().to_string()),
        }
    }
}

/// Remote side of a sync: token refresh and activity listing.
#[allow(async_fn_in_trait)]
pub trait ActivityApi {
    /// Exchange a refresh token for a short-lived access token.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError>;

    /// Lazily list activities matching `filter`. The stream is consumed once.
    fn activities<'a>(
        &'a self,
        access_token: &'a str,
        filter: FetchFilter,
    ) -> BoxStream<'a, Result<StravaActivitySummary, AppError>>;
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.strava.com/api/v3".to_string(),
            oauth_url: "https://www.strava.com/oauth/token".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Point the client at other endpoints, e.g. a local test server.
    pub fn with_base_urls(mut self, api_base_url: &str, oauth_url: &str) -> Self {
        self.base_url = api_base_url.trim_end_matches('/').to_string();
        self.oauth_url = oauth_url.to_string();
        self
    }

    /// List one page of the athlete's activities.
    pub async fn list_activities(
        &self,
        access_token: &str,
        filter: FetchFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);
        let (bound, timestamp) = filter.query_param();

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                (bound, timestamp),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(&self.oauth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Credential(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token refresh failed");
            return Err(AppError::Credential(format!(
                "Token refresh failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Credential(format!("Failed to parse token response: {}", e)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
            }

            if status.as_u16() == 401 {
                return Err(AppError::StravaApi(
                    AppError::STRAVA_TOKEN_ERROR.to_string(),
                ));
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

impl ActivityApi for StravaClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        self.refresh_token(refresh_token).await
    }

    fn activities<'a>(
        &'a self,
        access_token: &'a str,
        filter: FetchFilter,
    ) -> BoxStream<'a, Result<StravaActivitySummary, AppError>> {
        stream::try_unfold(Some(1u32), move |page| async move {
            let Some(page) = page else {
                return Ok::<_, AppError>(None);
            };

            let batch = self
                .list_activities(access_token, filter, page, ACTIVITIES_PER_PAGE)
                .await?;
            tracing::debug!(page, count = batch.len(), "Fetched activity page");

            // A short page is the last one.
            let next = (batch.len() as u32 >= ACTIVITIES_PER_PAGE).then_some(page + 1);
            let items = stream::iter(batch.into_iter().map(Ok::<_, AppError>));
            Ok(Some((items, next)))
        })
        .try_flatten()
        .boxed()
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub expires_at: i64,
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaMap {
    #[serde(default)]
    pub polyline: Option<String>,
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

/// Summary activity for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: String,
    pub start_date_local: String,
    pub distance: f64,
    pub moving_time: i64,
    pub elapsed_time: i64,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub map: Option<StravaMap>,
}

impl StravaActivitySummary {
    /// Get the best available polyline (full if present, else summary).
    pub fn polyline(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(map.summary_polyline.as_deref().filter(|p| !p.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_query_params() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FetchFilter::After(t).query_param(),
            ("after", "1704067200".to_string())
        );
        assert_eq!(
            FetchFilter::Before(t).query_param(),
            ("before", "1704067200".to_string())
        );
    }

    #[test]
    fn test_summary_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": 42,
            "name": "Commute",
            "type": "Ride",
            "start_date": "2024-05-01T15:00:00Z",
            "start_date_local": "2024-05-01T08:00:00Z",
            "distance": 8123.4,
            "moving_time": 1500,
            "elapsed_time": 1620
        }"#;

        let summary: StravaActivitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.activity_type, "Ride");
        assert!(summary.map.is_none());
        assert!(summary.polyline().is_none());
        assert_eq!(summary.total_elevation_gain, 0.0);
    }

    #[test]
    fn test_polyline_prefers_full_over_summary() {
        let json = r#"{
            "id": 43,
            "name": "Loop",
            "type": "Run",
            "start_date": "2024-05-01T15:00:00Z",
            "start_date_local": "2024-05-01T08:00:00Z",
            "distance": 5000.0,
            "moving_time": 1500,
            "elapsed_time": 1500,
            "map": { "polyline": "full", "summary_polyline": "summary" }
        }"#;
        let mut summary: StravaActivitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.polyline(), Some("full"));

        if let Some(map) = summary.map.as_mut() {
            map.polyline = Some(String::new());
        }
        assert_eq!(summary.polyline(), Some("summary"));
    }
}
