//! Prediction analytics API client
//!
//! Fetches the latest output of the backend's prediction models (anomaly,
//! danger, maintenance, activity) together with a short score history used by
//! the analytics view's trend sparklines.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{normalize_confidence, PredictionKind, PredictionSummary};
use crate::cache::{CacheError, ResponseCache};

/// Cache key for the prediction summary endpoint
const SUMMARY_CACHE_KEY: &str = "predictions:summary";

/// Errors that can occur when fetching prediction data
#[derive(Debug, Error)]
pub enum PredictionsError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The cached fetch failed; carries the underlying message
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Response from the prediction summary endpoint
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

/// A single prediction summary as the backend ships it
#[derive(Debug, Deserialize)]
struct RawPrediction {
    kind: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    history: Vec<f64>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl RawPrediction {
    /// Maps a wire record into the domain model; unknown kinds are dropped
    fn into_summary(self) -> Option<PredictionSummary> {
        let Some(kind) = PredictionKind::from_label(&self.kind) else {
            warn!(kind = %self.kind, "dropping prediction of unknown kind");
            return None;
        };

        Some(PredictionSummary {
            kind,
            label: self.label.unwrap_or_else(|| "unknown".to_string()),
            confidence: self.confidence.map(normalize_confidence).unwrap_or(0.0),
            history: self.history.into_iter().map(normalize_confidence).collect(),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Client for the prediction summary endpoint
#[derive(Debug, Clone)]
pub struct PredictionsClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Shared response cache for prediction summaries
    cache: ResponseCache<Vec<PredictionSummary>>,
    /// Base URL for the backend API
    base_url: String,
}

impl PredictionsClient {
    /// Creates a new PredictionsClient against the given backend
    pub fn new(base_url: impl Into<String>, cache: ResponseCache<Vec<PredictionSummary>>) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url: base_url.into(),
        }
    }

    /// Fetches the latest summary for every prediction family
    pub async fn fetch_summary(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<PredictionSummary>, PredictionsError> {
        let http = self.http_client.clone();
        let url = format!("{}/predictions/summary", self.base_url);

        let summaries = self
            .cache
            .fetch(SUMMARY_CACHE_KEY, force_refresh, move || async move {
                debug!(url = %url, "fetching prediction summary");
                let response = http.get(&url).send().await?.error_for_status()?;
                let body: SummaryResponse = response.json().await?;
                Ok::<_, PredictionsError>(
                    body.predictions
                        .into_iter()
                        .filter_map(RawPrediction::into_summary)
                        .collect(),
                )
            })
            .await?;

        Ok(summaries)
    }

    /// Drops cached prediction data; the next read hits the backend
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}
