//! Detections API client
//!
//! Fetches the recent-detections log from the device backend and maps the wire
//! records into [`DetectionRecord`]s. All reads go through the shared response
//! cache so several views polling the log within the freshness window produce
//! a single request.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{normalize_confidence, DangerLevel, DetectionRecord};
use crate::cache::{CacheError, CachedSnapshot, ResponseCache};

/// Errors that can occur when fetching detections
#[derive(Debug, Error)]
pub enum DetectionsError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The cached fetch failed; carries the underlying message
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Response from the detections endpoint
#[derive(Debug, Deserialize)]
struct DetectionsResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

/// A single detection record as the backend ships it
///
/// Every field except `id` is optional: the backend treats a 2xx with holes in
/// it as valid, and so does the dashboard.
#[derive(Debug, Deserialize)]
struct RawDetection {
    id: i64,
    #[serde(default)]
    object_detected: Option<String>,
    #[serde(default)]
    danger_level: Option<String>,
    #[serde(default)]
    distance_cm: Option<f64>,
    #[serde(default)]
    detection_confidence: Option<f64>,
    #[serde(default)]
    detection_source: Option<String>,
    #[serde(default)]
    detected_at: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl RawDetection {
    /// Maps a wire record into the domain model, normalizing units
    fn into_record(self) -> DetectionRecord {
        DetectionRecord {
            id: self.id,
            object_detected: self.object_detected.unwrap_or_else(|| "unknown".to_string()),
            danger_level: self
                .danger_level
                .as_deref()
                .map(DangerLevel::from_label)
                .unwrap_or(DangerLevel::Unknown),
            distance_cm: self.distance_cm,
            detection_confidence: self.detection_confidence.map(normalize_confidence),
            detection_source: self.detection_source,
            detected_at: self.detected_at.as_deref().and_then(parse_timestamp),
            image_url: self.image_url,
        }
    }
}

/// Parses an ISO-8601 timestamp, tolerating the backend's occasional garbage
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Client for the recent-detections endpoint
#[derive(Debug, Clone)]
pub struct DetectionsClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Shared response cache for detection sequences
    cache: ResponseCache<Vec<DetectionRecord>>,
    /// Base URL for the backend API
    base_url: String,
}

impl DetectionsClient {
    /// Creates a new DetectionsClient against the given backend
    pub fn new(base_url: impl Into<String>, cache: ResponseCache<Vec<DetectionRecord>>) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url: base_url.into(),
        }
    }

    /// Cache key for a recent-detections request with the given page size
    fn cache_key(limit: usize) -> String {
        format!("detections:recent:{limit}")
    }

    /// Fetches the most recent detections
    ///
    /// # Arguments
    /// * `limit` - Maximum number of records to request
    /// * `force_refresh` - Bypass the cache and hit the backend unconditionally
    ///
    /// # Behavior
    /// Served from the cache while fresh; otherwise one request is made no
    /// matter how many views ask concurrently. On failure the previous cached
    /// data is left intact and the error is returned.
    pub async fn fetch_recent(
        &self,
        limit: usize,
        force_refresh: bool,
    ) -> Result<Vec<DetectionRecord>, DetectionsError> {
        let http = self.http_client.clone();
        let url = format!("{}/detections/recent", self.base_url);

        let records = self
            .cache
            .fetch(&Self::cache_key(limit), force_refresh, move || async move {
                fetch_from_api(http, url, limit).await
            })
            .await?;

        Ok(records)
    }

    /// Returns the last cached detections for `limit`, fresh or stale
    pub fn cached_recent(&self, limit: usize) -> Option<CachedSnapshot<Vec<DetectionRecord>>> {
        self.cache.snapshot(&Self::cache_key(limit))
    }

    /// Records a locally observed detection ahead of the backend
    ///
    /// Prepends the record to the cached log so the next read shows it
    /// immediately; a later forced refresh reconciles with the server.
    pub fn record_detection(&self, limit: usize, record: DetectionRecord) {
        self.cache.append(&Self::cache_key(limit), record);
    }

    /// Drops all cached detection data; the next read hits the backend
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

/// Performs the actual backend request
async fn fetch_from_api(
    client: Client,
    url: String,
    limit: usize,
) -> Result<Vec<DetectionRecord>, DetectionsError> {
    debug!(limit = limit, url = %url, "fetching recent detections");

    let response = client
        .get(&url)
        .query(&[("limit", limit.to_string())])
        .send()
        .await?
        .error_for_status()?;

    let body: DetectionsResponse = response.json().await?;
    Ok(body.detections.into_iter().map(RawDetection::into_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_limit() {
        assert_eq!(DetectionsClient::cache_key(50), "detections:recent:50");
        assert_ne!(DetectionsClient::cache_key(10), DetectionsClient::cache_key(20));
    }

    #[test]
    fn test_raw_detection_maps_all_fields() {
        let json = r#"{
            "detections": [{
                "id": 7,
                "object_detected": "vehicle",
                "danger_level": "High",
                "distance_cm": 230.5,
                "detection_confidence": 87.5,
                "detection_source": "camera",
                "detected_at": "2026-08-01T14:30:00Z",
                "image_url": "https://backend/images/7.jpg"
            }]
        }"#;

        let body: DetectionsResponse = serde_json::from_str(json).expect("Should parse");
        let records: Vec<DetectionRecord> =
            body.detections.into_iter().map(RawDetection::into_record).collect();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, 7);
        assert_eq!(record.object_detected, "vehicle");
        assert_eq!(record.danger_level, DangerLevel::High);
        assert_eq!(record.distance_cm, Some(230.5));
        // Percentage confidence is normalized to a fraction
        assert!((record.detection_confidence.unwrap() - 0.875).abs() < 1e-9);
        assert_eq!(record.detection_source.as_deref(), Some("camera"));
        assert!(record.detected_at.is_some());
        assert_eq!(record.image_url.as_deref(), Some("https://backend/images/7.jpg"));
    }

    #[test]
    fn test_fractional_confidence_passes_through() {
        let raw = RawDetection {
            id: 1,
            object_detected: None,
            danger_level: None,
            distance_cm: None,
            detection_confidence: Some(0.42),
            detection_source: None,
            detected_at: None,
            image_url: None,
        };

        let record = raw.into_record();
        assert!((record.detection_confidence.unwrap() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fields_get_lenient_defaults() {
        let json = r#"{ "detections": [{ "id": 3 }] }"#;

        let body: DetectionsResponse = serde_json::from_str(json).expect("Should parse");
        let record = body.detections.into_iter().next().unwrap().into_record();

        assert_eq!(record.id, 3);
        assert_eq!(record.object_detected, "unknown");
        assert_eq!(record.danger_level, DangerLevel::Unknown);
        assert!(record.distance_cm.is_none());
        assert!(record.detection_confidence.is_none());
        assert!(record.detected_at.is_none());
    }

    #[test]
    fn test_unrecognized_danger_label_maps_to_unknown() {
        let json = r#"{ "detections": [{ "id": 3, "danger_level": "severe" }] }"#;

        let body: DetectionsResponse = serde_json::from_str(json).expect("Should parse");
        let record = body.detections.into_iter().next().unwrap().into_record();

        assert_eq!(record.danger_level, DangerLevel::Unknown);
    }

    #[test]
    fn test_malformed_timestamp_becomes_none() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2026-08-01T14:30:00Z").is_some());
    }

    #[test]
    fn test_empty_response_parses_to_empty_log() {
        let body: DetectionsResponse = serde_json::from_str("{}").expect("Should parse");
        assert!(body.detections.is_empty());
    }

    #[tokio::test]
    async fn test_record_detection_is_served_before_refresh() {
        let cache = ResponseCache::new(std::time::Duration::from_secs(60));
        let client = DetectionsClient::new("http://localhost:9", cache.clone());

        let record = DetectionRecord {
            id: 1,
            object_detected: "person".to_string(),
            danger_level: DangerLevel::Medium,
            distance_cm: Some(120.0),
            detection_confidence: Some(0.9),
            detection_source: Some("camera".to_string()),
            detected_at: None,
            image_url: None,
        };

        client.record_detection(5, record.clone());

        let snapshot = client.cached_recent(5).expect("append should create an entry");
        assert_eq!(snapshot.payload, vec![record]);
        assert!(!snapshot.is_stale);

        client.clear_cache();
        assert!(client.cached_recent(5).is_none());
    }
}
