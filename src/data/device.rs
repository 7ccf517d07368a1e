//! Device status and system health API client
//!
//! Fetches the wearable's self-reported status and the host-level health of
//! its Raspberry Pi. The two resources live on separate endpoints with
//! separate cache entries, but always against the same backend.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{DeviceStatus, SystemHealth};
use crate::cache::{CacheError, ResponseCache};

/// Cache key for the device status endpoint
const STATUS_CACHE_KEY: &str = "device:status";

/// Cache key for the system health endpoint
const HEALTH_CACHE_KEY: &str = "system:health";

/// Errors that can occur when fetching device data
#[derive(Debug, Error)]
pub enum DeviceError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The cached fetch failed; carries the underlying message
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Device status as the backend ships it
#[derive(Debug, Deserialize)]
struct RawDeviceStatus {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    online: bool,
    #[serde(default)]
    battery_percent: Option<f64>,
    #[serde(default)]
    temperature_c: Option<f64>,
    #[serde(default)]
    firmware_version: Option<String>,
    #[serde(default)]
    camera_ok: bool,
    #[serde(default)]
    sensors_ok: bool,
    #[serde(default)]
    last_seen: Option<String>,
}

impl RawDeviceStatus {
    fn into_status(self) -> DeviceStatus {
        DeviceStatus {
            device_id: self.device_id.unwrap_or_else(|| "unknown".to_string()),
            online: self.online,
            battery_percent: self.battery_percent,
            temperature_c: self.temperature_c,
            firmware_version: self.firmware_version,
            camera_ok: self.camera_ok,
            sensors_ok: self.sensors_ok,
            last_seen: self.last_seen.as_deref().and_then(parse_timestamp),
            fetched_at: Utc::now(),
        }
    }
}

/// System health as the backend ships it
#[derive(Debug, Deserialize)]
struct RawSystemHealth {
    #[serde(default)]
    cpu_percent: Option<f64>,
    #[serde(default)]
    memory_percent: Option<f64>,
    #[serde(default)]
    disk_percent: Option<f64>,
    #[serde(default)]
    network_ok: bool,
    #[serde(default)]
    uptime_secs: Option<u64>,
}

impl RawSystemHealth {
    fn into_health(self) -> SystemHealth {
        SystemHealth {
            cpu_percent: self.cpu_percent,
            memory_percent: self.memory_percent,
            disk_percent: self.disk_percent,
            network_ok: self.network_ok,
            uptime_secs: self.uptime_secs,
            fetched_at: Utc::now(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Client for device status and system health
#[derive(Debug, Clone)]
pub struct DeviceClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Cache for device status snapshots
    status_cache: ResponseCache<DeviceStatus>,
    /// Cache for system health snapshots
    health_cache: ResponseCache<SystemHealth>,
    /// Base URL for the backend API
    base_url: String,
}

impl DeviceClient {
    /// Creates a new DeviceClient against the given backend
    pub fn new(
        base_url: impl Into<String>,
        status_cache: ResponseCache<DeviceStatus>,
        health_cache: ResponseCache<SystemHealth>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            status_cache,
            health_cache,
            base_url: base_url.into(),
        }
    }

    /// Fetches the device's self-reported status
    pub async fn fetch_status(&self, force_refresh: bool) -> Result<DeviceStatus, DeviceError> {
        let http = self.http_client.clone();
        let url = format!("{}/device/status", self.base_url);

        let status = self
            .status_cache
            .fetch(STATUS_CACHE_KEY, force_refresh, move || async move {
                debug!(url = %url, "fetching device status");
                let response = http.get(&url).send().await?.error_for_status()?;
                let raw: RawDeviceStatus = response.json().await?;
                Ok::<_, DeviceError>(raw.into_status())
            })
            .await?;

        Ok(status)
    }

    /// Fetches host-level system health
    pub async fn fetch_health(&self, force_refresh: bool) -> Result<SystemHealth, DeviceError> {
        let http = self.http_client.clone();
        let url = format!("{}/system/health", self.base_url);

        let health = self
            .health_cache
            .fetch(HEALTH_CACHE_KEY, force_refresh, move || async move {
                debug!(url = %url, "fetching system health");
                let response = http.get(&url).send().await?.error_for_status()?;
                let raw: RawSystemHealth = response.json().await?;
                Ok::<_, DeviceError>(raw.into_health())
            })
            .await?;

        Ok(health)
    }

    /// Drops cached status and health; the next reads hit the backend
    pub fn clear_cache(&self) {
        self.status_cache.invalidate_all();
        self.health_cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_status_maps_fields_and_defaults() {
        let json = r#"{
            "device_id": "vest-014",
            "online": true,
            "battery_percent": 72.5,
            "temperature_c": 41.0,
            "firmware_version": "2.3.1",
            "camera_ok": true,
            "sensors_ok": false,
            "last_seen": "2026-08-01T14:30:00Z"
        }"#;

        let raw: RawDeviceStatus = serde_json::from_str(json).expect("Should parse");
        let status = raw.into_status();

        assert_eq!(status.device_id, "vest-014");
        assert!(status.online);
        assert_eq!(status.battery_percent, Some(72.5));
        assert_eq!(status.firmware_version.as_deref(), Some("2.3.1"));
        assert!(status.camera_ok);
        assert!(!status.sensors_ok);
        assert!(status.last_seen.is_some());
    }

    #[test]
    fn test_raw_status_tolerates_empty_object() {
        let raw: RawDeviceStatus = serde_json::from_str("{}").expect("Should parse");
        let status = raw.into_status();

        assert_eq!(status.device_id, "unknown");
        assert!(!status.online);
        assert!(status.battery_percent.is_none());
        assert!(status.last_seen.is_none());
    }

    #[test]
    fn test_raw_health_maps_fields() {
        let json = r#"{
            "cpu_percent": 35.2,
            "memory_percent": 61.8,
            "disk_percent": 44.0,
            "network_ok": true,
            "uptime_secs": 86400
        }"#;

        let raw: RawSystemHealth = serde_json::from_str(json).expect("Should parse");
        let health = raw.into_health();

        assert_eq!(health.cpu_percent, Some(35.2));
        assert_eq!(health.memory_percent, Some(61.8));
        assert_eq!(health.disk_percent, Some(44.0));
        assert!(health.network_ok);
        assert_eq!(health.uptime_secs, Some(86400));
    }
}
