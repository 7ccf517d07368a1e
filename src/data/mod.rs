//! Core data models for the aidwatch dashboard
//!
//! This module contains the data types used throughout the application for
//! representing obstacle detections, device status, ML-prediction summaries,
//! and system health, together with the REST clients that fetch them.

pub mod confidence;
pub mod detections;
pub mod device;
pub mod predictions;

pub use confidence::normalize_confidence;
pub use detections::{DetectionsClient, DetectionsError};
pub use device::{DeviceClient, DeviceError};
pub use predictions::{PredictionsClient, PredictionsError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Danger classification assigned to a detection by the on-device model
///
/// `Unknown` covers records whose label is missing or unrecognized; the
/// backend occasionally ships labels the dashboard has never seen and the log
/// view still has to render the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DangerLevel {
    /// Immediate hazard, alert the wearer
    Critical,
    High,
    Medium,
    Low,
    /// Label missing or unrecognized
    Unknown,
}

impl DangerLevel {
    /// Parses a backend label, case-insensitively
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => DangerLevel::Critical,
            "high" => DangerLevel::High,
            "medium" => DangerLevel::Medium,
            "low" => DangerLevel::Low,
            _ => DangerLevel::Unknown,
        }
    }

    /// Severity rank for sorting and threshold filtering (higher is worse)
    pub fn rank(&self) -> u8 {
        match self {
            DangerLevel::Critical => 4,
            DangerLevel::High => 3,
            DangerLevel::Medium => 2,
            DangerLevel::Low => 1,
            DangerLevel::Unknown => 0,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            DangerLevel::Critical => "Critical",
            DangerLevel::High => "High",
            DangerLevel::Medium => "Medium",
            DangerLevel::Low => "Low",
            DangerLevel::Unknown => "Unknown",
        }
    }
}

/// One detection event from the device's camera/sensor pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Backend identifier for the detection
    pub id: i64,
    /// What the model detected (e.g. "person", "vehicle", "stairs")
    pub object_detected: String,
    /// Danger classification for the detection
    pub danger_level: DangerLevel,
    /// Distance to the object in centimeters, if the rangefinder had a fix
    pub distance_cm: Option<f64>,
    /// Model confidence as a fraction in [0, 1]
    pub detection_confidence: Option<f64>,
    /// Which subsystem produced the detection (e.g. "camera", "ultrasonic")
    pub detection_source: Option<String>,
    /// When the detection happened; absent when the backend omits it
    pub detected_at: Option<DateTime<Utc>>,
    /// Snapshot image captured with the detection, if any
    pub image_url: Option<String>,
}

impl DetectionRecord {
    /// Whether the detection meets a minimum danger threshold
    pub fn at_least(&self, threshold: DangerLevel) -> bool {
        self.danger_level.rank() >= threshold.rank()
    }
}

/// Status reported by the wearable device itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Device identifier
    pub device_id: String,
    /// Whether the device is currently reachable
    pub online: bool,
    /// Battery charge percentage (0-100)
    pub battery_percent: Option<f64>,
    /// Enclosure temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Firmware version string
    pub firmware_version: Option<String>,
    /// Camera subsystem operational
    pub camera_ok: bool,
    /// Sensor subsystem operational
    pub sensors_ok: bool,
    /// Last heartbeat received by the backend
    pub last_seen: Option<DateTime<Utc>>,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Host-level health of the device's Raspberry Pi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    /// CPU utilization percentage
    pub cpu_percent: Option<f64>,
    /// Memory utilization percentage
    pub memory_percent: Option<f64>,
    /// Disk utilization percentage
    pub disk_percent: Option<f64>,
    /// Network connectivity from the device to the backend
    pub network_ok: bool,
    /// Seconds since boot
    pub uptime_secs: Option<u64>,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// The ML prediction families surfaced on the analytics view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionKind {
    Anomaly,
    Danger,
    Maintenance,
    Activity,
}

impl PredictionKind {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            PredictionKind::Anomaly => "Anomaly",
            PredictionKind::Danger => "Danger",
            PredictionKind::Maintenance => "Maintenance",
            PredictionKind::Activity => "Activity",
        }
    }

    /// Parses a backend kind label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "anomaly" => Some(PredictionKind::Anomaly),
            "danger" => Some(PredictionKind::Danger),
            "maintenance" => Some(PredictionKind::Maintenance),
            "activity" => Some(PredictionKind::Activity),
            _ => None,
        }
    }
}

/// Latest model output for one prediction family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSummary {
    /// Which prediction family this summarizes
    pub kind: PredictionKind,
    /// Predicted class label (e.g. "normal", "walking", "service due")
    pub label: String,
    /// Model confidence as a fraction in [0, 1]
    pub confidence: f64,
    /// Recent confidence/score history, oldest first, for trend charts
    pub history: Vec<f64>,
    /// When the model last produced output
    pub updated_at: Option<DateTime<Utc>>,
}
