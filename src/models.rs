//! Wire types shared with the access-control backend
//!
//! Everything here is owned by the backend; the console holds read-only
//! copies. Event times are RFC 3339 and parsed into `DateTime<Utc>`.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Camera entity as served by `GET /cameras`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    /// Connection type: "webcam", "rtsp", "http"
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub door_id: String,
    #[serde(default = "default_fps")]
    pub fps: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Declared grid position (0-3)
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_fps() -> i32 {
    15
}

fn default_enabled() -> bool {
    true
}

/// Camera creation/update request
#[derive(Debug, Clone, Serialize)]
pub struct CameraRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub door_id: String,
    pub fps: i32,
    pub position: i32,
}

/// Plate owner reference attached to a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub owner_name: String,
    /// "Block - apartment" display reference
    pub apartment: String,
}

/// Detection event produced by the recognition pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: String,
    pub camera_id: String,
    pub plate: String,
    /// Raw outcome: "allowed", "blocked", "unknown". Kept as the wire string;
    /// classification to presentation state is fail-open downstream.
    pub status: String,
    #[serde(default)]
    pub confidence: f64,
    /// Event time, not arrival time
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_info: Option<OwnerInfo>,
}

impl Detection {
    /// Decode the embedded still image, if any.
    pub fn decode_image(&self) -> Option<Result<Vec<u8>>> {
        self.image_base64.as_ref().map(|data| {
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| Error::Parse(format!("Invalid detection image: {}", e)))
        })
    }
}

/// Aggregate counters from `GET /detections/stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub total_today: i64,
    pub allowed_today: i64,
    pub blocked_today: i64,
    pub unknown_today: i64,
}

/// System telemetry from `GET /system/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    #[serde(default)]
    pub gpu_available: bool,
    #[serde(default)]
    pub gpu_info: String,
    #[serde(default)]
    pub active_cameras: i64,
}

/// Residential block within a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub apartments: i32,
}

/// Site entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Site creation/update request
#[derive(Debug, Clone, Serialize)]
pub struct SiteRequest {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// Registered plate entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plate {
    pub id: String,
    pub site_id: String,
    pub block_name: String,
    pub apartment_number: String,
    pub owner_name: String,
    /// Up to 3 plates per apartment
    pub plates: Vec<String>,
    pub valid_until: String,
    /// "allowed" or "blocked"
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Plate creation/update request
#[derive(Debug, Clone, Serialize)]
pub struct PlateRequest {
    pub site_id: String,
    pub block_name: String,
    pub apartment_number: String,
    pub owner_name: String,
    pub plates: Vec<String>,
    pub valid_until: String,
    pub status: String,
}

/// Door relay entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub id: String,
    pub name: String,
    pub ip: String,
    /// Relay trigger path, e.g. "/kapiac"
    pub endpoint: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Door creation/update request
#[derive(Debug, Clone, Serialize)]
pub struct DoorRequest {
    pub name: String,
    pub ip: String,
    pub endpoint: String,
}

/// Recognition engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    pub engine: String,
    pub compute_mode: String,
    pub camera_size: String,
    pub detection_confidence: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial settings update
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_confidence: Option<f64>,
}

/// Detection history filter for the reports surface
#[derive(Debug, Clone, Default)]
pub struct DetectionQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}
