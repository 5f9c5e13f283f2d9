//! Backend REST collaborator
//!
//! ## Responsibilities
//!
//! - Monitoring surface: cameras, start/stop control, recent detections,
//!   aggregate stats, system telemetry
//! - Management surface: sites, plates, doors, cameras, settings
//!
//! One `reqwest` client, one base URL, one request timeout. Non-2xx control
//! responses are control failures; non-2xx fetch responses are fetch
//! failures.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::camera_lifecycle::CameraControl;
use crate::dashboard::{CameraDirectory, TelemetrySource};
use crate::detection_feed::DetectionSource;
use crate::error::{Error, Result};
use crate::models::{
    Camera, CameraRequest, Detection, DetectionQuery, DetectionStats, Door, DoorRequest, Plate,
    PlateRequest, Settings, SettingsUpdate, Site, SiteRequest, SystemStatus,
};

/// REST client for the access-control backend
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("GET {} -> {}", path, resp.status())));
        }
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("POST {} -> {}", path, resp.status())));
        }
        Ok(resp.json().await?)
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self.client.put(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("PUT {} -> {}", path, resp.status())));
        }
        Ok(resp.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.client.delete(self.url(path)).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("DELETE {} -> {}", path, resp.status())));
        }
        Ok(())
    }

    // ========================================
    // Monitoring surface
    // ========================================

    /// `GET /cameras`
    pub async fn list_cameras(&self) -> Result<Vec<Camera>> {
        self.get_json("/cameras").await
    }

    /// `POST /cameras/{id}/start`
    pub async fn start_camera_stream(&self, camera_id: &str) -> Result<()> {
        let path = format!("/cameras/{}/start", camera_id);
        let resp = self.client.post(self.url(&path)).send().await.map_err(|e| {
            Error::ControlCall {
                camera_id: camera_id.to_string(),
                message: e.to_string(),
            }
        })?;

        if !resp.status().is_success() {
            return Err(Error::ControlCall {
                camera_id: camera_id.to_string(),
                message: format!("start rejected: {}", resp.status()),
            });
        }
        Ok(())
    }

    /// `POST /cameras/{id}/stop`
    pub async fn stop_camera_stream(&self, camera_id: &str) -> Result<()> {
        let path = format!("/cameras/{}/stop", camera_id);
        let resp = self.client.post(self.url(&path)).send().await.map_err(|e| {
            Error::ControlCall {
                camera_id: camera_id.to_string(),
                message: e.to_string(),
            }
        })?;

        if !resp.status().is_success() {
            return Err(Error::ControlCall {
                camera_id: camera_id.to_string(),
                message: format!("stop rejected: {}", resp.status()),
            });
        }
        Ok(())
    }

    /// URL of the continuous image resource for a live camera. The resource
    /// itself is consumed by the rendering layer, not the core.
    pub fn camera_stream_url(&self, camera_id: &str) -> String {
        self.url(&format!("/cameras/{}/stream", camera_id))
    }

    /// `GET /detections/recent`
    pub async fn recent_detections(&self) -> Result<Vec<Detection>> {
        self.get_json("/detections/recent").await
    }

    /// `GET /detections/stats`
    pub async fn detection_stats(&self) -> Result<DetectionStats> {
        self.get_json("/detections/stats").await
    }

    /// `GET /system/status`
    pub async fn system_status(&self) -> Result<SystemStatus> {
        self.get_json("/system/status").await
    }

    /// `GET /detections` with optional date/status filters (reports surface)
    pub async fn detections(&self, query: &DetectionQuery) -> Result<Vec<Detection>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(ref start) = query.start_date {
            params.push(("start_date", start));
        }
        if let Some(ref end) = query.end_date {
            params.push(("end_date", end));
        }
        if let Some(ref status) = query.status {
            params.push(("status", status));
        }

        let resp = self
            .client
            .get(self.url("/detections"))
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("GET /detections -> {}", resp.status())));
        }
        Ok(resp.json().await?)
    }

    // ========================================
    // Management surface
    // ========================================

    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        self.get_json("/sites").await
    }

    pub async fn create_site(&self, site: &SiteRequest) -> Result<Site> {
        self.post_json("/sites", site).await
    }

    pub async fn update_site(&self, site_id: &str, site: &SiteRequest) -> Result<Site> {
        self.put_json(&format!("/sites/{}", site_id), site).await
    }

    pub async fn delete_site(&self, site_id: &str) -> Result<()> {
        self.delete(&format!("/sites/{}", site_id)).await
    }

    pub async fn list_plates(&self) -> Result<Vec<Plate>> {
        self.get_json("/plates").await
    }

    pub async fn create_plate(&self, plate: &PlateRequest) -> Result<Plate> {
        self.post_json("/plates", plate).await
    }

    pub async fn update_plate(&self, plate_id: &str, plate: &PlateRequest) -> Result<Plate> {
        self.put_json(&format!("/plates/{}", plate_id), plate).await
    }

    pub async fn delete_plate(&self, plate_id: &str) -> Result<()> {
        self.delete(&format!("/plates/{}", plate_id)).await
    }

    pub async fn list_doors(&self) -> Result<Vec<Door>> {
        self.get_json("/doors").await
    }

    pub async fn create_door(&self, door: &DoorRequest) -> Result<Door> {
        self.post_json("/doors", door).await
    }

    pub async fn update_door(&self, door_id: &str, door: &DoorRequest) -> Result<Door> {
        self.put_json(&format!("/doors/{}", door_id), door).await
    }

    pub async fn delete_door(&self, door_id: &str) -> Result<()> {
        self.delete(&format!("/doors/{}", door_id)).await
    }

    /// `POST /doors/{id}/open` - manual relay trigger
    pub async fn open_door(&self, door_id: &str) -> Result<()> {
        let path = format!("/doors/{}/open", door_id);
        let resp = self.client.post(self.url(&path)).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Fetch(format!("POST {} -> {}", path, resp.status())));
        }
        Ok(())
    }

    pub async fn create_camera(&self, camera: &CameraRequest) -> Result<Camera> {
        self.post_json("/cameras", camera).await
    }

    pub async fn update_camera(&self, camera_id: &str, camera: &CameraRequest) -> Result<Camera> {
        self.put_json(&format!("/cameras/{}", camera_id), camera).await
    }

    pub async fn delete_camera(&self, camera_id: &str) -> Result<()> {
        self.delete(&format!("/cameras/{}", camera_id)).await
    }

    pub async fn settings(&self) -> Result<Settings> {
        self.get_json("/settings").await
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        self.put_json("/settings", update).await
    }
}

impl CameraControl for ApiClient {
    async fn start_camera(&self, camera_id: &str) -> Result<()> {
        self.start_camera_stream(camera_id).await
    }

    async fn stop_camera(&self, camera_id: &str) -> Result<()> {
        self.stop_camera_stream(camera_id).await
    }
}

impl DetectionSource for ApiClient {
    async fn fetch_recent(&self) -> Result<Vec<Detection>> {
        self.recent_detections().await
    }

    async fn fetch_stats(&self) -> Result<DetectionStats> {
        self.detection_stats().await
    }
}

impl CameraDirectory for ApiClient {
    async fn fetch_cameras(&self) -> Result<Vec<Camera>> {
        self.list_cameras().await
    }
}

impl TelemetrySource for ApiClient {
    async fn fetch_system_status(&self) -> Result<SystemStatus> {
        self.system_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ApiClient::new("http://localhost:8001/api/");
        assert_eq!(
            client.camera_stream_url("c1"),
            "http://localhost:8001/api/cameras/c1/stream"
        );
    }
}
