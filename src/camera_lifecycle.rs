//! Camera lifecycle management
//!
//! ## Responsibilities
//!
//! - Track each camera's stream phase: idle -> starting -> live -> stopped
//! - Issue start/stop calls to the camera control collaborator, exactly once
//!   per transition, with revert on failure
//! - Reject duplicate requests while a transition is in flight
//! - Map detection outcomes onto each camera's presentation status
//!
//! Activation and deactivation are explicit commands issued by the dashboard
//! controller; nothing here starts or stops on its own.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::Camera;
use crate::notifier::Notifier;
use crate::status_classifier::{classify, PresentationStatus};

/// Camera control collaborator (`POST /cameras/{id}/start|stop`)
pub trait CameraControl: Send + Sync {
    fn start_camera(&self, camera_id: &str) -> impl Future<Output = Result<()>> + Send;
    fn stop_camera(&self, camera_id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Stream phase of a single camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    Idle,
    Starting,
    Live,
    Stopped,
}

/// Read-only view of one camera's runtime state
#[derive(Debug, Clone, Serialize)]
pub struct CameraRuntimeView {
    pub camera_id: String,
    pub name: String,
    pub phase: LifecyclePhase,
    pub status: PresentationStatus,
}

struct CameraEntry {
    name: String,
    phase: LifecyclePhase,
    status: PresentationStatus,
    /// A transition is awaiting its control call; further requests no-op
    in_flight: bool,
}

/// Per-camera state machine over a camera control collaborator.
pub struct CameraLifecycle<C> {
    control: Arc<C>,
    notifier: Notifier,
    cameras: RwLock<HashMap<String, CameraEntry>>,
}

impl<C: CameraControl> CameraLifecycle<C> {
    pub fn new(control: Arc<C>, notifier: Notifier) -> Self {
        Self {
            control,
            notifier,
            cameras: RwLock::new(HashMap::new()),
        }
    }

    /// Reconcile tracked state with the fetched camera list: create entries
    /// for cameras seen for the first time, drop entries for cameras that
    /// left the list. Returns the newly observed camera ids so the caller can
    /// activate them.
    pub async fn observe(&self, cameras: &[Camera]) -> Vec<String> {
        let mut tracked = self.cameras.write().await;

        let mut new_ids = Vec::new();
        for camera in cameras {
            if !tracked.contains_key(&camera.id) {
                tracked.insert(
                    camera.id.clone(),
                    CameraEntry {
                        name: camera.name.clone(),
                        phase: LifecyclePhase::Idle,
                        status: classify(None, false),
                        in_flight: false,
                    },
                );
                new_ids.push(camera.id.clone());
            }
        }

        let listed: Vec<&str> = cameras.iter().map(|c| c.id.as_str()).collect();
        tracked.retain(|id, _| {
            let keep = listed.contains(&id.as_str());
            if !keep {
                tracing::info!(camera_id = %id, "Camera removed from list, dropping runtime state");
            }
            keep
        });

        new_ids
    }

    /// Start a camera's stream. No-op while already starting, live, or with a
    /// transition in flight; the control collaborator is never touched for a
    /// no-op. On failure the phase reverts and the operator is notified.
    pub async fn activate(&self, camera_id: &str) {
        let (name, previous) = {
            let mut tracked = self.cameras.write().await;
            let entry = match tracked.get_mut(camera_id) {
                Some(entry) => entry,
                None => {
                    tracing::warn!(camera_id = %camera_id, "Start requested for untracked camera");
                    return;
                }
            };

            if entry.in_flight
                || matches!(entry.phase, LifecyclePhase::Starting | LifecyclePhase::Live)
            {
                tracing::debug!(
                    camera_id = %camera_id,
                    phase = ?entry.phase,
                    "Start request ignored"
                );
                return;
            }

            let previous = entry.phase;
            entry.phase = LifecyclePhase::Starting;
            entry.in_flight = true;
            (entry.name.clone(), previous)
        };

        let outcome = self.control.start_camera(camera_id).await;

        let mut tracked = self.cameras.write().await;
        let entry = match tracked.get_mut(camera_id) {
            Some(entry) => entry,
            // Removed from the list while the call was in flight.
            None => return,
        };
        entry.in_flight = false;

        match outcome {
            Ok(()) => {
                entry.phase = LifecyclePhase::Live;
                entry.status = classify(None, true);
                tracing::info!(camera_id = %camera_id, "Camera stream live");
                self.notifier.success(Some(camera_id), format!("{} started", name));
            }
            Err(e) => {
                entry.phase = previous;
                tracing::warn!(camera_id = %camera_id, error = %e, "Camera start failed, reverting");
                self.notifier
                    .error(Some(camera_id), format!("{} could not be started", name));
            }
        }
    }

    /// Stop a camera's stream. No-op while idle, stopped, or with a
    /// transition in flight. On failure the camera stays live and the
    /// operator is notified.
    pub async fn deactivate(&self, camera_id: &str) {
        let name = {
            let mut tracked = self.cameras.write().await;
            let entry = match tracked.get_mut(camera_id) {
                Some(entry) => entry,
                None => {
                    tracing::warn!(camera_id = %camera_id, "Stop requested for untracked camera");
                    return;
                }
            };

            if entry.in_flight
                || matches!(entry.phase, LifecyclePhase::Idle | LifecyclePhase::Stopped)
            {
                tracing::debug!(
                    camera_id = %camera_id,
                    phase = ?entry.phase,
                    "Stop request ignored"
                );
                return;
            }

            entry.in_flight = true;
            entry.name.clone()
        };

        let outcome = self.control.stop_camera(camera_id).await;

        let mut tracked = self.cameras.write().await;
        let entry = match tracked.get_mut(camera_id) {
            Some(entry) => entry,
            None => return,
        };
        entry.in_flight = false;

        match outcome {
            Ok(()) => {
                entry.phase = LifecyclePhase::Stopped;
                entry.status = classify(None, false);
                tracing::info!(camera_id = %camera_id, "Camera stream stopped");
                self.notifier.info(Some(camera_id), format!("{} stopped", name));
            }
            Err(e) => {
                tracing::warn!(camera_id = %camera_id, error = %e, "Camera stop failed, staying live");
                self.notifier
                    .error(Some(camera_id), format!("{} could not be stopped", name));
            }
        }
    }

    /// Stream delivery broke for a live camera. Transition to stopped locally:
    /// no control call, no operator notification. Transient hiccups must not
    /// interrupt the operator workflow.
    pub async fn on_stream_error(&self, camera_id: &str) {
        let mut tracked = self.cameras.write().await;
        if let Some(entry) = tracked.get_mut(camera_id) {
            if entry.phase == LifecyclePhase::Live && !entry.in_flight {
                entry.phase = LifecyclePhase::Stopped;
                entry.status = classify(None, false);
                tracing::warn!(camera_id = %camera_id, "Stream error, camera stopped silently");
            }
        }
    }

    /// Record the latest detection outcome against its camera.
    pub async fn apply_detection(&self, camera_id: &str, outcome: &str) {
        let mut tracked = self.cameras.write().await;
        match tracked.get_mut(camera_id) {
            Some(entry) => {
                entry.status = classify(Some(outcome), entry.phase == LifecyclePhase::Live);
            }
            None => {
                tracing::debug!(camera_id = %camera_id, "Detection for untracked camera ignored");
            }
        }
    }

    /// Current phase, if the camera is tracked
    pub async fn phase(&self, camera_id: &str) -> Option<LifecyclePhase> {
        self.cameras.read().await.get(camera_id).map(|e| e.phase)
    }

    /// Current presentation status, if the camera is tracked
    pub async fn presentation_status(&self, camera_id: &str) -> Option<PresentationStatus> {
        self.cameras.read().await.get(camera_id).map(|e| e.status)
    }

    /// Ids of cameras currently live
    pub async fn live_camera_ids(&self) -> Vec<String> {
        self.cameras
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.phase == LifecyclePhase::Live)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Read-only snapshot of every tracked camera
    pub async fn snapshot(&self) -> Vec<CameraRuntimeView> {
        self.cameras
            .read()
            .await
            .iter()
            .map(|(id, e)| CameraRuntimeView {
                camera_id: id.clone(),
                name: e.name.clone(),
                phase: e.phase,
                status: e.status,
            })
            .collect()
    }

    /// Drop all runtime state (dashboard teardown)
    pub async fn clear(&self) {
        self.cameras.write().await.clear();
    }
}
