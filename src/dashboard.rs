//! Dashboard controller
//!
//! ## Responsibilities
//!
//! - Compose the feed reconciler, camera lifecycle, and grid into one screen
//! - Own the push channel task and the pull timers (feed+stats every 5 s,
//!   telemetry every 3 s, camera list every 30 s by default)
//! - Tear everything down on deactivation: cancel timers, close the push
//!   channel, stop live cameras, drop runtime state
//!
//! All mutation happens in the controller's own tasks; rendering reads
//! cloned snapshots. Completion paths check the active flag so a torn-down
//! view is never mutated.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::camera_grid::{self, GridSlots};
use crate::camera_lifecycle::{CameraControl, CameraLifecycle, CameraRuntimeView};
use crate::config::AppConfig;
use crate::detection_feed::{DetectionSource, FeedReconciler};
use crate::error::Result;
use crate::models::{Camera, Detection, DetectionStats, SystemStatus};
use crate::notifier::Notifier;
use crate::push_channel::{self, PushChannelConfig, PushHandler};

/// Camera list collaborator (`GET /cameras`)
pub trait CameraDirectory: Send + Sync {
    fn fetch_cameras(&self) -> impl Future<Output = Result<Vec<Camera>>> + Send;
}

/// System telemetry collaborator (`GET /system/status`)
pub trait TelemetrySource: Send + Sync {
    fn fetch_system_status(&self) -> impl Future<Output = Result<SystemStatus>> + Send;
}

/// Everything the dashboard needs from the backend
pub trait Backend:
    CameraControl + CameraDirectory + DetectionSource + TelemetrySource + Send + Sync + 'static
{
}

impl<T> Backend for T where
    T: CameraControl + CameraDirectory + DetectionSource + TelemetrySource + Send + Sync + 'static
{
}

/// Dashboard timing and push channel settings
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub feed_poll_interval: Duration,
    pub telemetry_poll_interval: Duration,
    pub camera_refresh_interval: Duration,
    /// `None` runs pull-only (used headless and in tests)
    pub push: Option<PushChannelConfig>,
}

impl From<&AppConfig> for DashboardConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            feed_poll_interval: config.feed_poll_interval,
            telemetry_poll_interval: config.telemetry_poll_interval,
            camera_refresh_interval: config.camera_refresh_interval,
            push: Some(PushChannelConfig {
                url: config.push_channel_url(),
                backoff_initial: config.push_backoff_initial,
                backoff_max: config.push_backoff_max,
                max_failures: config.push_max_failures,
            }),
        }
    }
}

struct DashboardInner<B> {
    backend: Arc<B>,
    config: DashboardConfig,
    reconciler: FeedReconciler<B>,
    lifecycle: CameraLifecycle<B>,
    notifier: Notifier,
    cameras: RwLock<Vec<Camera>>,
    grid: RwLock<GridSlots>,
    telemetry: RwLock<SystemStatus>,
    active: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// The monitoring screen's composition root.
pub struct DashboardController<B> {
    inner: Arc<DashboardInner<B>>,
}

impl<B: Backend> DashboardController<B> {
    pub fn new(backend: Arc<B>, config: DashboardConfig, notifier: Notifier) -> Self {
        let inner = DashboardInner {
            reconciler: FeedReconciler::new(backend.clone()),
            lifecycle: CameraLifecycle::new(backend.clone(), notifier.clone()),
            backend,
            config,
            notifier,
            cameras: RwLock::new(Vec::new()),
            grid: RwLock::new(GridSlots::default()),
            telemetry: RwLock::new(SystemStatus::default()),
            active: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Bring the view up: prime every snapshot, auto-activate observed
    /// cameras, then spawn the push channel and the pull timers. Idempotent.
    pub async fn activate(&self) {
        if self.inner.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("Dashboard already active");
            return;
        }

        tracing::info!("Dashboard activating");

        Self::refresh_cameras(&self.inner).await;
        self.inner.reconciler.refresh_feed().await;
        self.inner.reconciler.refresh_stats().await;
        Self::refresh_telemetry(&self.inner).await;

        let mut tasks = Vec::new();

        {
            let inner = self.inner.clone();
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(inner.config.feed_poll_interval);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if !inner.active.load(Ordering::SeqCst) {
                        break;
                    }
                    inner.reconciler.refresh_feed().await;
                    inner.reconciler.refresh_stats().await;
                }
            }));
        }

        {
            let inner = self.inner.clone();
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(inner.config.telemetry_poll_interval);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if !inner.active.load(Ordering::SeqCst) {
                        break;
                    }
                    Self::refresh_telemetry(&inner).await;
                }
            }));
        }

        {
            let inner = self.inner.clone();
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(inner.config.camera_refresh_interval);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if !inner.active.load(Ordering::SeqCst) {
                        break;
                    }
                    Self::refresh_cameras(&inner).await;
                }
            }));
        }

        if let Some(push_config) = self.inner.config.push.clone() {
            let handler = self.inner.clone();
            let active = self.inner.active.clone();
            tasks.push(tokio::spawn(async move {
                push_channel::run(push_config, active, handler).await;
            }));
        }

        self.inner.tasks.lock().expect("task list poisoned").extend(tasks);
    }

    /// Tear the view down: cancel the timers, close the push channel, issue
    /// the symmetric stop for every live camera, and drop runtime state.
    /// Idempotent.
    pub async fn deactivate(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            tracing::debug!("Dashboard already inactive");
            return;
        }

        tracing::info!("Dashboard deactivating");

        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.inner.tasks.lock().expect("task list poisoned");
            guard.drain(..).collect()
        };
        for task in tasks {
            task.abort();
        }

        for camera_id in self.inner.lifecycle.live_camera_ids().await {
            self.inner.lifecycle.deactivate(&camera_id).await;
        }

        self.inner.lifecycle.clear().await;
        self.inner.cameras.write().await.clear();
        *self.inner.grid.write().await = GridSlots::default();
    }

    /// Operator pressed start on a grid slot
    pub async fn request_start(&self, camera_id: &str) {
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }
        self.inner.lifecycle.activate(camera_id).await;
    }

    /// Operator pressed stop on a grid slot
    pub async fn request_stop(&self, camera_id: &str) {
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }
        self.inner.lifecycle.deactivate(camera_id).await;
    }

    /// Feed one push-arrived detection into the view. The push channel task
    /// calls this; alternate transports and tests may too.
    pub async fn handle_push(&self, detection: Detection) {
        self.inner.on_detection(detection).await;
    }

    /// Rendering reports broken frame delivery for one camera
    pub async fn report_stream_error(&self, camera_id: &str) {
        if !self.inner.active.load(Ordering::SeqCst) {
            return;
        }
        self.inner.lifecycle.on_stream_error(camera_id).await;
    }

    async fn refresh_cameras(inner: &Arc<DashboardInner<B>>) {
        let cameras = match inner.backend.fetch_cameras().await {
            Ok(cameras) => cameras,
            Err(e) => {
                tracing::warn!(error = %e, "Camera list fetch failed, keeping current view");
                return;
            }
        };

        *inner.grid.write().await = camera_grid::allocate(&cameras);

        let new_ids = inner.lifecycle.observe(&cameras).await;
        *inner.cameras.write().await = cameras;

        // Cameras default to live without operator action.
        for camera_id in new_ids {
            if !inner.active.load(Ordering::SeqCst) {
                return;
            }
            inner.lifecycle.activate(&camera_id).await;
        }
    }

    async fn refresh_telemetry(inner: &Arc<DashboardInner<B>>) {
        match inner.backend.fetch_system_status().await {
            Ok(status) => {
                *inner.telemetry.write().await = status;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telemetry fetch failed, keeping current values");
            }
        }
    }

    // ========================================
    // Read-only snapshots for rendering
    // ========================================

    pub async fn cameras(&self) -> Vec<Camera> {
        self.inner.cameras.read().await.clone()
    }

    pub async fn grid(&self) -> GridSlots {
        self.inner.grid.read().await.clone()
    }

    pub async fn feed(&self) -> Vec<Detection> {
        self.inner.reconciler.feed_snapshot().await
    }

    pub async fn stats(&self) -> DetectionStats {
        self.inner.reconciler.stats_snapshot().await
    }

    pub async fn telemetry(&self) -> SystemStatus {
        self.inner.telemetry.read().await.clone()
    }

    pub async fn camera_states(&self) -> Vec<CameraRuntimeView> {
        self.inner.lifecycle.snapshot().await
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }
}

impl<B: Backend> PushHandler for DashboardInner<B> {
    async fn on_detection(&self, detection: Detection) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }

        tracing::debug!(
            detection_id = %detection.id,
            camera_id = %detection.camera_id,
            plate = %detection.plate,
            outcome = %detection.status,
            "Push detection received"
        );

        self.lifecycle
            .apply_detection(&detection.camera_id, &detection.status)
            .await;
        self.reconciler.apply_push(detection).await;
    }
}
