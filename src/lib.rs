//! PlateGuard Console Library
//!
//! Client-side monitoring core for a vehicle-plate access-control
//! installation.
//!
//! ## Architecture (7 Components)
//!
//! 1. StatusClassifier - outcome -> presentation status mapping
//! 2. CameraLifecycle - per-camera stream state machine
//! 3. CameraGridAllocator - fixed 4-slot grid assignment
//! 4. DetectionFeedReconciler - push/pull feed consistency
//! 5. DashboardController - composition, timers, teardown
//! 6. PushChannel - WebSocket detection stream with backoff
//! 7. ApiClient - REST collaborator (monitoring + management)
//!
//! ## Design Principles
//!
//! - Rendering reads snapshots; only the core mutates state
//! - Every failure is contained at the component that produced it
//! - Control commands are explicit and idempotent, activation and
//!   deactivation symmetric

pub mod api_client;
pub mod camera_grid;
pub mod camera_lifecycle;
pub mod config;
pub mod dashboard;
pub mod detection_feed;
pub mod error;
pub mod models;
pub mod notifier;
pub mod push_channel;
pub mod status_classifier;

pub use error::{Error, Result};
